// Infrastructure: textual model formats
// Every format can be written; only free MPS is read back

pub mod mps;
pub mod oml;
pub mod smps;

use crate::domain::{
    models::NativeModel,
    solver_service::{Result, SolverError},
    value_objects::FileFormat,
};
use std::io::{BufRead, Write};

pub use mps::MpsStyle;

pub fn write_model<W: Write>(model: &NativeModel, format: FileFormat, out: &mut W) -> Result<()> {
    match format {
        FileFormat::Mps => mps::write_mps(model, MpsStyle::Fixed, out),
        FileFormat::FreeMps => mps::write_mps(model, MpsStyle::Free, out),
        FileFormat::Smps => smps::write_smps(model, out),
        FileFormat::Oml => oml::write_oml(model, out),
    }
}

pub fn read_model<R: BufRead>(format: FileFormat, reader: R) -> Result<NativeModel> {
    match format {
        FileFormat::FreeMps => mps::read_free_mps(reader),
        other => Err(SolverError::UnsupportedFormat(other)),
    }
}

/// Names are written as bare tokens, so they must not be empty or contain whitespace
pub(crate) fn check_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(SolverError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_free_mps_is_readable() {
        for format in [FileFormat::Mps, FileFormat::Smps, FileFormat::Oml] {
            let result = read_model(format, "".as_bytes());
            assert!(matches!(result, Err(SolverError::UnsupportedFormat(f)) if f == format));
        }
        assert!(read_model(FileFormat::FreeMps, "NAME empty\nENDATA\n".as_bytes()).is_ok());
    }

    #[test]
    fn test_check_name() {
        assert!(check_name("v__1").is_ok());
        assert!(check_name("").is_err());
        assert!(check_name("two words").is_err());
    }
}
