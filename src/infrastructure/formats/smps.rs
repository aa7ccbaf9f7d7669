// SMPS writer
// Core file in fixed MPS followed by a single implicit period and an empty
// stochastic section, all in one stream

use super::mps::{model_name, write_fields, write_mps, MpsStyle};
use crate::domain::{models::NativeModel, solver_service::Result};
use std::io::Write;

pub fn write_smps<W: Write>(model: &NativeModel, out: &mut W) -> Result<()> {
    let name = model_name(model);

    writeln!(out, "* CORE")?;
    write_mps(model, MpsStyle::Fixed, out)?;

    writeln!(out, "* TIME")?;
    writeln!(out, "TIME          {}", name)?;
    writeln!(out, "PERIODS       IMPLICIT")?;
    let first_row = model
        .goals()
        .first()
        .map(|g| g.name.as_str())
        .or_else(|| model.constraints().first().map(|c| c.name.as_str()));
    if let (Some(column), Some(row)) = (model.decisions().first(), first_row) {
        write_fields(out, MpsStyle::Fixed, "", &[column.name.as_str(), row, "PERIOD1"])?;
    }
    writeln!(out, "ENDATA")?;

    writeln!(out, "* STOCH")?;
    writeln!(out, "STOCH         {}", name)?;
    writeln!(out, "ENDATA")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decision, LinearExpr, NativeType, Relation};

    #[test]
    fn test_smps_sections() {
        let mut model = NativeModel::new().with_name("stage");
        model
            .add_decision(Decision::new("x", NativeType::NonnegativeReal))
            .unwrap();
        model
            .add_constraint("c_0", LinearExpr::column(0), Relation::LessOrEqual, LinearExpr::constant(3.0))
            .unwrap();

        let mut buffer = Vec::new();
        write_smps(&model, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.starts_with("* CORE\nNAME          stage\n"));
        assert!(text.contains("TIME          stage\nPERIODS       IMPLICIT\n    x         c_0       PERIOD1\n"));
        assert!(text.ends_with("STOCH         stage\nENDATA\n"));
        assert_eq!(text.matches("ENDATA").count(), 3);
    }
}
