// Model persistence
// Native model files plus the solver-data blob that carries the variable
// registry and the naming counters across sessions

use super::milp_solver::MilpSolver;
use crate::domain::{
    models::NativeModel,
    solver_service::{Result, SolverError},
    value_objects::{Domain, FileFormat},
    variable::{NativeVariable, Variable},
};
use crate::infrastructure::formats;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{info, warn};

/// Version written into every solver-data blob
pub const SOLVER_DATA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableRecord {
    pub name: String,
    pub domain: Domain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant_value: Option<f64>,
}

/// Serialized adapter state, complementing a native model file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverData {
    pub version: u32,
    pub constraint_index: u64,
    pub variable_index: u64,
    pub variables: Vec<VariableRecord>,
}

impl SolverData {
    /// Parse a blob, rejecting versions other than [`SOLVER_DATA_VERSION`]
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_reader(reader)?;
        // Missing versions read as 0, out-of-range ones saturate
        let found = value
            .get("version")
            .and_then(serde_json::Value::as_u64)
            .map_or(0, |v| u32::try_from(v).unwrap_or(u32::MAX));
        if found != SOLVER_DATA_VERSION {
            return Err(SolverError::IncompatibleSolverData {
                found,
                expected: SOLVER_DATA_VERSION,
            });
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// Outcome of rebinding registered names against a reloaded model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadReport {
    /// Names bound to a decision of the reloaded model
    pub rebound: Vec<String>,
    /// Names with no decision in the reloaded model, removed from the registry
    pub dropped: Vec<String>,
}

impl ReloadReport {
    pub fn is_lossless(&self) -> bool {
        self.dropped.is_empty()
    }
}

fn read_model_file(path: &Path) -> Result<NativeModel> {
    let file = File::open(path)?;
    formats::read_model(FileFormat::FreeMps, BufReader::new(file))
}

impl MilpSolver {
    pub fn save_model<W: Write>(&self, format: FileFormat, out: &mut W) -> Result<()> {
        formats::write_model(&self.model, format, out)
    }

    /// Save the model in the format configured by the settings
    pub fn save_model_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save_model_to_file_as(self.settings.model_format, path)
    }

    pub fn save_model_to_file_as(&self, format: FileFormat, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut out = BufWriter::new(File::create(path)?);
        self.save_model(format, &mut out)?;
        out.flush()?;
        info!(path = %path.display(), %format, "Saved model");
        Ok(())
    }

    /// Replace the native model with a free MPS file
    ///
    /// Registered variables are rebound by name; names the file does not
    /// declare are dropped and listed in the report. Handles obtained before
    /// the reload become stale.
    pub fn load_model(&mut self, path: impl AsRef<Path>) -> Result<ReloadReport> {
        let path = path.as_ref();
        let loaded = read_model_file(path)?;
        let records = self.records();
        self.install_model(loaded);
        let report = self.rebind(records);
        info!(
            path = %path.display(),
            rebound = report.rebound.len(),
            dropped = report.dropped.len(),
            "Loaded model"
        );
        Ok(report)
    }

    /// Snapshot of the registry and counters
    pub fn solver_data(&self) -> SolverData {
        SolverData {
            version: SOLVER_DATA_VERSION,
            constraint_index: self.constraint_index,
            variable_index: self.variable_index,
            variables: self.records(),
        }
    }

    pub fn save_solver_data<W: Write>(&self, out: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, &self.solver_data())?;
        writeln!(out)?;
        Ok(())
    }

    pub fn save_solver_data_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut out = BufWriter::new(File::create(path)?);
        self.save_solver_data(&mut out)?;
        out.flush()?;
        info!(path = %path.display(), variables = self.variables.len(), "Saved solver data");
        Ok(())
    }

    /// Restore the registry and counters from a blob against the current model
    pub fn load_solver_data<R: Read>(&mut self, reader: R) -> Result<ReloadReport> {
        let data = SolverData::from_reader(reader)?;
        Ok(self.apply_solver_data(data))
    }

    /// Load a free MPS model together with the solver data saved alongside it
    pub fn load_model_from_files(
        &mut self,
        model_path: impl AsRef<Path>,
        solver_data_path: impl AsRef<Path>,
    ) -> Result<ReloadReport> {
        let model_path = model_path.as_ref();
        let data = SolverData::from_reader(BufReader::new(File::open(solver_data_path)?))?;
        let loaded = read_model_file(model_path)?;
        self.install_model(loaded);
        let report = self.apply_solver_data(data);
        info!(
            path = %model_path.display(),
            rebound = report.rebound.len(),
            dropped = report.dropped.len(),
            "Loaded model with solver data"
        );
        Ok(report)
    }

    fn records(&self) -> Vec<VariableRecord> {
        let mut records: Vec<VariableRecord> = self
            .variables
            .values()
            .map(|v| VariableRecord {
                name: v.name().to_string(),
                domain: v.domain(),
                constant_value: v.constant_value(),
            })
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }

    fn install_model(&mut self, loaded: NativeModel) {
        self.model.replace_with(loaded);
        self.constraint_index = self
            .constraint_index
            .max(self.model.constraints().len() as u64);
    }

    fn apply_solver_data(&mut self, data: SolverData) -> ReloadReport {
        // Counters only move forward so generated names stay unique
        self.variable_index = self.variable_index.max(data.variable_index);
        self.constraint_index = self
            .constraint_index
            .max(data.constraint_index)
            .max(self.model.constraints().len() as u64);
        self.rebind(data.variables)
    }

    fn rebind(&mut self, records: Vec<VariableRecord>) -> ReloadReport {
        let mut report = ReloadReport::default();
        let mut variables = HashMap::with_capacity(records.len());

        for record in records {
            match self.model.decision_id(&record.name) {
                Some(decision) => {
                    let variable =
                        Variable::leaf(self.instance, record.name.clone(), record.domain, decision)
                            .with_constant_value(record.constant_value);
                    report.rebound.push(record.name.clone());
                    variables.insert(record.name, variable);
                }
                None => report.dropped.push(record.name),
            }
        }

        report.rebound.sort();
        report.dropped.sort();
        if !report.dropped.is_empty() {
            warn!(dropped = ?report.dropped, "Dropped variables missing from the loaded model");
        }
        self.variables = variables;
        report
    }
}
