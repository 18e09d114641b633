//! Schedule Source: the tabular feed of agent shifts and global settings.
//!
//! Records arrive as column name -> cell value maps, one per sheet row,
//! in sheet order. Header handling and authentication are the exporter's job.

use crate::error::{DeskError, DeskResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Settings sheet columns.
pub const COL_SETTING_KEY:   &str = "ClaveConfig";
pub const COL_SETTING_VALUE: &str = "ValorConfig1";

/// One sheet row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SheetRecord(BTreeMap<String, Value>);

impl SheetRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.0.insert(column.to_string(), value.into());
        self
    }

    /// Trimmed text rendering of a cell, the way a sheet export shows it.
    /// Missing columns and empty cells both read as "".
    pub fn cell(&self, column: &str) -> String {
        match self.0.get(column) {
            None | Some(Value::Null)   => String::new(),
            Some(Value::String(s))     => s.trim().to_string(),
            Some(Value::Bool(b))       => if *b { "TRUE".into() } else { "FALSE".into() },
            Some(Value::Number(n))     => n.to_string(),
            Some(other)                => other.to_string(),
        }
    }

    /// Whether the column exists with a non-null value.
    pub fn has(&self, column: &str) -> bool {
        matches!(self.0.get(column), Some(v) if !v.is_null())
    }
}

/// The contract every schedule feed must fulfill.
pub trait ScheduleSource {
    /// Agent schedule rows, in sheet order.
    fn agent_records(&self) -> DeskResult<Vec<SheetRecord>>;

    /// Global settings rows (`ClaveConfig` / `ValorConfig1`).
    fn settings_records(&self) -> DeskResult<Vec<SheetRecord>>;
}

/// Collapse settings rows into key -> value. Rows without a key or value are
/// ignored; a later key overwrites an earlier one.
pub fn settings_map(records: &[SheetRecord]) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for record in records {
        let key = record.cell(COL_SETTING_KEY);
        if key.is_empty() || !record.has(COL_SETTING_VALUE) {
            continue;
        }
        out.insert(key, record.cell(COL_SETTING_VALUE));
    }
    out
}

/// Reads JSON exports of the two sheets: each file is an array of row objects.
#[derive(Debug, Clone)]
pub struct ExportedSheetSource {
    agents_path:   PathBuf,
    settings_path: PathBuf,
}

impl ExportedSheetSource {
    pub fn new(agents_path: impl Into<PathBuf>, settings_path: impl Into<PathBuf>) -> Self {
        Self {
            agents_path:   agents_path.into(),
            settings_path: settings_path.into(),
        }
    }

    fn read(path: &Path) -> DeskResult<Vec<SheetRecord>> {
        let content = std::fs::read_to_string(path).map_err(|e| DeskError::io(path, e))?;
        let records: Vec<SheetRecord> = serde_json::from_str(&content)?;
        log::debug!("Read {} rows from {}", records.len(), path.display());
        Ok(records)
    }
}

impl ScheduleSource for ExportedSheetSource {
    fn agent_records(&self) -> DeskResult<Vec<SheetRecord>> {
        Self::read(&self.agents_path)
    }

    fn settings_records(&self) -> DeskResult<Vec<SheetRecord>> {
        Self::read(&self.settings_path)
    }
}

/// In-memory rows, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemorySheetSource {
    pub agents:   Vec<SheetRecord>,
    pub settings: Vec<SheetRecord>,
}

impl ScheduleSource for MemorySheetSource {
    fn agent_records(&self) -> DeskResult<Vec<SheetRecord>> {
        Ok(self.agents.clone())
    }

    fn settings_records(&self) -> DeskResult<Vec<SheetRecord>> {
        Ok(self.settings.clone())
    }
}
