//! Warning system for the convert command.
//!
//! The pipeline never rejects input. Shapes it cannot handle are passed
//! through and recorded here so the operator can fix them by hand.

use serde::Serialize;

/// Warning types that can occur during conversion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConvertWarning {
    /// `CREATE TABLE "name"` where the name is not plain word characters;
    /// no DROP guard was emitted for it
    UnconvertedTableName { name: String },
    /// A CREATE TABLE whose closing line was never a lone `);`, so no
    /// ENGINE/CHARSET clause was appended. `line` is 1-based in the input
    /// dump.
    MissingEpilogue { table: Option<String>, line: usize },
}

impl std::fmt::Display for ConvertWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvertWarning::UnconvertedTableName { name } => {
                write!(
                    f,
                    "Table name \"{}\" is not a plain identifier - no DROP TABLE guard emitted",
                    name
                )
            }
            ConvertWarning::MissingEpilogue { table, line } => {
                write!(f, "CREATE TABLE")?;
                if let Some(t) = table {
                    write!(f, " `{}`", t)?;
                }
                write!(
                    f,
                    " at input line {} has no standalone `);` - ENGINE clause not appended",
                    line
                )
            }
        }
    }
}

/// Collects warnings during conversion
#[derive(Debug)]
pub struct WarningCollector {
    warnings: Vec<ConvertWarning>,
    max_warnings: usize,
    truncated: bool,
}

impl Default for WarningCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl WarningCollector {
    pub fn new() -> Self {
        Self {
            warnings: Vec::new(),
            max_warnings: 100,
            truncated: false,
        }
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            warnings: Vec::new(),
            max_warnings: limit,
            truncated: false,
        }
    }

    /// Add a warning, dropping duplicates and anything past the limit
    pub fn add(&mut self, warning: ConvertWarning) {
        if self.warnings.contains(&warning) {
            return;
        }
        if self.warnings.len() < self.max_warnings {
            self.warnings.push(warning);
        } else {
            self.truncated = true;
        }
    }

    pub fn warnings(&self) -> &[ConvertWarning] {
        &self.warnings
    }

    pub fn count(&self) -> usize {
        self.warnings.len()
    }

    /// True once a distinct warning was dropped at the limit
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}
