//! Target dialect profile for the MySQL side of a conversion.
//!
//! Every size, precision, and table option the rewrite pipeline emits comes
//! from here. The defaults reproduce a stock utf8mb4/InnoDB MySQL 5.7+ target;
//! a YAML file can override any subset of fields.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// MySQL target parameters used by the rewrite pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetProfile {
    /// Database named in the header's import instructions
    pub database: String,
    /// User named in the printed import command
    pub import_user: String,
    /// VARCHAR length for indexed TEXT columns (191 fits utf8mb4 in a 767-byte index)
    pub key_varchar_length: u32,
    /// VARCHAR length for a `phone` TEXT column
    pub phone_varchar_length: u32,
    /// VARCHAR length for an `email` TEXT column
    pub email_varchar_length: u32,
    /// Fractional-second precision for DATETIME columns
    pub datetime_precision: u32,
    /// DECIMAL precision
    pub decimal_precision: u32,
    /// DECIMAL scale
    pub decimal_scale: u32,
    /// Storage engine appended to each CREATE TABLE
    pub engine: String,
    /// Default character set, also used for `SET NAMES`
    pub charset: String,
    /// Default collation appended to each CREATE TABLE
    pub collation: String,
}

impl Default for TargetProfile {
    fn default() -> Self {
        Self {
            database: "labs".to_string(),
            import_user: "root".to_string(),
            key_varchar_length: 191,
            phone_varchar_length: 20,
            email_varchar_length: 191,
            datetime_precision: 3,
            decimal_precision: 10,
            decimal_scale: 2,
            engine: "InnoDB".to_string(),
            charset: "utf8mb4".to_string(),
            collation: "utf8mb4_unicode_ci".to_string(),
        }
    }
}

impl TargetProfile {
    /// Load a profile from a YAML file; missing fields keep their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a profile from YAML text
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let profile: TargetProfile = serde_yaml_ng::from_str(content)?;
        Ok(profile)
    }

    /// Serialize the profile back to YAML
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Closing line for a CREATE TABLE statement
    pub fn table_epilogue(&self) -> String {
        format!(
            ") ENGINE={} DEFAULT CHARSET={} COLLATE={};",
            self.engine, self.charset, self.collation
        )
    }

    /// Shell command that imports a converted dump
    pub fn import_command(&self, output: &str) -> String {
        format!(
            "mysql -u {} -p {} < \"{}\"",
            self.import_user, self.database, output
        )
    }
}
