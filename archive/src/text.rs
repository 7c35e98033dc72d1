//! Operator-facing texts.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Lifecycle texts sent to the state notifier and used in structural errors.
///
/// Missing keys fall back to the English defaults, so a YAML override only
/// needs the entries it changes:
///
/// ```
/// use table_backup_archive::TextResource;
///
/// let texts = TextResource::from_yaml_str("no_data: \"Leere Sicherung.\"").unwrap();
/// assert_eq!(texts.no_data, "Leere Sicherung.");
/// assert_eq!(texts.saving_changes, "Saving changes...");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextResource {
    pub restoring_data: String,
    pub saving_changes: String,
    pub backing_up_data: String,
    /// Message of the error raised for an archive without a data entry.
    pub no_data: String,
    pub deleting_schema: String,
    pub creating_schema: String,
}

impl Default for TextResource {
    fn default() -> Self {
        Self {
            restoring_data: "Restoring data...".to_string(),
            saving_changes: "Saving changes...".to_string(),
            backing_up_data: "Backing up data...".to_string(),
            no_data: "Database backup file has no data.".to_string(),
            deleting_schema: "Deleting table schema...".to_string(),
            creating_schema: "Creating table schema...".to_string(),
        }
    }
}

impl TextResource {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads texts from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}
