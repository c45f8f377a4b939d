//! Hotkey persistence.
//!
//! Each hotkey is stored as one delimited line
//! `<Name><SEP><Combo><SEP><Action><SEP><True|False>`, wrapped in a JSON
//! document that also carries the hotkey's action settings:
//!
//! ```json
//! {
//!   "separator": ",",
//!   "hotkeys": [
//!     { "line": "Mute,Ctrl+Shift+M,Session.ToggleMute,True", "settings": [] }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::combination::KeyCombination;
use crate::actions::ActionSetting;
use crate::config::DEFAULT_SEPARATOR;
use crate::error::{HotkeyError, Result};

/// Persisted form of one hotkey.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HotkeyRecord {
    pub name: String,
    pub combo: KeyCombination,
    pub action: Option<String>,
    pub registered: bool,
    pub settings: Vec<ActionSetting>,
}

impl HotkeyRecord {
    pub fn new(
        name: impl Into<String>,
        combo: KeyCombination,
        action: Option<String>,
        registered: bool,
    ) -> Self {
        HotkeyRecord {
            name: name.into(),
            combo,
            action,
            registered,
            settings: Vec::new(),
        }
    }

    /// Render the delimited line. A separator inside the name is replaced by
    /// a space so the line always splits back into the same fields.
    /// The action id is written as is; an id containing the separator does
    /// not survive the round trip and is reported.
    pub fn to_line(&self, separator: char) -> String {
        let name = self.name.replace(separator, " ");
        if let Some(action) = self.action.as_deref().filter(|a| a.contains(separator)) {
            warn!(
                hotkey = %self.name,
                action = action,
                separator = %separator,
                "Action id contains the record separator and will not load back"
            );
        }
        format!(
            "{name}{sep}{combo}{sep}{action}{sep}{registered}",
            sep = separator,
            combo = self.combo,
            action = self.action.as_deref().unwrap_or_default(),
            registered = if self.registered { "True" } else { "False" },
        )
    }

    /// Parse a delimited line. Fields are trimmed; missing trailing fields
    /// default (combo invalid, no action, not registered). Blank lines yield
    /// `None`.
    pub fn parse_line(line: &str, separator: char) -> Option<Self> {
        if line.trim().is_empty() {
            return None;
        }
        let mut fields = line.split(separator).map(str::trim);
        let name = fields.next().unwrap_or_default().to_string();
        let combo = fields.next().map(KeyCombination::parse).unwrap_or_default();
        let action = fields
            .next()
            .filter(|a| !a.is_empty())
            .map(str::to_string);
        let registered = fields
            .next()
            .is_some_and(|flag| flag.eq_ignore_ascii_case("true"));
        Some(HotkeyRecord::new(name, combo, action, registered))
    }
}

/// One entry of the stored document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct StoredHotkey {
    line: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    settings: Vec<ActionSetting>,
}

/// The whole stored document.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredDocument {
    #[serde(default = "default_separator")]
    separator: char,
    #[serde(default)]
    hotkeys: Vec<StoredHotkey>,
}

fn default_separator() -> char {
    DEFAULT_SEPARATOR
}

impl StoredDocument {
    fn from_records(records: &[HotkeyRecord], separator: char) -> Self {
        StoredDocument {
            separator,
            hotkeys: records
                .iter()
                .map(|record| StoredHotkey {
                    line: record.to_line(separator),
                    settings: record.settings.clone(),
                })
                .collect(),
        }
    }

    fn into_records(self) -> Vec<HotkeyRecord> {
        let separator = self.separator;
        self.hotkeys
            .into_iter()
            .filter_map(|stored| {
                let mut record = HotkeyRecord::parse_line(&stored.line, separator)?;
                record.settings = stored.settings;
                Some(record)
            })
            .collect()
    }
}

/// Storage collaborator of the hotkey collection.
pub trait HotkeyStore {
    /// Saved records, or `None` when nothing has been saved yet.
    fn load(&mut self) -> Result<Option<Vec<HotkeyRecord>>>;

    fn save(&mut self, records: &[HotkeyRecord]) -> Result<()>;
}

/// Pretty JSON document on disk.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    separator: char,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, separator: char) -> Self {
        JsonFileStore {
            path: path.into(),
            separator,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HotkeyStore for JsonFileStore {
    fn load(&mut self) -> Result<Option<Vec<HotkeyRecord>>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No saved hotkeys");
            return Ok(None);
        }
        let content =
            fs::read_to_string(&self.path).map_err(|e| HotkeyError::io(&self.path, e))?;
        let document: StoredDocument = serde_json::from_str(&content)?;
        let records = document.into_records();
        info!(path = %self.path.display(), count = records.len(), "Loaded hotkeys");
        Ok(Some(records))
    }

    fn save(&mut self, records: &[HotkeyRecord]) -> Result<()> {
        // Create parent directories if needed
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| HotkeyError::io(parent, e))?;
        }
        let document = StoredDocument::from_records(records, self.separator);
        let content = serde_json::to_string_pretty(&document)?;
        fs::write(&self.path, content).map_err(|e| HotkeyError::io(&self.path, e))?;
        debug!(path = %self.path.display(), count = records.len(), "Saved hotkeys");
        Ok(())
    }
}

/// In-memory store. Goes through the same line format as the file store.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    separator: char,
    document: Option<StoredDocument>,
    saves: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

impl MemoryStore {
    pub fn new(separator: char) -> Self {
        MemoryStore {
            separator,
            document: None,
            saves: 0,
        }
    }

    /// Store that already holds `records`, as if saved earlier.
    pub fn with_records(records: &[HotkeyRecord], separator: char) -> Self {
        MemoryStore {
            separator,
            document: Some(StoredDocument::from_records(records, separator)),
            saves: 0,
        }
    }

    /// Number of completed saves.
    pub fn saves(&self) -> usize {
        self.saves
    }

    /// Stored lines, in order.
    pub fn lines(&self) -> Vec<String> {
        self.document
            .iter()
            .flat_map(|doc| doc.hotkeys.iter().map(|h| h.line.clone()))
            .collect()
    }
}

impl HotkeyStore for MemoryStore {
    fn load(&mut self) -> Result<Option<Vec<HotkeyRecord>>> {
        Ok(self.document.clone().map(StoredDocument::into_records))
    }

    fn save(&mut self, records: &[HotkeyRecord]) -> Result<()> {
        self.document = Some(StoredDocument::from_records(records, self.separator));
        self.saves += 1;
        Ok(())
    }
}
