use std::io::ErrorKind;
use std::path::PathBuf;

use crate::Result;
use crate::types::ScheduleConfig;

/// Source of the raw schedule configuration. The settings UI is the sole
/// writer; the scheduler only ever reads, once per tick, to compare the
/// `updated` marker against the one its compiled table was built from.
pub trait ConfigStore {
    /// `Ok(None)` means no configuration has been written yet, which is
    /// treated as an empty schedule rather than an error.
    fn get(&self) -> Result<Option<ScheduleConfig>>;
}

/// Configuration persisted as a single JSON file, re-read on every call so
/// external writes are picked up without any notification channel.
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigStore for JsonConfigStore {
    fn get(&self) -> Result<Option<ScheduleConfig>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
