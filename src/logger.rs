use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::Utc;
use serde_json::{Value, json};
use tracing::warn;

use crate::types::DeviceId;

pub enum CommandLogMode {
    /// Only issued temperature commands and their outcome.
    Commands,
    /// Commands plus every hub query.
    Full,
}

/// Best-effort NDJSON log of outbound hub traffic. Write failures are
/// warned and swallowed; the scheduler must keep ticking either way.
pub(crate) struct CommandLogger {
    mode: CommandLogMode,
    file: File,
}

impl CommandLogger {
    pub fn new(mode: CommandLogMode, path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { mode, file })
    }

    pub fn log_request(&mut self, method: &str, path: &str) {
        if matches!(self.mode, CommandLogMode::Commands) {
            return;
        }
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "req",
            "method": method,
            "path": path,
        });
        self.write_line(&entry);
    }

    pub fn log_command(&mut self, device: &DeviceId, temperature: i32, ok: bool) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "cmd",
            "device": device,
            "temperature": temperature,
            "ok": ok,
        });
        self.write_line(&entry);
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write log entry: {e}");
        }
    }
}
