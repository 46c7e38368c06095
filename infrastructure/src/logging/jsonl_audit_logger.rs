//! JSONL file sink for audit records.
//!
//! Each [`AuditRecord`] becomes one JSON line carrying its payload fields
//! plus `type` and `timestamp`. The file is opened in append mode so
//! restarts extend the same trail.

use mplp_application::ports::audit_logger::{AuditLogger, AuditRecord};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Audit logger that appends one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every record
/// and on `Drop`.
pub struct JsonlAuditLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlAuditLogger {
    /// Open (or create) the audit log at `path`, creating parent
    /// directories as needed. Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!("Could not create audit log directory {}: {}", parent.display(), e);
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open audit log {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn to_line(record: AuditRecord) -> Option<String> {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let line = match record.payload {
            Value::Object(mut map) => {
                map.insert("type".to_string(), Value::String(record.event_type.to_string()));
                map.insert("timestamp".to_string(), Value::String(timestamp));
                Value::Object(map)
            }
            other => serde_json::json!({
                "type": record.event_type,
                "timestamp": timestamp,
                "data": other,
            }),
        };
        serde_json::to_string(&line).ok()
    }
}

impl AuditLogger for JsonlAuditLogger {
    fn log(&self, record: AuditRecord) {
        let Some(line) = Self::to_line(record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
                warn!("Failed to write audit record to {}: {}", self.path.display(), e);
            }
        }
    }
}

impl Drop for JsonlAuditLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read_lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_writes_one_object_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit").join("mplp.audit.jsonl");
        let logger = JsonlAuditLogger::new(&path).unwrap();

        logger.log(AuditRecord::access(true, "alice", "c-1", "read"));
        logger.log(AuditRecord::compliance_check("c-1", "compliance", false, &["missing approval".into()]));
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "access_granted");
        assert_eq!(lines[0]["user_id"], "alice");
        assert!(lines[0]["timestamp"].as_str().unwrap().ends_with('Z'));
        assert_eq!(lines[1]["type"], "compliance_check");
        assert_eq!(lines[1]["violations"][0], "missing approval");
    }

    #[test]
    fn test_non_object_payload_goes_under_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let logger = JsonlAuditLogger::new(&path).unwrap();

        logger.log(AuditRecord::new("note", json!("plain text")));
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines[0]["type"], "note");
        assert_eq!(lines[0]["data"], "plain text");
    }

    #[test]
    fn test_reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let logger = JsonlAuditLogger::new(&path).unwrap();
        logger.log(AuditRecord::security_event("c-1", "first"));
        drop(logger);

        let logger = JsonlAuditLogger::new(&path).unwrap();
        logger.log(AuditRecord::security_event("c-1", "second"));
        assert_eq!(logger.path(), path.as_path());
        drop(logger);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["description"], "second");
    }
}
