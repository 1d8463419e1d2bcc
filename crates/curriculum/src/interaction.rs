//! Interaction log: one JSON line per handled request.
//!
//! Records are appended to `<log_dir>/app.log`. When the next record would
//! push the file past `max_bytes`, the file is rotated to `app.log.1`, older
//! backups shift up, and anything beyond `backups` is discarded.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{CurriculumError, Result};

/// Record type tag for client interactions.
pub const USER_INTERACTION: &str = "user_interaction";

/// Interaction log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionLogConfig {
    pub log_dir: PathBuf,
    pub file_name: String,
    /// Rotate once the active file would exceed this size.
    pub max_bytes: u64,
    /// Rotated files to keep.
    pub backups: usize,
}

impl Default for InteractionLogConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            file_name: "app.log".to_string(),
            max_bytes: 10 * 1024 * 1024,
            backups: 5,
        }
    }
}

impl InteractionLogConfig {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, max_bytes: u64, backups: usize) -> Self {
        self.max_bytes = max_bytes;
        self.backups = backups;
        self
    }

    /// Path of the active log file.
    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(&self.file_name)
    }
}

/// A single request/response pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub record_type: String,
    pub user_query: String,
    pub response: Value,
    pub success: bool,
    pub endpoint: String,
    pub user_id: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    pub user_agent: String,
}

impl InteractionRecord {
    pub fn new(endpoint: impl Into<String>, user_query: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            record_type: USER_INTERACTION.to_string(),
            user_query: user_query.into(),
            response: Value::Null,
            success: false,
            endpoint: endpoint.into(),
            user_id: "anonymous".to_string(),
            ip_address: None,
            user_agent: "unknown".to_string(),
        }
    }

    pub fn with_response(mut self, response: Value, success: bool) -> Self {
        self.response = response;
        self.success = success;
        self
    }

    pub fn with_client(
        mut self,
        user_id: Option<String>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        if let Some(user_id) = user_id.filter(|u| !u.trim().is_empty()) {
            self.user_id = user_id;
        }
        self.ip_address = ip_address;
        if let Some(agent) = user_agent {
            self.user_agent = agent;
        }
        self
    }
}

/// Acknowledgement for a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggedInteraction {
    pub log_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Basic facts about the active log file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogStats {
    pub log_file_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size_mb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    pub logs_directory: String,
}

/// Appends interaction records to a rotating JSON-lines file.
#[derive(Debug)]
pub struct InteractionLogger {
    config: InteractionLogConfig,
    write_lock: Mutex<()>,
}

impl InteractionLogger {
    pub fn new(config: InteractionLogConfig) -> Self {
        Self {
            config,
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &InteractionLogConfig {
        &self.config
    }

    /// Persist a record and emit it on the `interaction` tracing target.
    pub fn record(&self, record: &InteractionRecord) -> Result<LoggedInteraction> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        if record.success {
            info!(target: "interaction", endpoint = %record.endpoint, user = %record.user_id, "{}", line.trim_end());
        } else {
            warn!(target: "interaction", endpoint = %record.endpoint, user = %record.user_id, "{}", line.trim_end());
        }

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        fs::create_dir_all(&self.config.log_dir).map_err(|e| {
            CurriculumError::Persistence(format!(
                "Failed to create log directory '{}': {}",
                self.config.log_dir.display(),
                e
            ))
        })?;

        let path = self.config.log_path();
        self.rotate_if_needed(&path, line.len() as u64)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                CurriculumError::Persistence(format!(
                    "Failed to open log file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        file.write_all(line.as_bytes()).map_err(|e| {
            CurriculumError::Persistence(format!(
                "Failed to write log file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let digest = format!("{:x}", Sha256::digest(line.as_bytes()));
        Ok(LoggedInteraction {
            log_id: format!("{}-{}", record.timestamp.timestamp(), &digest[..12]),
            timestamp: record.timestamp,
        })
    }

    fn rotate_if_needed(&self, path: &Path, incoming: u64) -> Result<()> {
        let size = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(_) => return Ok(()),
        };
        if size == 0 || size + incoming <= self.config.max_bytes {
            return Ok(());
        }

        let rotate_err = |e: std::io::Error| {
            CurriculumError::Persistence(format!(
                "Failed to rotate log file '{}': {}",
                path.display(),
                e
            ))
        };

        if self.config.backups == 0 {
            return fs::remove_file(path).map_err(rotate_err);
        }

        let oldest = backup_path(path, self.config.backups);
        if oldest.exists() {
            fs::remove_file(&oldest).map_err(rotate_err)?;
        }
        for index in (1..self.config.backups).rev() {
            let from = backup_path(path, index);
            if from.exists() {
                fs::rename(&from, backup_path(path, index + 1)).map_err(rotate_err)?;
            }
        }
        fs::rename(path, backup_path(path, 1)).map_err(rotate_err)
    }

    /// Size and modification time of the active log file.
    pub fn stats(&self) -> LogStats {
        let path = self.config.log_path();
        let logs_directory = self.config.log_dir.display().to_string();

        match fs::metadata(&path) {
            Ok(meta) => {
                let mb = meta.len() as f64 / (1024.0 * 1024.0);
                LogStats {
                    log_file_exists: true,
                    file_size_mb: Some((mb * 100.0).round() / 100.0),
                    last_modified: meta.modified().ok().map(DateTime::<Utc>::from),
                    logs_directory,
                }
            }
            Err(_) => LogStats {
                log_file_exists: false,
                file_size_mb: None,
                last_modified: None,
                logs_directory,
            },
        }
    }
}

/// `app.log` -> `app.log.<index>`
fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}", index));
    path.with_file_name(name)
}
