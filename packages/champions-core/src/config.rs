//! Store and server configuration.

use std::path::PathBuf;

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// JSON file holding every table
    pub data_file: PathBuf,
    /// Maximum retry attempts for transient I/O errors
    pub persistence_max_retries: u32,
    /// Delay between retry attempts in milliseconds
    pub persistence_retry_delay_ms: u64,
    /// Request body read timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Page size used when `limit` is absent or unusable
    pub default_page_limit: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("./db.json"),
            persistence_max_retries: 3,      // Default retry attempts
            persistence_retry_delay_ms: 100, // 100ms delay between retries
            request_timeout_ms: 5000,        // 5 seconds default
            default_page_limit: 10,
        }
    }
}
