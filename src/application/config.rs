/// Upload limits and retention. Read-only after startup; per-request state
/// never touches it.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Maximum number of files accepted in one batch.
    pub max_files: usize,
    /// Maximum size of a single file, in bytes. Oversized files are skipped
    /// with a collected error, they do not fail the batch.
    pub max_file_size_bytes: usize,
    /// Days until a stored run's expiry timestamp.
    pub retention_days: i64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_files: 20,
            max_file_size_bytes: 10 * 1024 * 1024,
            retention_days: 7,
        }
    }
}
