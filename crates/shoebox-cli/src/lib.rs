//! Shoebox batch uploader
//!
//! Walks a pending directory, offers every media file to the coordinator and moves
//! accounted-for files to a done directory.

pub mod batch;
pub mod pending;

pub use batch::{
    BatchConfig, BatchError, BatchEvent, BatchObserver, BatchReport, BatchRunner, FileOutcome,
    FileState, FileUploader,
};

/// Observer that reports batch progress through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl BatchObserver for TracingObserver {
    fn on_event(&self, event: &BatchEvent) {
        match event {
            BatchEvent::Started { index, total, name } => {
                tracing::info!(index, total, name = %name, "[{}/{}] upload: {}", index, total, name);
            }
            BatchEvent::NotMedia { name, content_type } => {
                tracing::info!(name = %name, content_type = %content_type, "Not a media file, skipping");
            }
            BatchEvent::CaptureTimeFallback { name, reason } => {
                tracing::warn!(name = %name, reason = %reason, "No capture time, using file modification time");
            }
            BatchEvent::AlreadyPresent { name, id } => {
                tracing::info!(name = %name, id = %id, "Upload already exists, skipping");
            }
            BatchEvent::Uploaded { name, id, size } => {
                tracing::info!(name = %name, id = %id, size, "Upload success");
            }
            BatchEvent::Finished(report) => {
                tracing::info!(
                    uploaded = report.uploaded,
                    already_present = report.already_present,
                    not_media = report.not_media,
                    "Batch complete"
                );
            }
        }
    }
}

/// Hash a password for `BCRYPT_PASS`.
pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
}

/// Initialize tracing for CLI binaries. `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
