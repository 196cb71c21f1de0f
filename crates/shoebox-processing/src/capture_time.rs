//! Capture-time extraction from image metadata
//!
//! Extraction is best effort. Every failure is reported as an [`ExtractionError`] and the
//! caller chooses the fallback timestamp.

use chrono::{DateTime, Utc};
use std::io::{self, BufRead, Seek};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no readable EXIF metadata: {0}")]
    NoMetadata(String),

    #[error("no capture timestamp in EXIF metadata")]
    MissingTimestamp,

    #[error("invalid capture timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("capture time extraction is not enabled in this build")]
    Unsupported,
}

/// Read the capture time from an image container (JPEG, TIFF, HEIF, PNG, WebP).
///
/// `DateTimeOriginal` is preferred over `DateTime`. Values carry no zone and are taken
/// as UTC.
#[cfg(feature = "image")]
pub fn read_capture_time<R: BufRead + Seek>(
    reader: &mut R,
) -> Result<DateTime<Utc>, ExtractionError> {
    use ::exif::{In, Reader, Tag, Value};

    let exif = Reader::new()
        .read_from_container(reader)
        .map_err(|e| match e {
            ::exif::Error::Io(io_err) => ExtractionError::Io(io_err),
            other => ExtractionError::NoMetadata(other.to_string()),
        })?;

    let field = [Tag::DateTimeOriginal, Tag::DateTime]
        .into_iter()
        .find_map(|tag| exif.get_field(tag, In::PRIMARY))
        .ok_or(ExtractionError::MissingTimestamp)?;

    let raw = match field.value {
        Value::Ascii(ref values) => values.first().ok_or(ExtractionError::MissingTimestamp)?,
        _ => {
            return Err(ExtractionError::InvalidTimestamp(format!(
                "{} is not an ASCII value",
                field.tag
            )))
        }
    };

    let parsed = ::exif::DateTime::from_ascii(raw)
        .map_err(|e| ExtractionError::InvalidTimestamp(e.to_string()))?;

    chrono::NaiveDate::from_ymd_opt(
        i32::from(parsed.year),
        u32::from(parsed.month),
        u32::from(parsed.day),
    )
    .and_then(|date| {
        date.and_hms_nano_opt(
            u32::from(parsed.hour),
            u32::from(parsed.minute),
            u32::from(parsed.second),
            parsed.nanosecond.unwrap_or(0),
        )
    })
    .map(|naive| naive.and_utc())
    .ok_or_else(|| {
        ExtractionError::InvalidTimestamp(String::from_utf8_lossy(raw).into_owned())
    })
}

#[cfg(not(feature = "image"))]
pub fn read_capture_time<R: BufRead + Seek>(
    _reader: &mut R,
) -> Result<DateTime<Utc>, ExtractionError> {
    Err(ExtractionError::Unsupported)
}

/// Read the capture time of a file on disk without blocking the runtime.
pub async fn capture_time_from_file(path: &Path) -> Result<DateTime<Utc>, ExtractionError> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let file = std::fs::File::open(&path)?;
        let mut reader = io::BufReader::new(file);
        read_capture_time(&mut reader)
    })
    .await
    .map_err(|e| ExtractionError::Io(io::Error::other(e)))?
}
