//! Shoebox Processing Library
//!
//! Client-side inspection of files before they are offered to the coordinator:
//! - content identifiers (SHA-256 over the whole file)
//! - MIME sniffing over a fixed-size prefix, and the media kind derived from it
//! - capture-time extraction from image metadata

pub mod capture_time;
pub mod classifier;
pub mod digest;

pub use capture_time::{capture_time_from_file, read_capture_time, ExtractionError};
pub use classifier::{classify, read_prefix, sniff_content_type, Classification, SNIFF_LEN};
pub use digest::{digest_bytes, digest_reader, ContentId};
