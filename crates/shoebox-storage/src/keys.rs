//! Shared key derivation for storage backends.
//!
//! Key format: `{prefix}/{timestamp}-{id}-{name}` where the timestamp is the UTC mtime
//! as `YYYY-MM-DD-HH_MM_SS`, followed by `.d` (tenths of a second) when non-zero. With an
//! empty prefix the key is just `{timestamp}-{id}-{name}`.
//!
//! The key, not the content id alone, is the dedup unit: the same bytes with a different
//! mtime or name land under a different key.

use chrono::{DateTime, Timelike, Utc};
use shoebox_core::FileMetadata;

/// Derive the object key for a file.
pub fn derive_object_key(prefix: &str, meta: &FileMetadata) -> String {
    let object_name = format!(
        "{}-{}-{}",
        format_key_timestamp(&meta.mtime),
        meta.id,
        meta.name
    );

    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        object_name
    } else {
        format!("{}/{}", prefix, object_name)
    }
}

fn format_key_timestamp(mtime: &DateTime<Utc>) -> String {
    let mut ts = mtime.format("%Y-%m-%d-%H_%M_%S").to_string();
    // Leap seconds report nanoseconds above 1e9
    let tenths = (mtime.nanosecond() % 1_000_000_000) / 100_000_000;
    if tenths != 0 {
        ts.push_str(&format!(".{}", tenths));
    }
    ts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn metadata(mtime: DateTime<Utc>) -> FileMetadata {
        FileMetadata {
            id: "deadbeef".to_string(),
            name: "a.jpg".to_string(),
            mtime,
            size: 1,
            content_type: "image/jpeg".to_string(),
            test_upload: false,
        }
    }

    #[test]
    fn test_key_without_prefix() {
        let meta = metadata(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(
            derive_object_key("", &meta),
            "2020-01-01-00_00_00-deadbeef-a.jpg"
        );
    }

    #[test]
    fn test_key_with_prefix_trims_slashes() {
        let meta = metadata(Utc.with_ymd_and_hms(2021, 12, 31, 23, 59, 58).unwrap());
        assert_eq!(
            derive_object_key("/photos/", &meta),
            "photos/2021-12-31-23_59_58-deadbeef-a.jpg"
        );
    }

    #[test]
    fn test_key_includes_nonzero_tenths_only() {
        let base = Utc.with_ymd_and_hms(2020, 6, 15, 8, 30, 5).unwrap();

        let with_tenths = metadata(base + chrono::Duration::milliseconds(730));
        assert_eq!(
            derive_object_key("p", &with_tenths),
            "p/2020-06-15-08_30_05.7-deadbeef-a.jpg"
        );

        let under_a_tenth = metadata(base + chrono::Duration::milliseconds(40));
        assert_eq!(
            derive_object_key("p", &under_a_tenth),
            "p/2020-06-15-08_30_05-deadbeef-a.jpg"
        );
    }

    #[test]
    fn test_same_content_different_name_gets_different_key() {
        let mtime = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let a = metadata(mtime);
        let mut b = metadata(mtime);
        b.name = "b.jpg".to_string();
        assert_ne!(derive_object_key("", &a), derive_object_key("", &b));
    }
}
