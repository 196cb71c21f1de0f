//! Content sniffing
//!
//! Classification looks only at the first [`SNIFF_LEN`] bytes of a file. The result is a
//! MIME type; only image, audio and video types are considered media.

use shoebox_core::MediaKind;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Number of leading bytes inspected
pub const SNIFF_LEN: usize = 512;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const OCTET_STREAM: &str = "application/octet-stream";

/// Sniffed type of a file plus its media kind, if any
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub content_type: &'static str,
    pub kind: Option<MediaKind>,
}

/// Classify a content prefix.
pub fn classify(prefix: &[u8]) -> Classification {
    let content_type = sniff_content_type(prefix);
    Classification {
        content_type,
        kind: MediaKind::from_content_type(content_type),
    }
}

/// Read up to [`SNIFF_LEN`] bytes from the start of a reader.
///
/// Short files yield a short (possibly empty) prefix.
pub async fn read_prefix<R>(reader: &mut R) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut prefix = vec![0u8; SNIFF_LEN];
    let mut filled = 0;
    while filled < SNIFF_LEN {
        let n = reader.read(&mut prefix[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    prefix.truncate(filled);
    Ok(prefix)
}

/// Determine the MIME type of content from its leading bytes.
pub fn sniff_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];

    // JPEG: FF D8 FF
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return "image/jpeg";
    }

    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        return "image/png";
    }

    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return "image/gif";
    }

    // RIFF containers: WebP, WAV, AVI
    if data.len() >= 12 && data.starts_with(b"RIFF") {
        match &data[8..12] {
            b"WEBP" => return "image/webp",
            b"WAVE" => return "audio/wave",
            b"AVI " => return "video/avi",
            _ => {}
        }
    }

    if data.starts_with(b"BM") {
        return "image/bmp";
    }

    if data.starts_with(&[0x00, 0x00, 0x01, 0x00]) || data.starts_with(&[0x00, 0x00, 0x02, 0x00]) {
        return "image/x-icon";
    }

    if data.starts_with(b"II*\x00") || data.starts_with(b"MM\x00*") {
        return "image/tiff";
    }

    // ISO base media: size (4 bytes) then "ftyp" and the major brand
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        return match &data[8..12] {
            b"qt  " => "video/quicktime",
            b"M4A " | b"M4B " => "audio/mp4",
            b"heic" | b"heix" | b"mif1" => "image/heic",
            b"avif" => "image/avif",
            _ => "video/mp4",
        };
    }

    // EBML header (WebM / Matroska)
    if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return "video/webm";
    }

    if data.starts_with(b"ID3") || is_mp3_frame_sync(data) {
        return "audio/mpeg";
    }

    if data.starts_with(b"OggS\x00") {
        return "audio/ogg";
    }

    if data.len() >= 12 && data.starts_with(b"FORM") && &data[8..12] == b"AIFF" {
        return "audio/aiff";
    }

    if data.starts_with(b"fLaC") {
        return "audio/flac";
    }

    if data.starts_with(b"MThd\x00\x00\x00\x06") {
        return "audio/midi";
    }

    if data.starts_with(b"%PDF-") {
        return "application/pdf";
    }

    if data.starts_with(b"PK\x03\x04") {
        return "application/zip";
    }

    if data.starts_with(&[0x1F, 0x8B, 0x08]) {
        return "application/x-gzip";
    }

    if data.iter().any(|&b| is_binary_byte(b)) {
        OCTET_STREAM
    } else {
        TEXT_PLAIN
    }
}

/// MPEG audio frame header: 11 set sync bits and a non-reserved layer.
fn is_mp3_frame_sync(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0xFF && data[1] & 0xE0 == 0xE0 && data[1] & 0x06 != 0
}

/// Control bytes that never appear in text.
fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_padding(prefix: &[u8]) -> Vec<u8> {
        let mut data = prefix.to_vec();
        data.resize(64, 0);
        data
    }

    #[test]
    fn test_image_signatures() {
        assert_eq!(sniff_content_type(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(sniff_content_type(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"), "image/png");
        assert_eq!(sniff_content_type(b"GIF89a\x01\x00"), "image/gif");
        assert_eq!(sniff_content_type(&with_padding(b"RIFF\0\0\0\0WEBPVP8 ")), "image/webp");
        assert_eq!(sniff_content_type(b"II*\x00\x08\x00\x00\x00"), "image/tiff");
        assert_eq!(sniff_content_type(&with_padding(b"\0\0\0\x18ftypheic")), "image/heic");
    }

    #[test]
    fn test_audio_signatures() {
        assert_eq!(sniff_content_type(b"ID3\x04\x00"), "audio/mpeg");
        assert_eq!(sniff_content_type(&[0xFF, 0xFB, 0x90, 0x64]), "audio/mpeg");
        assert_eq!(sniff_content_type(b"fLaC\0\0\0\x22"), "audio/flac");
        assert_eq!(sniff_content_type(&with_padding(b"RIFF\0\0\0\0WAVEfmt ")), "audio/wave");
        assert_eq!(sniff_content_type(b"OggS\x00\x02"), "audio/ogg");
        assert_eq!(sniff_content_type(&with_padding(b"FORM\0\0\0\0AIFF")), "audio/aiff");
    }

    #[test]
    fn test_video_signatures() {
        assert_eq!(sniff_content_type(&with_padding(b"\0\0\0\x20ftypisom")), "video/mp4");
        assert_eq!(sniff_content_type(&with_padding(b"\0\0\0\x14ftypqt  ")), "video/quicktime");
        assert_eq!(sniff_content_type(&[0x1A, 0x45, 0xDF, 0xA3, 0x9F]), "video/webm");
        assert_eq!(sniff_content_type(&with_padding(b"RIFF\0\0\0\0AVI LIST")), "video/avi");
    }

    #[test]
    fn test_non_media() {
        assert_eq!(sniff_content_type(b"%PDF-1.7\n"), "application/pdf");
        assert_eq!(sniff_content_type(b"PK\x03\x04\x14\x00"), "application/zip");
        assert_eq!(sniff_content_type(b"hello, world\n"), TEXT_PLAIN);
        assert_eq!(sniff_content_type(&[0x00, 0x01, 0x02, 0x03, 0x04]), OCTET_STREAM);
    }

    #[test]
    fn test_empty_prefix_is_text() {
        let c = classify(&[]);
        assert_eq!(c.content_type, TEXT_PLAIN);
        assert_eq!(c.kind, None);
    }

    #[test]
    fn test_only_prefix_is_inspected() {
        // A binary byte past the sniff window must not change the verdict
        let mut data = vec![b'a'; SNIFF_LEN];
        data.push(0x00);
        assert_eq!(sniff_content_type(&data), TEXT_PLAIN);
    }

    #[test]
    fn test_classify_kind() {
        assert_eq!(classify(&[0xFF, 0xD8, 0xFF]).kind, Some(MediaKind::Image));
        assert_eq!(classify(b"ID3").kind, Some(MediaKind::Audio));
        assert_eq!(classify(b"%PDF-1.4").kind, None);
    }

    #[tokio::test]
    async fn test_read_prefix_caps_at_sniff_len() {
        let data = vec![7u8; SNIFF_LEN * 3];
        let mut reader = data.as_slice();
        let prefix = read_prefix(&mut reader).await.unwrap();
        assert_eq!(prefix.len(), SNIFF_LEN);

        let mut short: &[u8] = b"abc";
        assert_eq!(read_prefix(&mut short).await.unwrap(), b"abc");
    }
}
