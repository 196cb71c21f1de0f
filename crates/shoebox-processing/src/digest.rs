//! Content identifiers
//!
//! A content identifier is the lowercase hex SHA-256 of a file's full byte content. It
//! depends only on the bytes, never on the name or timestamps.

use sha2::{Digest, Sha256};
use std::fmt;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Hex-encoded SHA-256 digest of a file's content
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentId(String);

impl ContentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digest an in-memory buffer.
pub fn digest_bytes(data: &[u8]) -> ContentId {
    ContentId(hex::encode(Sha256::digest(data)))
}

/// Digest a stream by consuming it to the end.
///
/// The reader is left at EOF; callers that read it again must seek back to the start.
pub async fn digest_reader<R>(reader: &mut R) -> io::Result<ContentId>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(ContentId(hex::encode(hasher.finalize())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::SeekFrom;
    use std::path::Path;
    use tokio::io::AsyncSeekExt;

    async fn digest_path(path: &Path) -> io::Result<ContentId> {
        let mut file = tokio::fs::File::open(path).await?;
        digest_reader(&mut file).await
    }

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_digest_known_values() {
        assert_eq!(digest_bytes(b"").as_str(), EMPTY_SHA256);
        assert_eq!(
            digest_bytes(b"test").as_str(),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[tokio::test]
    async fn test_reader_matches_bytes_across_buffer_boundaries() {
        let data: Vec<u8> = (0..(READ_BUFFER_SIZE * 2 + 17)).map(|i| (i % 251) as u8).collect();
        let mut reader = data.as_slice();
        let streamed = digest_reader(&mut reader).await.unwrap();
        assert_eq!(streamed, digest_bytes(&data));
    }

    #[tokio::test]
    async fn test_identical_content_same_id_regardless_of_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let a = dir.path().join("a.jpg");
        let b = dir.path().join("renamed-copy.jpg");
        std::fs::write(&a, b"same bytes").unwrap();
        std::fs::write(&b, b"same bytes").unwrap();

        assert_eq!(digest_path(&a).await.unwrap(), digest_path(&b).await.unwrap());
    }

    #[tokio::test]
    async fn test_digest_consumes_reader() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("f.bin");
        std::fs::write(&path, b"payload").unwrap();

        let mut file = tokio::fs::File::open(&path).await.unwrap();
        digest_reader(&mut file).await.unwrap();
        let mut rest = Vec::new();
        file.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());

        file.seek(SeekFrom::Start(0)).await.unwrap();
        file.read_to_end(&mut rest).await.unwrap();
        assert_eq!(rest, b"payload");
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let result = digest_path(Path::new("/definitely/not/here")).await;
        assert!(result.is_err());
    }
}
