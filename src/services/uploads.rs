use std::path::PathBuf;

use async_trait::async_trait;

/// Phase one of the two-phase media flow: take bytes, return a public URL.
/// Saving the content record that references the URL is the separate second
/// phase, so each can fail and be reported on its own.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("file is empty")]
    Empty,
    #[error("invalid file name")]
    InvalidName,
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait UploadStore: Send + Sync {
    async fn store(&self, filename: &str, bytes: &[u8]) -> Result<String, UploadError>;
}

pub struct DiskUploadStore {
    root: PathBuf,
    public_base: String,
}

impl DiskUploadStore {
    pub fn new(root: impl Into<PathBuf>, public_base: String) -> Self {
        Self {
            root: root.into(),
            public_base,
        }
    }
}

#[async_trait]
impl UploadStore for DiskUploadStore {
    async fn store(&self, filename: &str, bytes: &[u8]) -> Result<String, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        let safe = sanitize_filename(filename).ok_or(UploadError::InvalidName)?;

        // Unique key per upload; re-uploading the same name never clobbers.
        let key = format!("{}-{safe}", uuid::Uuid::new_v4());

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&key), bytes).await?;

        tracing::info!(file = %key, size = bytes.len(), "stored upload");
        Ok(format!("{}/media/{key}", self.public_base))
    }
}

fn sanitize_filename(name: &str) -> Option<String> {
    let safe: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();

    if safe.is_empty() || safe.chars().all(|c| c == '.') {
        None
    } else {
        Some(safe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (DiskUploadStore, PathBuf) {
        let root = std::env::temp_dir().join(format!("frontdesk-uploads-{}", uuid::Uuid::new_v4()));
        (
            DiskUploadStore::new(root.clone(), "http://localhost:3000".to_string()),
            root,
        )
    }

    #[tokio::test]
    async fn test_store_writes_file_and_returns_url() {
        let (store, root) = temp_store();
        let url = store.store("team-photo.png", b"png-bytes").await.unwrap();

        assert!(url.starts_with("http://localhost:3000/media/"));
        assert!(url.ends_with("-team-photo.png"));

        let key = url.rsplit('/').next().unwrap();
        let on_disk = tokio::fs::read(root.join(key)).await.unwrap();
        assert_eq!(on_disk, b"png-bytes");
    }

    #[tokio::test]
    async fn test_store_rejects_empty_file() {
        let (store, _root) = temp_store();
        let result = store.store("x.png", b"").await;
        assert!(matches!(result, Err(UploadError::Empty)));
    }

    #[tokio::test]
    async fn test_store_strips_path_components() {
        let (store, _root) = temp_store();
        let url = store.store("../../etc/passwd", b"data").await.unwrap();
        // slashes are dropped, the remainder is a plain file name
        assert!(url.ends_with("-....etcpasswd"));
    }

    #[tokio::test]
    async fn test_store_rejects_name_with_no_usable_characters() {
        let (store, _root) = temp_store();
        let result = store.store("///", b"data").await;
        assert!(matches!(result, Err(UploadError::InvalidName)));
    }
}
