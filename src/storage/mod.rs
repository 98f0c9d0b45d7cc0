use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Uploaded file has no extension: {0}")]
    MissingExtension(String),

    #[error("Failed to write file {name}: {source}")]
    Write {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to delete file {name}")]
    Delete {
        name: String,
        #[source]
        source: Option<io::Error>,
    },
}

/// Where uploaded product photos live
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Persist `bytes` under a generated `<unix-seconds>.<ext>` name and return that name.
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<String, StorageError>;

    async fn delete(&self, name: &str) -> Result<(), StorageError>;
}

/// Files on the local disk under a single directory
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl FileStorage for LocalStorage {
    async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let extension = extension_of(original_name)
            .ok_or_else(|| StorageError::MissingExtension(original_name.to_string()))?;

        fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StorageError::Write {
                name: self.root.display().to_string(),
                source,
            })?;

        // Two uploads in the same second must not overwrite each other
        let mut stamp = chrono::Utc::now().timestamp();
        loop {
            let name = format!("{}.{}", stamp, extension);
            let path = self.root.join(&name);

            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(mut file) => {
                    let written = async {
                        file.write_all(bytes).await?;
                        file.flush().await
                    }
                    .await;

                    if let Err(source) = written {
                        let _ = fs::remove_file(&path).await;
                        return Err(StorageError::Write { name, source });
                    }

                    info!("Stored upload {} ({} bytes)", name, bytes.len());
                    return Ok(name);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => stamp += 1,
                Err(source) => return Err(StorageError::Write { name, source }),
            }
        }
    }

    async fn delete(&self, name: &str) -> Result<(), StorageError> {
        if !is_plain_file_name(name) {
            return Err(StorageError::Delete {
                name: name.to_string(),
                source: None,
            });
        }

        fs::remove_file(self.root.join(name))
            .await
            .map_err(|source| StorageError::Delete {
                name: name.to_string(),
                source: Some(source),
            })?;

        info!("Deleted upload {}", name);
        Ok(())
    }
}

/// Lowercased extension after the last dot, if any
fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
}
