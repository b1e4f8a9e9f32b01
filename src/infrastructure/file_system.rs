use crate::core::interfaces::FileSystemService;
use crate::utils::{KilnError, Result};
use std::path::Path;
use tokio::fs;

pub struct TokioFileSystemService;

#[async_trait::async_trait]
impl FileSystemService for TokioFileSystemService {
    async fn read_file(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).await.map_err(KilnError::Io)
    }

    async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).await.map_err(KilnError::Io)
    }

    async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.create_directory(parent).await?;
        }
        fs::write(path, content).await.map_err(KilnError::Io)
    }

    async fn write_bytes(&self, path: &Path, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.create_directory(parent).await?;
        }
        fs::write(path, content).await.map_err(KilnError::Io)
    }

    async fn create_directory(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).await.map_err(KilnError::Io)
    }

    async fn remove_directory(&self, path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_dir_all(path).await.map_err(KilnError::Io)?;
        }
        Ok(())
    }

    async fn file_size(&self, path: &Path) -> Result<u64> {
        let meta = fs::metadata(path).await.map_err(KilnError::Io)?;
        Ok(meta.len())
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_text_round_trip() {
        let fs_service = TokioFileSystemService;
        let temp_dir = tempdir().unwrap();
        let file = temp_dir.path().join("nested/out.js");

        fs_service.write_file(&file, "console.log(1);").await.unwrap();
        assert_eq!(
            fs_service.read_file(&file).await.unwrap(),
            "console.log(1);"
        );
        assert_eq!(fs_service.file_size(&file).await.unwrap(), 15);
    }

    #[tokio::test]
    async fn test_remove_directory_is_idempotent() {
        let fs_service = TokioFileSystemService;
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path().join("gone");

        fs_service.create_directory(&dir).await.unwrap();
        fs_service.remove_directory(&dir).await.unwrap();
        assert!(!dir.exists());
        // Removing again must not fail
        fs_service.remove_directory(&dir).await.unwrap();
    }
}
