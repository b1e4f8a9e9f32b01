use crate::core::models::*;
use crate::utils::{BuildConstants, Result};
use async_trait::async_trait;
use std::path::Path;

/// File system operations interface
#[async_trait]
pub trait FileSystemService: Send + Sync {
    async fn read_file(&self, path: &Path) -> Result<String>;
    async fn read_bytes(&self, path: &Path) -> Result<Vec<u8>>;
    async fn write_file(&self, path: &Path, content: &str) -> Result<()>;
    async fn write_bytes(&self, path: &Path, content: &[u8]) -> Result<()>;
    async fn create_directory(&self, path: &Path) -> Result<()>;
    async fn remove_directory(&self, path: &Path) -> Result<()>;
    async fn file_size(&self, path: &Path) -> Result<u64>;
    fn file_exists(&self, path: &Path) -> bool;
}

/// JavaScript downleveling interface. Two chains: one for application code,
/// one for server-authored dependencies that need sanitization first and
/// must stay in module form.
#[async_trait]
pub trait ScriptProcessor: Send + Sync {
    async fn downlevel(
        &self,
        module: &ModuleInfo,
        constants: &BuildConstants,
        bindings: &DefaultBindings,
    ) -> Result<String>;
    async fn downlevel_dependency(
        &self,
        module: &ModuleInfo,
        constants: &BuildConstants,
    ) -> Result<String>;
    fn extract_dependencies(&self, content: &str) -> Vec<String>;
}

/// Stylesheet processing interface
#[async_trait]
pub trait StylesheetProcessor: Send + Sync {
    async fn process_css(&self, content: &str, path: &Path) -> Result<String>;
}

/// Build service interface
#[async_trait]
pub trait BuildService: Send + Sync {
    async fn build(&self, targets: &[BuildTarget], config: &BuildConfig) -> Result<BuildResult>;
}
