use crate::core::interfaces::FileSystemService;
use crate::utils::{KilnError, Logger, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Subdirectory of the output root that receives copied binary assets.
pub const ASSET_DIR: &str = "assets";

/// Copies binary assets (images, fonts) to stable, content-independent
/// output names so downstream packaging can reference fixed paths. Enforces
/// the per-asset size ceiling the packaging host imposes.
pub struct AssetEmitter {
    fs_service: Arc<dyn FileSystemService>,
    max_asset_size: u64,
}

impl AssetEmitter {
    pub fn new(fs_service: Arc<dyn FileSystemService>, max_asset_size: u64) -> Self {
        Self {
            fs_service,
            max_asset_size,
        }
    }

    /// Output name for an asset: `assets/<name>.<ext>`, no content hash.
    pub fn output_name(source: &Path) -> PathBuf {
        let file_name = source
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "asset".into());
        PathBuf::from(ASSET_DIR).join(file_name)
    }

    /// Copy `source` under the asset directory and return the public path
    /// its importers should reference. Fails with `AssetTooLarge` before any
    /// bytes are written when the source exceeds the ceiling.
    pub async fn emit(&self, source: &Path, outdir: &Path) -> Result<String> {
        let size = self.fs_service.file_size(source).await?;
        if size > self.max_asset_size {
            return Err(KilnError::AssetTooLarge {
                path: source.to_path_buf(),
                size,
                limit: self.max_asset_size,
            });
        }

        let relative = Self::output_name(source);
        Logger::emitting_asset(&relative.to_string_lossy(), size);

        let content = self.fs_service.read_bytes(source).await?;
        self.fs_service
            .write_bytes(&outdir.join(&relative), &content)
            .await?;

        Ok(relative.to_string_lossy().replace('\\', "/"))
    }

    /// JS stub emitted into the importing bundle, binding the asset's stable
    /// public path under a name derived from the file name so concatenated
    /// stubs never collide.
    pub fn stub_module(public_path: &str) -> String {
        let ident: String = public_path
            .rsplit('/')
            .next()
            .unwrap_or("asset")
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!(
            "var __kiln_asset_{} = \"/{}\";\n",
            ident, public_path
        )
    }
}
