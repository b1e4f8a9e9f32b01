use crate::core::interfaces::FileSystemService;
use crate::core::models::ArtifactRef;
use crate::utils::{KilnError, Logger, Result};
use std::path::Path;
use std::sync::Arc;

/// Identifier the loader source references to reach the embedded payload.
pub const EMBED_BINDING: &str = "__kiln_embedded_payload";

/// Loads a dependency target's finished bundle as an opaque text blob for
/// verbatim embedding. This is a controlled exception to module resolution:
/// the payload is never re-processed, only quoted. The target graph
/// guarantees the dependency compiled first; finding the file missing here
/// means the ordering is broken, which is fatal.
pub struct ArtifactEmbedder {
    fs_service: Arc<dyn FileSystemService>,
}

impl ArtifactEmbedder {
    pub fn new(fs_service: Arc<dyn FileSystemService>) -> Self {
        Self { fs_service }
    }

    pub async fn load(&self, embed: &ArtifactRef, outdir: &Path) -> Result<String> {
        let artifact_path = outdir.join(format!("{}.bundle.js", embed.bundle));

        if !self.fs_service.file_exists(&artifact_path) {
            return Err(KilnError::MissingArtifact {
                target: embed.target.clone(),
                bundle: embed.bundle.clone(),
            });
        }

        Logger::embedding_artifact(&embed.target, &embed.bundle);
        self.fs_service.read_file(&artifact_path).await
    }

    /// Render the payload as a JavaScript string-literal binding prepended
    /// to the loader bundle.
    pub fn binding(payload: &str) -> String {
        // serde_json string escaping is valid JS string escaping
        let literal =
            serde_json::to_string(payload).unwrap_or_else(|_| "\"\"".to_string());
        format!("const {} = {};\n", EMBED_BINDING, literal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::file_system::TokioFileSystemService;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_artifact_is_fatal() {
        let temp_dir = tempdir().unwrap();
        let embedder = ArtifactEmbedder::new(Arc::new(TokioFileSystemService));
        let embed = ArtifactRef {
            target: "content-scripts".to_string(),
            bundle: "proxy-payload".to_string(),
        };

        let err = embedder.load(&embed, temp_dir.path()).await.unwrap_err();
        assert!(matches!(err, KilnError::MissingArtifact { .. }));
    }

    #[tokio::test]
    async fn test_loads_finished_bundle_verbatim() {
        let temp_dir = tempdir().unwrap();
        let bundle_path = temp_dir.path().join("proxy-payload.bundle.js");
        std::fs::write(&bundle_path, "console.log(\"payload\");\n").unwrap();

        let embedder = ArtifactEmbedder::new(Arc::new(TokioFileSystemService));
        let embed = ArtifactRef {
            target: "content-scripts".to_string(),
            bundle: "proxy-payload".to_string(),
        };

        let payload = embedder.load(&embed, temp_dir.path()).await.unwrap();
        assert_eq!(payload, "console.log(\"payload\");\n");
    }

    #[test]
    fn test_binding_is_a_quoted_literal() {
        let binding = ArtifactEmbedder::binding("line one\nline \"two\"");
        assert!(binding.starts_with("const __kiln_embedded_payload = "));
        assert!(binding.contains("\\n"));
        assert!(binding.contains("\\\"two\\\""));
    }
}
