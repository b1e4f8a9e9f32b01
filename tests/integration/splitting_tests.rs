use kiln::core::config::TargetOverrides;
use kiln::core::interfaces::BuildService;
use kiln::core::models::*;
use kiln::core::services::KilnBuildService;
use kiln::infrastructure::{
    LightningStylesheetProcessor, OxcScriptProcessor, ShimMap, ShimResolver,
    TokioFileSystemService,
};
use kiln::utils::{BuildReporter, ReportStyle};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

fn build_service() -> KilnBuildService {
    KilnBuildService::new(
        Arc::new(TokioFileSystemService),
        Arc::new(OxcScriptProcessor::new()),
        Arc::new(LightningStylesheetProcessor::new(false)),
        Arc::new(ShimResolver::new(ShimMap::browser_defaults())),
        BuildReporter::new(ReportStyle::Expanded),
    )
}

fn write_source(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn config(root: &Path) -> BuildConfig {
    BuildConfig {
        root: root.to_path_buf(),
        outdir: root.join("dist"),
        mode: BuildMode::Development,
        ci: true,
        monitoring: false,
        max_asset_size: 4_194_304,
    }
}

#[tokio::test]
async fn test_shared_ui_module_lands_in_commons_chunk() {
    let temp = tempdir().unwrap();
    write_source(
        temp.path(),
        "src/a.js",
        "import { shared } from './lib/shared.js';\nconsole.log(\"entry-a\", shared);\n",
    );
    write_source(
        temp.path(),
        "src/b.js",
        "import { shared } from './lib/shared.js';\nconsole.log(\"entry-b\", shared);\n",
    );
    write_source(
        temp.path(),
        "src/lib/shared.js",
        "export const shared = \"shared-marker\";\n",
    );

    let target = BuildTarget {
        name: "ui".to_string(),
        entries: vec![
            EntryPoint::new("a", "src/a.js"),
            EntryPoint::new("b", "src/b.js"),
        ],
        depends_on: Vec::new(),
        overrides: TargetOverrides {
            rules: None,
            chunk_groups: vec![ChunkGroup {
                name: "ui-commons".to_string(),
                priority: 5,
                enforce: true,
                min_entries: 2,
                test: None,
                exclude_entries: Vec::new(),
            }],
        },
    };

    let cfg = config(temp.path());
    build_service().build(&[target], &cfg).await.unwrap();

    let commons =
        std::fs::read_to_string(cfg.outdir.join("ui-commons.bundle.js")).unwrap();
    assert!(commons.contains("shared-marker"));

    let entry_a = std::fs::read_to_string(cfg.outdir.join("a.bundle.js")).unwrap();
    assert!(entry_a.contains("entry-a"));
    assert!(!entry_a.contains("shared-marker"));
}

#[tokio::test]
async fn test_vendor_group_claims_backend_dependency_subtree() {
    let temp = tempdir().unwrap();
    write_source(
        temp.path(),
        "src/background/index.js",
        "import ipfs from 'ipfs';\nconsole.log(\"bg-ready\", ipfs);\n",
    );
    write_source(
        temp.path(),
        "node_modules/ipfs/index.js",
        "export default { name: \"ipfs-impl\" };\n",
    );

    let target = BuildTarget {
        name: "background".to_string(),
        entries: vec![EntryPoint::new("background-page", "src/background/index.js")],
        depends_on: Vec::new(),
        overrides: TargetOverrides {
            rules: None,
            chunk_groups: vec![ChunkGroup {
                name: "vendor".to_string(),
                priority: 10,
                enforce: true,
                min_entries: 1,
                test: Some(r"node_modules[/\\]ipfs".to_string()),
                exclude_entries: Vec::new(),
            }],
        },
    };

    let cfg = config(temp.path());
    build_service().build(&[target], &cfg).await.unwrap();

    let vendor = std::fs::read_to_string(cfg.outdir.join("vendor.bundle.js")).unwrap();
    assert!(vendor.contains("ipfs-impl"));

    let entry =
        std::fs::read_to_string(cfg.outdir.join("background-page.bundle.js")).unwrap();
    assert!(entry.contains("bg-ready"));
    assert!(!entry.contains("ipfs-impl"));
}
