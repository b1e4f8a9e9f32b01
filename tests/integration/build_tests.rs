use kiln::core::config::TargetOverrides;
use kiln::core::interfaces::BuildService;
use kiln::core::models::*;
use kiln::core::services::KilnBuildService;
use kiln::infrastructure::{
    LightningStylesheetProcessor, OxcScriptProcessor, ShimMap, ShimResolver,
    TokioFileSystemService,
};
use kiln::utils::{BuildReporter, KilnError, ReportStyle};
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

fn simple_target(name: &str, entries: Vec<EntryPoint>) -> BuildTarget {
    BuildTarget {
        name: name.to_string(),
        entries,
        depends_on: Vec::new(),
        overrides: TargetOverrides::default(),
    }
}

#[tokio::test]
async fn test_loader_embeds_final_dependency_bundle_despite_declaration_order() {
    let temp = tempdir().unwrap();
    write_source(temp.path(), "src/page.js", "console.log(\"payload-marker\");\n");
    write_source(
        temp.path(),
        "src/loader.js",
        "console.log(__kiln_embedded_payload);\n",
    );

    // The loader target is declared first; dependency order must still put
    // the payload target ahead of it
    let loader = BuildTarget {
        name: "proxy-content-script".to_string(),
        entries: vec![
            EntryPoint::new("proxy-loader", "src/loader.js")
                .with_embed("content-scripts", "proxy-payload"),
        ],
        depends_on: vec!["content-scripts".to_string()],
        overrides: TargetOverrides::default(),
    };
    let payload = simple_target(
        "content-scripts",
        vec![EntryPoint::new("proxy-payload", "src/page.js")],
    );

    let cfg = config(temp.path());
    let result = build_service().build(&[loader, payload], &cfg).await.unwrap();

    let payload_artifact = result.artifact("content-scripts").unwrap();
    let payload_bundle = payload_artifact.bundle("proxy-payload").unwrap();
    assert!(payload_bundle.content.contains("payload-marker"));
    assert!(cfg.outdir.join("proxy-payload.bundle.js").exists());

    let loader_bundle =
        std::fs::read_to_string(cfg.outdir.join("proxy-loader.bundle.js")).unwrap();
    assert!(loader_bundle.contains("payload-marker"));
}

#[tokio::test]
async fn test_shared_dependency_is_declared_before_every_user() {
    let temp = tempdir().unwrap();
    // The entry reaches `a` directly and again through `b`; `b` uses `a`'s
    // binding, so `a` must be emitted ahead of `b` in the bundle
    write_source(
        temp.path(),
        "src/index.js",
        "import { a } from './a.js';\nimport { b } from './b.js';\nconsole.log(a, b);\n",
    );
    write_source(
        temp.path(),
        "src/a.js",
        "export const a = \"marker_a_decl\";\n",
    );
    write_source(
        temp.path(),
        "src/b.js",
        "import { a } from './a.js';\nexport const b = a + \"_used_in_b\";\n",
    );

    let target = simple_target("ui", vec![EntryPoint::new("main", "src/index.js")]);
    let cfg = config(temp.path());
    build_service().build(&[target], &cfg).await.unwrap();

    let bundle = std::fs::read_to_string(cfg.outdir.join("main.bundle.js")).unwrap();
    let decl = bundle.find("marker_a_decl").unwrap();
    let usage = bundle.find("_used_in_b").unwrap();
    assert!(decl < usage, "declaration must precede its user");
}

#[tokio::test]
async fn test_two_default_exports_keep_distinct_bindings() {
    let temp = tempdir().unwrap();
    write_source(
        temp.path(),
        "src/index.js",
        "import x from './x.js';\nimport y from './y.js';\nconsole.log(x.name, y.name);\n",
    );
    write_source(temp.path(), "src/x.js", "export default { name: \"module-x\" };\n");
    write_source(temp.path(), "src/y.js", "export default { name: \"module-y\" };\n");

    let target = simple_target("ui", vec![EntryPoint::new("main", "src/index.js")]);
    let cfg = config(temp.path());
    build_service().build(&[target], &cfg).await.unwrap();

    let bundle = std::fs::read_to_string(cfg.outdir.join("main.bundle.js")).unwrap();
    assert!(bundle.contains("module-x"));
    assert!(bundle.contains("module-y"));
}

#[tokio::test]
async fn test_matching_chains_compose_in_order() {
    let temp = tempdir().unwrap();
    // First chain strips the interpreter directive, second flattens the
    // export; if the second saw the original source instead of the first's
    // output, the directive would survive into the bundle
    write_source(
        temp.path(),
        "src/tool.js",
        "#!/usr/bin/env node\nexport const v = \"composed-marker\";\nconsole.log(v);\n",
    );

    let target = BuildTarget {
        name: "ui".to_string(),
        entries: vec![EntryPoint::new("tool", "src/tool.js")],
        depends_on: Vec::new(),
        overrides: TargetOverrides {
            rules: Some(vec![
                PipelineRule {
                    name: "sanitize".to_string(),
                    test: r"\.js$".to_string(),
                    include: None,
                    exclude: None,
                    chain: TransformChain::DependencyScript,
                },
                PipelineRule {
                    name: "flatten".to_string(),
                    test: r"\.js$".to_string(),
                    include: None,
                    exclude: None,
                    chain: TransformChain::Script,
                },
            ]),
            chunk_groups: Vec::new(),
        },
    };

    let cfg = config(temp.path());
    build_service().build(&[target], &cfg).await.unwrap();

    let bundle = std::fs::read_to_string(cfg.outdir.join("tool.bundle.js")).unwrap();
    assert!(bundle.contains("composed-marker"));
    assert!(!bundle.contains("#!"));
}

#[tokio::test]
async fn test_assets_are_copied_to_stable_names() {
    let temp = tempdir().unwrap();
    write_source(
        temp.path(),
        "src/popup/index.js",
        "import './logo.png';\nimport './logo.svg';\nconsole.log(\"ui-ready\");\n",
    );
    write_source(temp.path(), "src/popup/logo.png", "png-bytes");
    write_source(temp.path(), "src/popup/logo.svg", "<svg></svg>");

    let target = simple_target(
        "ui",
        vec![EntryPoint::new("browser-action", "src/popup/index.js")],
    );
    let cfg = config(temp.path());
    build_service().build(&[target], &cfg).await.unwrap();

    assert!(cfg.outdir.join("assets/logo.png").exists());
    assert!(cfg.outdir.join("assets/logo.svg").exists());

    let bundle =
        std::fs::read_to_string(cfg.outdir.join("browser-action.bundle.js")).unwrap();
    assert!(bundle.contains("/assets/logo.png"));
}

#[tokio::test]
async fn test_oversized_asset_aborts_without_output() {
    let temp = tempdir().unwrap();
    write_source(
        temp.path(),
        "src/popup/index.js",
        "import './huge.png';\nconsole.log(\"ui-ready\");\n",
    );
    write_source(temp.path(), "src/popup/huge.png", &"x".repeat(64));

    let target = simple_target(
        "ui",
        vec![EntryPoint::new("browser-action", "src/popup/index.js")],
    );
    let mut cfg = config(temp.path());
    cfg.max_asset_size = 16;

    let err = build_service().build(&[target], &cfg).await.unwrap_err();
    assert!(matches!(err, KilnError::AssetTooLarge { size: 64, .. }));
    // A failed build leaves no output behind
    assert!(!cfg.outdir.exists());
}

#[tokio::test]
async fn test_stylesheets_extracted_per_target() {
    let temp = tempdir().unwrap();
    write_source(
        temp.path(),
        "src/options/index.js",
        "import './style.css';\nconsole.log(\"options-ready\");\n",
    );
    write_source(temp.path(), "src/options/style.css", "body { color: red; }\n");

    let target = simple_target(
        "ui",
        vec![EntryPoint::new("options-page", "src/options/index.js")],
    );
    let cfg = config(temp.path());
    build_service().build(&[target], &cfg).await.unwrap();

    let stylesheet = std::fs::read_to_string(cfg.outdir.join("ui.css")).unwrap();
    assert!(stylesheet.contains("body"));

    let bundle =
        std::fs::read_to_string(cfg.outdir.join("options-page.bundle.js")).unwrap();
    assert!(bundle.contains("options-ready"));
    assert!(!bundle.contains("color: red"));
}

#[tokio::test]
async fn test_node_identifiers_resolve_inside_the_sandbox() {
    let temp = tempdir().unwrap();
    // `fs` maps to the capability-free stub; `http` maps to a substitute
    // that is not installed here and degrades to a stub with a warning
    write_source(
        temp.path(),
        "src/background/index.js",
        "import fs from 'fs';\nimport http from 'http';\nconsole.log(\"bg-ready\");\n",
    );

    let target = simple_target(
        "background",
        vec![EntryPoint::new("background-page", "src/background/index.js")],
    );
    let cfg = config(temp.path());
    build_service().build(&[target], &cfg).await.unwrap();

    let bundle =
        std::fs::read_to_string(cfg.outdir.join("background-page.bundle.js")).unwrap();
    assert!(bundle.contains("bg-ready"));
}

#[tokio::test]
async fn test_repeated_builds_are_byte_identical() {
    let temp = tempdir().unwrap();
    write_source(
        temp.path(),
        "src/popup/index.js",
        "import { greet } from './greet.js';\nconsole.log(greet);\n",
    );
    write_source(
        temp.path(),
        "src/popup/greet.js",
        "export const greet = \"hello\";\n",
    );

    let target = simple_target(
        "ui",
        vec![EntryPoint::new("browser-action", "src/popup/index.js")],
    );
    let cfg = config(temp.path());

    build_service().build(&[target.clone()], &cfg).await.unwrap();
    let first =
        std::fs::read_to_string(cfg.outdir.join("browser-action.bundle.js")).unwrap();

    build_service().build(&[target], &cfg).await.unwrap();
    let second =
        std::fs::read_to_string(cfg.outdir.join("browser-action.bundle.js")).unwrap();

    assert_eq!(first, second);
}
