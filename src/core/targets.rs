use crate::core::config::TargetOverrides;
use crate::core::models::{BuildTarget, ChunkGroup, EntryPoint};

/// Declarative target set for the extension source tree: one privileged
/// background page, the UI surfaces, the sandboxed content scripts, and the
/// unsandboxed loader that stages the proxy payload into the real page.
pub fn extension_targets() -> Vec<BuildTarget> {
    vec![
        background_target(),
        ui_target(),
        content_scripts_target(),
        proxy_content_script_target(),
    ]
}

/// Background page bundle, with the heavy backend dependency subtree split
/// into its own chunk so it loads independently of the page's own code.
fn background_target() -> BuildTarget {
    BuildTarget {
        name: "background".to_string(),
        entries: vec![EntryPoint::new(
            "background-page",
            "src/background/index.js",
        )],
        depends_on: Vec::new(),
        overrides: TargetOverrides {
            rules: None,
            chunk_groups: vec![ChunkGroup {
                name: "vendor".to_string(),
                priority: 10,
                enforce: true,
                min_entries: 1,
                test: Some(
                    r"node_modules[/\\](ipfs|ipfs-http-client|ipfs-postmsg-proxy|peer-info|bcrypto|ipfsx|libp2p)"
                        .to_string(),
                ),
                exclude_entries: Vec::new(),
            }],
        },
    }
}

/// UI surfaces share a commons chunk for code used by two or more entries.
/// The background entry is excluded from the group so its heavy dependency
/// footprint is never forced onto the lightweight popups.
fn ui_target() -> BuildTarget {
    BuildTarget {
        name: "ui".to_string(),
        entries: vec![
            EntryPoint::new("browser-action", "src/popup/browser_action/index.js"),
            EntryPoint::new("page-action", "src/popup/page_action/index.js"),
            EntryPoint::new("quick-import", "src/popup/quick_import.js"),
            EntryPoint::new("options-page", "src/options/index.js"),
            EntryPoint::new("welcome-page", "src/landing_pages/welcome/index.js"),
            EntryPoint::new("proxy-acl-manager-page", "src/pages/proxy_acl/index.js"),
            EntryPoint::new("proxy-acl-dialog", "src/pages/proxy_access_dialog/index.js"),
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
                exclude_entries: vec!["background-page".to_string()],
            }],
        },
    }
}

fn content_scripts_target() -> BuildTarget {
    BuildTarget {
        name: "content-scripts".to_string(),
        entries: vec![
            EntryPoint::new("proxy-payload", "src/content_scripts/proxy/page.js"),
            EntryPoint::new("linkify", "src/content_scripts/linkify.js"),
        ],
        depends_on: Vec::new(),
        overrides: TargetOverrides::default(),
    }
}

/// Scripts run via tab injection execute in a sandboxed copy of the page
/// window. This loader is the exception: it stages the already-compiled
/// proxy payload into the real window, so it embeds that bundle verbatim
/// rather than importing its source.
fn proxy_content_script_target() -> BuildTarget {
    BuildTarget {
        name: "proxy-content-script".to_string(),
        entries: vec![EntryPoint::new(
            "proxy-loader",
            "src/content_scripts/proxy/loader.js",
        )
        .with_embed("content-scripts", "proxy-payload")],
        depends_on: vec!["content-scripts".to_string()],
        overrides: TargetOverrides::default(),
    }
}
