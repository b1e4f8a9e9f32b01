use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Build invocation mode. Baked into the output as constants; also controls
/// stylesheet minification. Not a distinct subsystem - a production build and
/// a development build run the same pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildMode {
    Development,
    Production,
}

impl BuildMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildMode::Development => "development",
            BuildMode::Production => "production",
        }
    }
}

/// Invocation-level configuration shared by every target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_outdir")]
    pub outdir: PathBuf,
    pub mode: BuildMode,
    /// Expanded progress output for CI logs; never changes build output
    #[serde(default)]
    pub ci: bool,
    /// Bakes the monitoring constant into the bundles
    #[serde(default)]
    pub monitoring: bool,
    /// Hard per-asset ceiling imposed by the packaging host. Policy, not an
    /// invariant: override it when the host limit changes.
    #[serde(default = "default_max_asset_size")]
    pub max_asset_size: u64,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_outdir() -> PathBuf {
    PathBuf::from("dist/bundles")
}

fn default_max_asset_size() -> u64 {
    4_194_304
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            outdir: default_outdir(),
            mode: BuildMode::Production,
            ci: false,
            monitoring: false,
            max_asset_size: default_max_asset_size(),
        }
    }
}

/// Reference to another target's compiled output bundle. Resolved only after
/// the referenced target has finished compiling; never part of the generic
/// module resolution path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub target: String,
    pub bundle: String,
}

/// A logical bundle name mapped to the source file that roots its module
/// graph. An entry may additionally embed a dependency target's finished
/// bundle as an opaque string payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryPoint {
    pub name: String,
    pub source: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed: Option<ArtifactRef>,
}

impl EntryPoint {
    pub fn new(name: &str, source: &str) -> Self {
        Self {
            name: name.to_string(),
            source: PathBuf::from(source),
            embed: None,
        }
    }

    pub fn with_embed(mut self, target: &str, bundle: &str) -> Self {
        self.embed = Some(ArtifactRef {
            target: target.to_string(),
            bundle: bundle.to_string(),
        });
        self
    }
}

/// Which transform chain a pipeline rule routes matched files through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformChain {
    /// Extract into the per-target stylesheet artifact
    Stylesheet,
    /// Copy to a stable, hash-free name under the asset directory
    BinaryAsset,
    /// No-op placeholder; matched files are never emitted
    IgnoredFont,
    /// Downlevel application code to the runtime's supported syntax
    Script,
    /// Sanitize then downlevel server-authored dependencies, keeping
    /// module form and allowing async-generator and class-field syntax
    DependencyScript,
}

/// A (pattern, chain, filter) triple. Rules are evaluated in declaration
/// order; every matching chain applies. A file matched by no rule passes
/// through unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRule {
    pub name: String,
    /// Regex over the file path
    pub test: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
    pub chain: TransformChain,
}

/// Named chunk-policy entry. Groups are evaluated by descending priority and
/// at most one group claims any given module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkGroup {
    pub name: String,
    pub priority: i32,
    /// Force the group's chunk even below the default shared-usage threshold
    #[serde(default)]
    pub enforce: bool,
    /// Minimum number of entry points that must reference a module
    #[serde(default = "default_min_entries")]
    pub min_entries: usize,
    /// Regex over the module path; `None` matches every candidate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
    /// Entries that neither contribute to nor consume this group's chunk
    #[serde(default)]
    pub exclude_entries: Vec<String>,
}

fn default_min_entries() -> usize {
    1
}

/// A named bundle group: its entry points, the targets it depends on, and
/// overrides layered on the shared base configuration.
#[derive(Debug, Clone)]
pub struct BuildTarget {
    pub name: String,
    pub entries: Vec<EntryPoint>,
    pub depends_on: Vec<String>,
    pub overrides: crate::core::config::TargetOverrides,
}

/// A source module discovered while walking an entry's import graph.
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub path: PathBuf,
    pub content: String,
    pub module_type: ModuleType,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleType {
    JavaScript,
    Css,
    Json,
    Asset,
    Unknown,
}

impl ModuleType {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" => ModuleType::JavaScript,
            "css" => ModuleType::Css,
            "json" => ModuleType::Json,
            "png" | "jpg" | "jpeg" | "gif" | "svg" | "woff2" | "woff" | "ttf" | "otf" | "eot" => {
                ModuleType::Asset
            }
            _ => ModuleType::Unknown,
        }
    }
}

/// Bindings used when flattening module syntax for concatenation: the name
/// this module's own default export receives, and the names of the defaults
/// it imports, keyed by the specifier as written. Derived from module keys
/// so two modules can never collide on one binding.
#[derive(Debug, Clone)]
pub struct DefaultBindings {
    pub own: String,
    pub imports: std::collections::BTreeMap<String, String>,
}

impl DefaultBindings {
    pub fn for_module(key: &str) -> Self {
        Self {
            own: Self::binding_for(key),
            imports: std::collections::BTreeMap::new(),
        }
    }

    /// Stable identifier for a module's default export, derived from its
    /// root-relative key.
    pub fn binding_for(key: &str) -> String {
        let ident: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("__default_{}", ident)
    }
}

impl Default for DefaultBindings {
    fn default() -> Self {
        Self {
            own: "__default".to_string(),
            imports: std::collections::BTreeMap::new(),
        }
    }
}

/// A module after pipeline transformation, tagged with the entries whose
/// graphs reach it. Discovery order keeps bundle output deterministic.
#[derive(Debug, Clone)]
pub struct ResolvedModule {
    pub info: ModuleInfo,
    pub code: String,
    pub entries: BTreeSet<String>,
    pub order: usize,
}

#[derive(Debug, Clone)]
pub struct OutputFile {
    pub path: PathBuf,
    pub content: String,
    pub size: usize,
}

impl OutputFile {
    pub fn new(path: PathBuf, content: String) -> Self {
        let size = content.len();
        Self {
            path,
            content,
            size,
        }
    }
}

/// The compiled output of one target: bundle files plus an optional
/// stylesheet. Immutable once written; consumed by the runtime loader or by
/// a dependent target's embedding step.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub target: String,
    pub bundles: Vec<OutputFile>,
    pub stylesheet: Option<OutputFile>,
}

impl Artifact {
    pub fn bundle(&self, logical_name: &str) -> Option<&OutputFile> {
        let file_name = format!("{}.bundle.js", logical_name);
        self.bundles
            .iter()
            .find(|b| b.path.file_name().and_then(|n| n.to_str()) == Some(file_name.as_str()))
    }

    pub fn output_files(&self) -> impl Iterator<Item = &OutputFile> {
        self.bundles.iter().chain(self.stylesheet.iter())
    }
}

#[derive(Debug, Default)]
pub struct BuildResult {
    pub artifacts: Vec<Artifact>,
    pub build_time: std::time::Duration,
}

impl BuildResult {
    pub fn artifact(&self, target: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.target == target)
    }

    pub fn total_files(&self) -> usize {
        self.artifacts
            .iter()
            .map(|a| a.output_files().count())
            .sum()
    }
}
