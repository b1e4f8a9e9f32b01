use crate::core::config::base_config;
use crate::core::graph::TargetGraph;
use crate::core::{interfaces::*, models::*};
use crate::infrastructure::{
    ArtifactEmbedder, AssetEmitter, ChunkSplitter, CompiledRule, OptimizerService, Pipeline,
    ResolvedShim, ShimResolver, StylesheetCollector, EMPTY_STUB_SOURCE,
};
use crate::utils::{BuildConstants, BuildReporter, KilnError, Logger, Result, Timer};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A module loaded and transformed during a target's graph walk, with the
/// resolved paths and keys of its imports so later entries can re-traverse
/// without re-transforming.
struct LoadedModule {
    resolved: ResolvedModule,
    dep_paths: Vec<PathBuf>,
    dep_keys: Vec<String>,
}

/// Per-target working state: the module table in discovery order plus the
/// stylesheet side-channel.
struct TargetCompilation {
    modules: HashMap<String, LoadedModule>,
    stylesheets: StylesheetCollector,
    next_order: usize,
}

impl TargetCompilation {
    fn new() -> Self {
        Self {
            modules: HashMap::new(),
            stylesheets: StylesheetCollector::new(),
            next_order: 0,
        }
    }

    /// Emission order for the concatenated bundles: post-order over the
    /// resolved import edges from each entry, so every module's declarations
    /// precede all of its users and entries come last. Import cycles break
    /// at the back edge.
    fn ordered_modules(&self, entry_keys: &[String]) -> Vec<ResolvedModule> {
        let mut ordered = Vec::new();
        let mut visited = std::collections::HashSet::new();
        for key in entry_keys {
            self.visit(key, &mut visited, &mut ordered);
        }
        ordered
    }

    fn visit(
        &self,
        key: &str,
        visited: &mut std::collections::HashSet<String>,
        ordered: &mut Vec<ResolvedModule>,
    ) {
        if !visited.insert(key.to_string()) {
            return;
        }
        if let Some(loaded) = self.modules.get(key) {
            for dep in &loaded.dep_keys {
                self.visit(dep, visited, ordered);
            }
            ordered.push(loaded.resolved.clone());
        }
    }
}

/// The build driver: resolves the target graph, runs the pipeline per
/// target, applies shimming and chunk policy, invokes the optimizer, and
/// fails the whole multi-target build atomically on the first error.
pub struct KilnBuildService {
    fs_service: Arc<dyn FileSystemService>,
    script_processor: Arc<dyn ScriptProcessor>,
    stylesheet_processor: Arc<dyn StylesheetProcessor>,
    shim_resolver: Arc<ShimResolver>,
    optimizer: OptimizerService,
    reporter: BuildReporter,
}

impl KilnBuildService {
    pub fn new(
        fs_service: Arc<dyn FileSystemService>,
        script_processor: Arc<dyn ScriptProcessor>,
        stylesheet_processor: Arc<dyn StylesheetProcessor>,
        shim_resolver: Arc<ShimResolver>,
        reporter: BuildReporter,
    ) -> Self {
        Self {
            fs_service,
            script_processor,
            stylesheet_processor,
            shim_resolver,
            optimizer: OptimizerService::new(),
            reporter,
        }
    }

    fn rel_key(path: &Path, root: &Path) -> String {
        path.strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Probe a resolved import for an actual file: as written, with a `.js`
    /// extension, or as a directory entry point.
    fn probe_file(&self, path: &Path) -> Option<PathBuf> {
        if self.fs_service.file_exists(path) && path.is_file() {
            return Some(path.to_path_buf());
        }
        let with_ext = PathBuf::from(format!("{}.js", path.to_string_lossy()));
        if self.fs_service.file_exists(&with_ext) {
            return Some(with_ext);
        }
        let index = path.join("index.js");
        if self.fs_service.file_exists(&index) {
            return Some(index);
        }
        None
    }

    /// Resolve one import specifier from `from_file`. Shim-mapped
    /// identifiers win; unresolved bare identifiers fall through to the
    /// node_modules search path. `None` means the import stays external.
    fn resolve_specifier(
        &self,
        specifier: &str,
        from_file: &Path,
        root: &Path,
    ) -> Result<Option<PathBuf>> {
        if specifier.starts_with("./") || specifier.starts_with("../") {
            let base = from_file.parent().unwrap_or(root);
            return match self.probe_file(&base.join(specifier)) {
                Some(path) => Ok(Some(path)),
                None => Err(KilnError::build(format!(
                    "cannot resolve import '{}' from {}",
                    specifier,
                    from_file.display()
                ))),
            };
        }

        match self.shim_resolver.resolve(specifier, root) {
            Some(ResolvedShim::EmptyStub) => Ok(Some(Self::stub_path(specifier))),
            Some(ResolvedShim::Module(path)) => match self.probe_file(&path) {
                Some(path) => Ok(Some(path)),
                None => {
                    Logger::warn(&format!(
                        "substitute for '{}' not installed, stubbing it out",
                        specifier
                    ));
                    Ok(Some(Self::stub_path(specifier)))
                }
            },
            None => {
                // Normal resolution search path
                match self.probe_file(&root.join("node_modules").join(specifier)) {
                    Some(path) => Ok(Some(path)),
                    None => {
                        Logger::debug(&format!(
                            "leaving unresolved import '{}' external",
                            specifier
                        ));
                        Ok(None)
                    }
                }
            }
        }
    }

    fn stub_path(specifier: &str) -> PathBuf {
        PathBuf::from("__kiln_stubs__").join(format!("{}.js", specifier.replace('/', "_")))
    }

    fn is_stub(path: &Path) -> bool {
        path.starts_with("__kiln_stubs__")
    }

    /// Run every matching transform chain over one file, in rule order.
    /// Chains compose: each stage receives the previous stage's output.
    #[allow(clippy::too_many_arguments)]
    async fn apply_chains(
        &self,
        rules: &[&CompiledRule],
        info: &ModuleInfo,
        constants: &BuildConstants,
        bindings: &DefaultBindings,
        assets: &AssetEmitter,
        outdir: &Path,
        compilation: &mut TargetCompilation,
    ) -> Result<String> {
        // A file matched by no rule passes through unmodified
        let mut code = info.content.clone();

        for rule in rules {
            let staged_info = ModuleInfo {
                content: code.clone(),
                ..info.clone()
            };
            code = match rule.chain {
                TransformChain::Stylesheet => {
                    let css = self
                        .stylesheet_processor
                        .process_css(&staged_info.content, &info.path)
                        .await?;
                    compilation.stylesheets.add(&info.path, css);
                    String::new()
                }
                TransformChain::BinaryAsset => {
                    let public_path = assets.emit(&info.path, outdir).await?;
                    AssetEmitter::stub_module(&public_path)
                }
                TransformChain::IgnoredFont => {
                    // Placeholder only; legacy fonts are never emitted
                    format!("// ignored legacy font: {}\n", info.path.display())
                }
                TransformChain::Script => {
                    self.script_processor
                        .downlevel(&staged_info, constants, bindings)
                        .await?
                }
                TransformChain::DependencyScript => {
                    self.script_processor
                        .downlevel_dependency(&staged_info, constants)
                        .await?
                }
            };
            Logger::processing_file(&info.path.to_string_lossy(), &rule.name);
        }

        Ok(code)
    }

    /// Load, transform, and index one module; repeated visits from other
    /// entries only extend the attribution set.
    #[allow(clippy::too_many_arguments)]
    async fn load_module(
        &self,
        path: &Path,
        entry_name: &str,
        pipeline: &Pipeline,
        constants: &BuildConstants,
        assets: &AssetEmitter,
        root: &Path,
        outdir: &Path,
        compilation: &mut TargetCompilation,
    ) -> Result<Vec<PathBuf>> {
        let key = Self::rel_key(path, root);

        if let Some(loaded) = compilation.modules.get_mut(&key) {
            loaded.resolved.entries.insert(entry_name.to_string());
            return Ok(loaded.dep_paths.clone());
        }

        let (info, code, dep_paths) = if Self::is_stub(path) {
            let info = ModuleInfo {
                path: path.to_path_buf(),
                content: String::new(),
                module_type: ModuleType::JavaScript,
                dependencies: Vec::new(),
            };
            let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("module");
            let code = format!("// stub for '{}'\n{}", name, EMPTY_STUB_SOURCE);
            (info, code, Vec::new())
        } else {
            let module_type = ModuleType::from_extension(
                path.extension().and_then(|s| s.to_str()).unwrap_or(""),
            );
            let content = if module_type == ModuleType::Asset {
                // Binary sources are copied, never read as text
                String::new()
            } else {
                self.fs_service.read_file(path).await?
            };

            let dependencies = if module_type == ModuleType::JavaScript {
                self.script_processor.extract_dependencies(&content)
            } else {
                Vec::new()
            };

            let info = ModuleInfo {
                path: path.to_path_buf(),
                content,
                module_type,
                dependencies: dependencies.clone(),
            };

            // Imports resolve before the transform runs so the flattening
            // stage knows which binding each default import lands on
            let mut dep_paths = Vec::new();
            let mut bindings = DefaultBindings::for_module(&key);
            for specifier in &dependencies {
                if let Some(resolved) = self.resolve_specifier(specifier, path, root)? {
                    bindings.imports.insert(
                        specifier.clone(),
                        DefaultBindings::binding_for(&Self::rel_key(&resolved, root)),
                    );
                    dep_paths.push(resolved);
                }
            }

            // Match on the root-relative key so node_modules patterns work
            // no matter where the project root lives
            let matched = pipeline.matching(Path::new(&key));
            let code = self
                .apply_chains(
                    &matched, &info, constants, &bindings, assets, outdir, compilation,
                )
                .await
                .map_err(|err| match err {
                    KilnError::AssetTooLarge { .. } => err,
                    KilnError::Transform { .. } => err,
                    other => {
                        let rule = matched
                            .last()
                            .map(|r| r.name.clone())
                            .unwrap_or_else(|| "passthrough".to_string());
                        KilnError::transform(info.path.clone(), &rule, other.to_string())
                    }
                })?;

            (info, code, dep_paths)
        };

        let order = compilation.next_order;
        compilation.next_order += 1;

        let mut resolved = ResolvedModule {
            info,
            code,
            entries: Default::default(),
            order,
        };
        resolved.entries.insert(entry_name.to_string());

        let dep_keys = dep_paths
            .iter()
            .map(|dep| Self::rel_key(dep, root))
            .collect();
        compilation.modules.insert(
            key,
            LoadedModule {
                resolved,
                dep_paths: dep_paths.clone(),
                dep_keys,
            },
        );
        Ok(dep_paths)
    }

    /// Walk one entry's import graph breadth-first, attributing every
    /// reached module to the entry.
    #[allow(clippy::too_many_arguments)]
    async fn walk_entry(
        &self,
        entry: &EntryPoint,
        pipeline: &Pipeline,
        constants: &BuildConstants,
        assets: &AssetEmitter,
        root: &Path,
        outdir: &Path,
        compilation: &mut TargetCompilation,
    ) -> Result<()> {
        let mut queue = std::collections::VecDeque::new();
        let mut seen = std::collections::HashSet::new();
        queue.push_back(root.join(&entry.source));

        while let Some(path) = queue.pop_front() {
            let key = Self::rel_key(&path, root);
            if !seen.insert(key) {
                continue;
            }

            let dep_paths = self
                .load_module(
                    &path,
                    &entry.name,
                    pipeline,
                    constants,
                    assets,
                    root,
                    outdir,
                    compilation,
                )
                .await?;
            for dep in dep_paths {
                queue.push_back(dep);
            }
        }
        Ok(())
    }

    fn render_bundle(
        target: &str,
        title: &str,
        modules: impl Iterator<Item = ResolvedModule>,
    ) -> String {
        let mut bundle = format!("// kiln bundle: {} (target: {})\n\"use strict\";\n", title, target);
        for module in modules {
            if module.code.trim().is_empty() {
                continue;
            }
            bundle.push_str(&format!("\n// module: {}\n", module.info.path.display()));
            bundle.push_str(&module.code);
            if !module.code.ends_with('\n') {
                bundle.push('\n');
            }
        }
        bundle
    }

    async fn compile_target(
        &self,
        target: &BuildTarget,
        config: &BuildConfig,
        constants: &BuildConstants,
    ) -> Result<Artifact> {
        let _timer = Timer::start(&format!("Compiling target {}", target.name));
        Logger::compiling_target(&target.name, target.entries.len());
        self.reporter.target_started(&target.name);

        let effective = base_config().merge(&target.overrides);
        let pipeline = Pipeline::compile(&effective.rules)?;
        let splitter = ChunkSplitter::new(&effective.chunk_groups)?;
        let assets = AssetEmitter::new(self.fs_service.clone(), config.max_asset_size);
        let embedder = ArtifactEmbedder::new(self.fs_service.clone());

        let mut compilation = TargetCompilation::new();
        for entry in &target.entries {
            self.walk_entry(
                entry,
                &pipeline,
                constants,
                &assets,
                &config.root,
                &config.outdir,
                &mut compilation,
            )
            .await?;
        }

        let entry_keys: Vec<String> = target
            .entries
            .iter()
            .map(|entry| Self::rel_key(&config.root.join(&entry.source), &config.root))
            .collect();
        let modules = compilation.ordered_modules(&entry_keys);
        let plan = splitter.split(&modules);

        let mut bundles = Vec::new();

        for chunk in plan.chunk_names() {
            let content = Self::render_bundle(
                &target.name,
                chunk,
                plan.chunk_modules(chunk, &modules).cloned(),
            );
            let optimized = self
                .optimizer
                .optimize_bundle(content, &format!("{}.bundle.js", chunk))
                .await?;
            bundles.push(OutputFile::new(
                config.outdir.join(format!("{}.bundle.js", chunk)),
                optimized,
            ));
        }

        for entry in &target.entries {
            let mut content = String::new();
            if let Some(embed) = &entry.embed {
                let payload = embedder.load(embed, &config.outdir).await?;
                content.push_str(&ArtifactEmbedder::binding(&payload));
            }
            content.push_str(&Self::render_bundle(
                &target.name,
                &entry.name,
                plan.entry_modules(&entry.name, &modules).cloned(),
            ));
            let optimized = self
                .optimizer
                .optimize_bundle(content, &format!("{}.bundle.js", entry.name))
                .await?;
            bundles.push(OutputFile::new(
                config.outdir.join(format!("{}.bundle.js", entry.name)),
                optimized,
            ));
        }

        for bundle in &bundles {
            self.fs_service
                .write_file(&bundle.path, &bundle.content)
                .await?;
        }

        let stylesheet = if compilation.stylesheets.is_empty() {
            None
        } else {
            let sheet = compilation.stylesheets.render(&target.name);
            let path = config.outdir.join(format!("{}.css", target.name));
            self.fs_service.write_file(&path, &sheet).await?;
            Some(OutputFile::new(path, sheet))
        };

        let artifact = Artifact {
            target: target.name.clone(),
            bundles,
            stylesheet,
        };

        let files: Vec<(String, usize)> = artifact
            .output_files()
            .map(|f| {
                (
                    f.path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("?")
                        .to_string(),
                    f.size,
                )
            })
            .collect();
        self.reporter.target_finished(&target.name, &files);

        Ok(artifact)
    }
}

#[async_trait::async_trait]
impl BuildService for KilnBuildService {
    async fn build(&self, targets: &[BuildTarget], config: &BuildConfig) -> Result<BuildResult> {
        let build_timer = std::time::Instant::now();
        Logger::build_start(config.mode.as_str(), &config.outdir.to_string_lossy());
        self.reporter.banner(config.mode.as_str());

        // Ordering is validated before any compilation starts
        let levels = TargetGraph::resolve(targets)?;
        Logger::target_order(&TargetGraph::flatten(&levels));

        // Resolved once per build; every pipeline invocation sees the same
        // frozen constants
        let constants = BuildConstants::for_mode(config.mode, config.monitoring);

        // Fresh output directory per invocation; artifacts are immutable
        // once written
        self.fs_service.remove_directory(&config.outdir).await?;
        self.fs_service.create_directory(&config.outdir).await?;

        let by_name: HashMap<&str, &BuildTarget> =
            targets.iter().map(|t| (t.name.as_str(), t)).collect();

        let mut artifacts = Vec::new();
        for level in &levels {
            let compilations = level.iter().map(|name| {
                let target = by_name[name.as_str()];
                let constants = &constants;
                async move {
                    self.compile_target(target, config, constants)
                        .await
                        .map_err(|err| (target.name.clone(), err))
                }
            });

            match futures::future::try_join_all(compilations).await {
                Ok(level_artifacts) => artifacts.extend(level_artifacts),
                Err((failed_target, err)) => {
                    // Leave nothing behind that could pass for a complete
                    // artifact set
                    self.fs_service.remove_directory(&config.outdir).await.ok();
                    self.reporter.build_failed(&failed_target, &err.to_string());
                    return Err(err);
                }
            }
        }

        let result = BuildResult {
            artifacts,
            build_time: build_timer.elapsed(),
        };
        self.reporter
            .build_finished(targets.len(), result.total_files());
        Ok(result)
    }
}
