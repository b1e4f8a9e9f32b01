use crate::core::{interfaces::*, models::*, services::KilnBuildService, targets::extension_targets};
use crate::infrastructure::{
    LightningStylesheetProcessor, OxcScriptProcessor, ShimMap, ShimResolver, TokioFileSystemService,
};
use crate::utils::{BuildReporter, Logger, ReportStyle, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "kiln")]
#[command(about = "Kiln - multi-target browser extension bundler")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Development,
    Production,
}

impl From<ModeArg> for BuildMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Development => BuildMode::Development,
            ModeArg::Production => BuildMode::Production,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile every extension target
    Build {
        /// Root directory
        #[arg(short, long, default_value = ".")]
        root: String,
        /// Output directory
        #[arg(short, long, default_value = "dist/bundles")]
        outdir: String,
        /// Build mode
        #[arg(short, long, value_enum, default_value_t = ModeArg::Production)]
        mode: ModeArg,
        /// Expanded per-file progress output for CI logs
        #[arg(long)]
        ci: bool,
        /// Bake the monitoring constant into the bundles
        #[arg(long)]
        monitoring: bool,
        /// Per-asset size ceiling in bytes
        #[arg(long, default_value_t = 4_194_304)]
        max_asset_size: u64,
    },
    /// Show bundler information
    Info,
}

pub struct CliHandler;

impl CliHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(&self) -> Result<()> {
        // Initialize logging
        Logger::init();

        let cli = Cli::parse();

        match cli.command {
            Commands::Build {
                root,
                outdir,
                mode,
                ci,
                monitoring,
                max_asset_size,
            } => {
                self.handle_build_command(&root, &outdir, mode.into(), ci, monitoring, max_asset_size)
                    .await
            }
            Commands::Info => self.handle_info_command(),
        }
    }

    async fn handle_build_command(
        &self,
        root: &str,
        outdir: &str,
        mode: BuildMode,
        ci: bool,
        monitoring: bool,
        max_asset_size: u64,
    ) -> Result<()> {
        let config = BuildConfig {
            root: PathBuf::from(root),
            outdir: PathBuf::from(outdir),
            mode,
            ci,
            monitoring,
            max_asset_size,
        };

        // Create services
        let fs_service: Arc<dyn FileSystemService> = Arc::new(TokioFileSystemService);
        let script_processor: Arc<dyn ScriptProcessor> = Arc::new(OxcScriptProcessor::new());
        let stylesheet_processor: Arc<dyn StylesheetProcessor> = Arc::new(
            LightningStylesheetProcessor::new(mode == BuildMode::Production),
        );
        let shim_resolver = Arc::new(ShimResolver::new(ShimMap::browser_defaults()));
        let reporter = BuildReporter::new(ReportStyle::detect(ci));

        let build_service = KilnBuildService::new(
            fs_service,
            script_processor,
            stylesheet_processor,
            shim_resolver,
            reporter,
        );

        let targets = extension_targets();
        build_service.build(&targets, &config).await?;
        Ok(())
    }

    fn handle_info_command(&self) -> Result<()> {
        println!("🔨 Kiln v{}", env!("CARGO_PKG_VERSION"));
        println!("Multi-target browser extension bundler");
        println!();
        println!("Targets:");
        for target in extension_targets() {
            let deps = if target.depends_on.is_empty() {
                String::new()
            } else {
                format!(" (after {})", target.depends_on.join(", "))
            };
            println!("  {} - {} entries{}", target.name, target.entries.len(), deps);
        }
        Ok(())
    }
}

impl Default for CliHandler {
    fn default() -> Self {
        Self::new()
    }
}
