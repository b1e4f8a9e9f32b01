use std::time::Instant;
use tracing::{debug, error, info, warn};

pub struct Logger;

impl Logger {
    pub fn init() {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "kiln=info".into()),
            )
            .with_target(false)
            .init();
    }

    pub fn build_start(mode: &str, outdir: &str) {
        info!("🔨 Kiln - Extension Build");
        info!("═══════════════════════════════════════");
        info!("⚙️  Mode: {}", mode);
        info!("📦 Output: {}", outdir);
    }

    pub fn target_order(order: &[String]) {
        info!("🗺️  Compilation order: {}", order.join(" → "));
    }

    pub fn compiling_target(name: &str, entries: usize) {
        info!("🎯 Compiling target '{}' ({} entries)", name, entries);
    }

    pub fn processing_file(name: &str, rule: &str) {
        debug!("⚡ Processing: {} ({})", name, rule);
    }

    pub fn processing_css(name: &str) {
        debug!("🎨 Extracting stylesheet: {}", name);
    }

    pub fn emitting_asset(name: &str, size: u64) {
        debug!("🖼️  Emitting asset: {} ({} bytes)", name, size);
    }

    pub fn embedding_artifact(target: &str, bundle: &str) {
        info!("📎 Embedding '{}' bundle from target '{}'", bundle, target);
    }

    pub fn debug(msg: &str) {
        debug!("{}", msg);
    }

    pub fn info(msg: &str) {
        info!("{}", msg);
    }

    pub fn warn(msg: &str) {
        warn!("⚠️  {}", msg);
    }

    pub fn error(msg: &str) {
        error!("❌ {}", msg);
    }
}

pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn start(name: &str) -> Self {
        debug!("⏱️  Starting: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        debug!("⏱️  Completed: {} in {:.2?}", self.name, self.elapsed());
    }
}
