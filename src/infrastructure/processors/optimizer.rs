use crate::utils::{KilnError, Result};
use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_minifier::{MangleOptions, Minifier, MinifierOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::sync::Arc;

/// Final-stage JavaScript optimizer.
///
/// Name mangling is always applied. The compression passes stay disabled:
/// the dead-code pass removes ostensibly-unused expressions that at least
/// one bundled dependency relies on for side effects, and trading bundle
/// size for runtime correctness is not acceptable here.
pub struct Optimizer {
    options: MinifierOptions,
}

impl Optimizer {
    pub fn new() -> Self {
        Self {
            options: MinifierOptions {
                mangle: Some(MangleOptions::default()),
                compress: None,
            },
        }
    }

    pub fn optimize(&self, source_code: &str, filename: &str) -> Result<String> {
        let allocator = Allocator::default();
        let source_type = SourceType::from_path(filename)
            .unwrap_or_default()
            .with_module(true);

        let parser = Parser::new(&allocator, source_code, source_type);
        let parse_result = parser.parse();

        if !parse_result.errors.is_empty() {
            let errors: Vec<String> = parse_result
                .errors
                .iter()
                .map(|e| format!("parse error: {}", e))
                .collect();
            return Err(KilnError::build(errors.join("\n")));
        }

        let mut program = parse_result.program;
        let minifier = Minifier::new(self.options.clone());
        minifier.minify(&allocator, &mut program);

        let codegen_options = CodegenOptions {
            minify: true,
            ..Default::default()
        };

        let mut codegen = Codegen::new();
        codegen = codegen.with_options(codegen_options);
        Ok(codegen.build(&program).code)
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Async wrapper running optimization on the blocking pool; oxc is
/// CPU-bound and must not stall the driver's task set.
pub struct OptimizerService {
    optimizer: Arc<Optimizer>,
}

impl OptimizerService {
    pub fn new() -> Self {
        Self {
            optimizer: Arc::new(Optimizer::new()),
        }
    }

    pub async fn optimize_bundle(&self, bundle: String, filename: &str) -> Result<String> {
        let optimizer = self.optimizer.clone();
        let filename = filename.to_string();

        tokio::task::spawn_blocking(move || optimizer.optimize(&bundle, &filename))
            .await
            .map_err(|e| KilnError::build(format!("optimizer task failed: {}", e)))?
    }
}

impl Default for OptimizerService {
    fn default() -> Self {
        Self::new()
    }
}
