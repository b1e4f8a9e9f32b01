use crate::core::{interfaces::ScriptProcessor, models::*};
use crate::utils::{BuildConstants, KilnError, Logger, Result, Timer};
use once_cell::sync::Lazy;
use oxc_allocator::Allocator;
use oxc_parser::Parser;
use oxc_span::SourceType;
use regex::Regex;

static IMPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(?:[\w$\{\}\*,\s]+\s+from\s+)?['"]([^'"]+)['"]"#)
        .expect("static pattern")
});
static REQUIRE_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).expect("static pattern"));
static EXPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*export\s+(?:\*|\{[^}]*\})\s+from\s+['"]([^'"]+)['"]"#)
        .expect("static pattern")
});
static DEFAULT_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^\s*import\s+([A-Za-z_$][\w$]*)\s*(?:,\s*\{[^}]*\})?\s+from\s+['"]([^'"]+)['"]"#,
    )
    .expect("static pattern")
});

/// Syntax downleveling on top of the oxc parser.
///
/// Application code is flattened for concatenation: imports become comments
/// (the graph walk has already inlined the modules) and exports turn into
/// plain declarations. Dependency code keeps its module form so the emitted
/// chunk stays independently loadable.
pub struct OxcScriptProcessor;

impl OxcScriptProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Validate syntax with oxc. Async-generator and class-field syntax are
    /// accepted by the parser without extra configuration, which covers the
    /// additional allowances the dependency chain needs.
    fn validate_syntax(&self, module: &ModuleInfo, source: &str) -> Result<()> {
        let allocator = Allocator::default();
        // Everything in the tree is authored as ES modules, whatever the
        // extension says
        let source_type = SourceType::from_path(&module.path)
            .unwrap_or_default()
            .with_module(true);

        let parser = Parser::new(&allocator, source, source_type);
        let parse_result = parser.parse();

        if !parse_result.errors.is_empty() {
            let messages: Vec<String> = parse_result
                .errors
                .iter()
                .map(|e| e.to_string())
                .collect();
            return Err(KilnError::build(format!(
                "syntax error in {}: {}",
                module.path.display(),
                messages.join("; ")
            )));
        }
        Ok(())
    }

    /// Strip the leading interpreter-directive line some server-authored
    /// packages ship. Only a first-line `#!` counts; a later line starting
    /// with `#` is a syntax error and stays for the parser to reject.
    fn strip_hashbang(source: &str) -> &str {
        if let Some(rest) = source.strip_prefix("#!") {
            match rest.find('\n') {
                Some(pos) => &rest[pos + 1..],
                None => "",
            }
        } else {
            source
        }
    }

    fn flatten_modules(&self, content: &str, bindings: &DefaultBindings) -> String {
        let mut processed_lines = Vec::new();

        for line in content.lines() {
            let trimmed = line.trim();

            if trimmed.starts_with("import ") {
                // Default imports are rebound to the exporter's flattened
                // binding; named imports match the exporter's declarations
                // already and only the import line itself is dropped
                let rebound = DEFAULT_IMPORT.captures(line).and_then(|caps| {
                    bindings
                        .imports
                        .get(&caps[2])
                        .map(|ident| format!("const {} = {}; // {}", &caps[1], ident, trimmed))
                });
                match rebound {
                    Some(declaration) => processed_lines.push(declaration),
                    None => processed_lines.push(format!("// {}", line)),
                }
            } else if trimmed.starts_with("export default ") {
                processed_lines.push(line.replacen(
                    "export default ",
                    &format!("const {} = ", bindings.own),
                    1,
                ));
            } else if trimmed.starts_with("export ") {
                if trimmed.starts_with("export const ")
                    || trimmed.starts_with("export let ")
                    || trimmed.starts_with("export var ")
                    || trimmed.starts_with("export function ")
                    || trimmed.starts_with("export async function ")
                    || trimmed.starts_with("export class ")
                {
                    processed_lines.push(line.replacen("export ", "", 1));
                } else {
                    processed_lines.push(format!("// {}", line));
                }
            } else {
                processed_lines.push(line.to_string());
            }
        }

        processed_lines.join("\n")
    }
}

#[async_trait::async_trait]
impl ScriptProcessor for OxcScriptProcessor {
    async fn downlevel(
        &self,
        module: &ModuleInfo,
        constants: &BuildConstants,
        bindings: &DefaultBindings,
    ) -> Result<String> {
        let _timer = Timer::start(&format!(
            "Downleveling {}",
            module
                .path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
        ));

        self.validate_syntax(module, &module.content)?;
        let flattened = self.flatten_modules(&module.content, bindings);
        Ok(constants.substitute(&flattened))
    }

    async fn downlevel_dependency(
        &self,
        module: &ModuleInfo,
        constants: &BuildConstants,
    ) -> Result<String> {
        let _timer = Timer::start(&format!(
            "Downleveling dependency {}",
            module
                .path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
        ));

        let sanitized = Self::strip_hashbang(&module.content);
        if sanitized.len() != module.content.len() {
            Logger::debug(&format!(
                "Stripped interpreter directive from {}",
                module.path.display()
            ));
        }

        self.validate_syntax(module, sanitized)?;
        // Module form is preserved: imports and exports pass through as-is
        Ok(constants.substitute(sanitized))
    }

    fn extract_dependencies(&self, content: &str) -> Vec<String> {
        let mut dependencies = Vec::new();
        let mut push = |spec: &str| {
            let spec = spec.to_string();
            if !dependencies.contains(&spec) {
                dependencies.push(spec);
            }
        };

        for caps in IMPORT_FROM.captures_iter(content) {
            push(&caps[1]);
        }
        for caps in EXPORT_FROM.captures_iter(content) {
            push(&caps[1]);
        }
        for caps in REQUIRE_CALL.captures_iter(content) {
            push(&caps[1]);
        }

        dependencies
    }
}

impl Default for OxcScriptProcessor {
    fn default() -> Self {
        Self::new()
    }
}
