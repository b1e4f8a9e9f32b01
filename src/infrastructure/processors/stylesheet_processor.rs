use crate::core::interfaces::StylesheetProcessor;
use crate::utils::{Logger, Result, Timer};
use lightningcss::{
    printer::PrinterOptions,
    stylesheet::{ParserOptions as CssParserOptions, StyleSheet},
};
use std::path::Path;

/// Stylesheet extraction processor. Matched stylesheet sources never land in
/// the JavaScript bundle; their processed output is collected into the
/// per-target stylesheet artifact instead.
pub struct LightningStylesheetProcessor {
    minify: bool,
}

impl LightningStylesheetProcessor {
    pub fn new(minify: bool) -> Self {
        Self { minify }
    }

    fn fallback_minify(&self, content: &str) -> String {
        if self.minify {
            content
                .lines()
                .map(|line| line.trim())
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("")
        } else {
            content.to_string()
        }
    }
}

#[async_trait::async_trait]
impl StylesheetProcessor for LightningStylesheetProcessor {
    async fn process_css(&self, content: &str, path: &Path) -> Result<String> {
        let _timer = Timer::start(&format!(
            "Processing CSS {}",
            path.file_name().and_then(|s| s.to_str()).unwrap_or("unknown")
        ));

        Logger::processing_css(
            path.file_name().and_then(|s| s.to_str()).unwrap_or("unknown"),
        );

        match StyleSheet::parse(content, CssParserOptions::default()) {
            Ok(stylesheet) => match stylesheet.to_css(PrinterOptions {
                minify: self.minify,
                ..Default::default()
            }) {
                Ok(result) => Ok(result.code),
                Err(_) => {
                    Logger::warn(&format!(
                        "CSS printing failed for {}, using fallback minification",
                        path.display()
                    ));
                    Ok(self.fallback_minify(content))
                }
            },
            Err(_) => {
                Logger::warn(&format!(
                    "CSS parse error for {}, using fallback minification",
                    path.display()
                ));
                Ok(self.fallback_minify(content))
            }
        }
    }
}

/// Accumulates stylesheet contributions for one target, in module discovery
/// order, and renders the single per-target stylesheet artifact.
#[derive(Default)]
pub struct StylesheetCollector {
    sections: Vec<(String, String)>,
}

impl StylesheetCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, source: &Path, css: String) {
        let name = source
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
        self.sections.push((name, css));
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn render(&self, target: &str) -> String {
        let mut sheet = format!("/* kiln stylesheet for target: {} */\n", target);
        for (name, css) in &self.sections {
            sheet.push_str(&format!("/* from: {} */\n", name));
            sheet.push_str(css);
            sheet.push('\n');
        }
        sheet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_css_is_processed() {
        let processor = LightningStylesheetProcessor::new(true);
        let css = "body {\n  color: red;\n}\n";
        let result = processor
            .process_css(css, &PathBuf::from("popup.css"))
            .await
            .unwrap();
        assert!(!result.is_empty());
        assert!(result.contains("body"));
    }

    #[tokio::test]
    async fn test_collector_renders_in_discovery_order() {
        let processor = LightningStylesheetProcessor::new(false);
        let mut collector = StylesheetCollector::new();

        let first = processor
            .process_css("a { color: blue; }", &PathBuf::from("first.css"))
            .await
            .unwrap();
        let second = processor
            .process_css("b { margin: 0; }", &PathBuf::from("second.css"))
            .await
            .unwrap();
        collector.add(&PathBuf::from("first.css"), first);
        collector.add(&PathBuf::from("second.css"), second);

        let sheet = collector.render("ui");
        let first_pos = sheet.find("from: first.css").unwrap();
        let second_pos = sheet.find("from: second.css").unwrap();
        assert!(first_pos < second_pos);
        assert!(sheet.starts_with("/* kiln stylesheet for target: ui */"));
    }
}
