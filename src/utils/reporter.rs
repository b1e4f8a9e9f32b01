use colored::*;
use std::time::Instant;

/// Progress output style. CI logs want one line per event with no cursor
/// tricks; interactive terminals get the compact summary. The style never
/// influences build output, only what gets printed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportStyle {
    Compact,
    Expanded,
}

impl ReportStyle {
    pub fn detect(ci_flag: bool) -> Self {
        if ci_flag || std::env::var_os("CI").is_some() {
            ReportStyle::Expanded
        } else {
            ReportStyle::Compact
        }
    }
}

pub struct BuildReporter {
    style: ReportStyle,
    start_time: Instant,
}

impl BuildReporter {
    pub fn new(style: ReportStyle) -> Self {
        Self {
            style,
            start_time: Instant::now(),
        }
    }

    pub fn banner(&self, mode: &str) {
        println!(
            "\n  {} {} {}",
            "KILN".bright_cyan().bold(),
            env!("CARGO_PKG_VERSION").bright_white(),
            format!("({})", mode).bright_black()
        );
        println!();
    }

    pub fn target_started(&self, name: &str) {
        if self.style == ReportStyle::Expanded {
            println!("  {} target {}", "⧖".bright_black(), name.bright_cyan());
        }
    }

    pub fn target_finished(&self, name: &str, files: &[(String, usize)]) {
        match self.style {
            ReportStyle::Expanded => {
                for (file, size) in files {
                    println!(
                        "  {} {} {} {}",
                        "✓".bright_green(),
                        name.bright_cyan(),
                        file,
                        format!("({})", Self::format_size(*size)).bright_black()
                    );
                }
            }
            ReportStyle::Compact => {
                println!(
                    "  {} {} {}",
                    name.bright_cyan(),
                    format!("{} files", files.len()).bright_white(),
                    format!(
                        "({})",
                        Self::format_size(files.iter().map(|(_, s)| s).sum())
                    )
                    .bright_black()
                );
            }
        }
    }

    pub fn build_finished(&self, targets: usize, files: usize) {
        let elapsed = self.start_time.elapsed();
        println!();
        println!(
            "  {} {} targets, {} files built in {}",
            "✓".bright_green(),
            targets.to_string().bright_cyan().bold(),
            files.to_string().bright_cyan().bold(),
            format!("{:.0}ms", elapsed.as_secs_f64() * 1000.0)
                .bright_white()
                .bold()
        );
    }

    pub fn build_failed(&self, target: &str, message: &str) {
        println!();
        println!(
            "  {} {}",
            "✗".bright_red().bold(),
            Self::format_failure(target, message).bright_red()
        );
    }

    fn format_failure(target: &str, message: &str) -> String {
        format!("target '{}': {}", target, message)
    }

    fn format_size(size: usize) -> String {
        let kb = size as f64 / 1024.0;
        if kb < 1.0 {
            format!("{} B", size)
        } else {
            format!("{:.2} kB", kb)
        }
    }
}
