use crate::core::models::BuildMode;
use std::collections::BTreeMap;

// `global` must only be rewritten where it appears as a free identifier:
// not inside names like `globalThis`, not as a property access like
// `obj.global`, and not inside string literals. The regex crate has no
// lookbehind, so this is a small hand scan tracking string state and the
// last significant character.
fn rewrite_global_identifiers(code: &str) -> String {
    const TOKEN: &str = "global";
    let is_ident = |c: char| c.is_alphanumeric() || c == '_' || c == '$';

    let mut out = String::with_capacity(code.len());
    let mut string_delim: Option<char> = None;
    let mut last_significant: Option<char> = None;
    let mut i = 0;

    while i < code.len() {
        let c = code[i..].chars().next().unwrap_or('\0');

        if let Some(delim) = string_delim {
            out.push(c);
            i += c.len_utf8();
            if c == '\\' {
                if let Some(escaped) = code[i..].chars().next() {
                    out.push(escaped);
                    i += escaped.len_utf8();
                }
            } else if c == delim {
                string_delim = None;
            }
            continue;
        }

        if c == '"' || c == '\'' || c == '`' {
            string_delim = Some(c);
            out.push(c);
            last_significant = Some(c);
            i += 1;
            continue;
        }

        if code[i..].starts_with(TOKEN) {
            let prev_is_ident = code[..i].chars().next_back().is_some_and(is_ident);
            let next_is_ident = code[i + TOKEN.len()..]
                .chars()
                .next()
                .is_some_and(is_ident);
            let is_property = last_significant == Some('.');
            if !prev_is_ident && !next_is_ident && !is_property {
                out.push_str("window");
                last_significant = Some('w');
                i += TOKEN.len();
                continue;
            }
        }

        out.push(c);
        if !c.is_whitespace() {
            last_significant = Some(c);
        }
        i += c.len_utf8();
    }

    out
}

/// Compile-time constants substituted into every transformed source file.
///
/// Resolved once per build from the invocation flags and frozen; pipeline
/// stages receive a shared reference and never mutate it. The values become
/// literals in the output, not runtime-configurable state.
#[derive(Debug, Clone)]
pub struct BuildConstants {
    values: BTreeMap<String, String>,
    rewrite_global: bool,
}

impl BuildConstants {
    pub fn for_mode(mode: BuildMode, monitoring: bool) -> Self {
        let mut values = BTreeMap::new();
        values.insert(
            "process.env.NODE_ENV".to_string(),
            format!("\"{}\"", mode.as_str()),
        );
        values.insert("process.env.MONITORING".to_string(), monitoring.to_string());
        // DEBUG controls the verbosity of bundled server-style dependencies
        values.insert(
            "process.env.DEBUG".to_string(),
            matches!(mode, BuildMode::Development).to_string(),
        );

        Self {
            values,
            // The sandbox has no `global`; the page window stands in for it.
            rewrite_global: true,
        }
    }

    #[cfg(test)]
    pub fn empty() -> Self {
        Self {
            values: BTreeMap::new(),
            rewrite_global: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.values.get(key)
    }

    /// Substitute every constant into `code`. Longer keys are replaced first
    /// so a key that prefixes another cannot clobber it.
    pub fn substitute(&self, code: &str) -> String {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort_by_key(|k| std::cmp::Reverse(k.len()));

        let mut result = code.to_string();
        for key in keys {
            result = result.replace(key.as_str(), &self.values[key.as_str()]);
        }

        if self.rewrite_global {
            result = rewrite_global_identifiers(&result);
        }

        result
    }
}
