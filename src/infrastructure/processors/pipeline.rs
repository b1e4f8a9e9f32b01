use crate::core::models::{PipelineRule, TransformChain};
use crate::utils::Result;
use regex::Regex;
use std::path::Path;

/// A pipeline rule with its patterns compiled once per target compilation.
pub struct CompiledRule {
    pub name: String,
    pub chain: TransformChain,
    test: Regex,
    include: Option<Regex>,
    exclude: Option<Regex>,
}

impl CompiledRule {
    fn compile(rule: &PipelineRule) -> Result<Self> {
        Ok(Self {
            name: rule.name.clone(),
            chain: rule.chain,
            test: Regex::new(&rule.test)?,
            include: rule.include.as_deref().map(Regex::new).transpose()?,
            exclude: rule.exclude.as_deref().map(Regex::new).transpose()?,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        if !self.test.is_match(path) {
            return false;
        }
        if let Some(include) = &self.include {
            if !include.is_match(path) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(path) {
                return false;
            }
        }
        true
    }
}

/// Ordered rule list for one target. Rules are evaluated in declaration
/// order and every matching chain applies; a file matched by no rule passes
/// through unmodified.
pub struct Pipeline {
    rules: Vec<CompiledRule>,
}

impl Pipeline {
    pub fn compile(rules: &[PipelineRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn matching(&self, path: &Path) -> Vec<&CompiledRule> {
        let path_str = path.to_string_lossy();
        self.rules
            .iter()
            .filter(|rule| rule.matches(&path_str))
            .collect()
    }
}
