use crate::core::models::{ChunkGroup, PipelineRule, TransformChain};

/// Effective per-target pipeline and chunking configuration, produced by
/// merging a target's overrides onto the shared base.
#[derive(Debug, Clone, Default)]
pub struct TargetConfig {
    pub rules: Vec<PipelineRule>,
    pub chunk_groups: Vec<ChunkGroup>,
}

/// Target-specific overrides layered onto the base configuration.
#[derive(Debug, Clone, Default)]
pub struct TargetOverrides {
    /// When set, replaces the base rule list wholesale
    pub rules: Option<Vec<PipelineRule>>,
    /// Collected additively into the base policy, keyed by group name
    pub chunk_groups: Vec<ChunkGroup>,
}

impl TargetConfig {
    /// Merge `overrides` onto this base configuration.
    ///
    /// Override semantics, per field:
    /// - `rules`: array-valued, replaced wholesale when the override sets it;
    ///   base and override chains are never concatenated.
    /// - `chunk_groups`: additive by group name; an override group with the
    ///   same name as a base group wins (last declared).
    pub fn merge(&self, overrides: &TargetOverrides) -> TargetConfig {
        let rules = match &overrides.rules {
            Some(replacement) => replacement.clone(),
            None => self.rules.clone(),
        };

        let mut chunk_groups = self.chunk_groups.clone();
        for group in &overrides.chunk_groups {
            if let Some(existing) = chunk_groups.iter_mut().find(|g| g.name == group.name) {
                *existing = group.clone();
            } else {
                chunk_groups.push(group.clone());
            }
        }

        TargetConfig {
            rules,
            chunk_groups,
        }
    }
}

/// The shared rule list every target starts from, in declaration order.
///
/// Legacy font formats are deliberately excluded from the binary-copy rule
/// and routed to the no-op placeholder instead: every supported runtime
/// accepts WOFF2, so the older formats are never emitted.
pub fn base_rules() -> Vec<PipelineRule> {
    vec![
        PipelineRule {
            name: "stylesheet-extract".to_string(),
            test: r"\.css$".to_string(),
            include: None,
            exclude: None,
            chain: TransformChain::Stylesheet,
        },
        PipelineRule {
            name: "binary-asset".to_string(),
            test: r"\.(png|jpe?g|gif|svg|woff2)$".to_string(),
            include: None,
            exclude: None,
            chain: TransformChain::BinaryAsset,
        },
        PipelineRule {
            name: "legacy-font-ignore".to_string(),
            test: r"\.(otf|eot|ttf|woff)$".to_string(),
            include: None,
            exclude: None,
            chain: TransformChain::IgnoredFont,
        },
        PipelineRule {
            name: "app-script".to_string(),
            test: r"\.js$".to_string(),
            include: None,
            exclude: Some(r"node_modules".to_string()),
            chain: TransformChain::Script,
        },
        PipelineRule {
            name: "server-dependency-script".to_string(),
            test: r"\.js$".to_string(),
            include: Some(r"node_modules[/\\](@hapi|joi)".to_string()),
            exclude: None,
            chain: TransformChain::DependencyScript,
        },
    ]
}

pub fn base_config() -> TargetConfig {
    TargetConfig {
        rules: base_rules(),
        chunk_groups: Vec::new(),
    }
}
