use crate::core::models::BuildTarget;
use crate::utils::{KilnError, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Orders target compilation so every target runs after all targets it
/// depends on. Targets with no dependency relation land in the same level
/// and may compile concurrently.
pub struct TargetGraph;

impl TargetGraph {
    /// Produce topological levels over the declared targets, or fail with
    /// `CyclicDependency` before any compilation starts.
    ///
    /// Also validates that every embedded artifact reference names a target
    /// in the embedder's dependency list; an embed outside the declared
    /// dependencies would race the compilation order.
    pub fn resolve(targets: &[BuildTarget]) -> Result<Vec<Vec<String>>> {
        let known: BTreeSet<&str> = targets.iter().map(|t| t.name.as_str()).collect();

        for target in targets {
            for dep in &target.depends_on {
                if !known.contains(dep.as_str()) {
                    return Err(KilnError::config(format!(
                        "target '{}' depends on unknown target '{}'",
                        target.name, dep
                    )));
                }
            }
            for entry in &target.entries {
                if let Some(embed) = &entry.embed {
                    if !target.depends_on.contains(&embed.target) {
                        return Err(KilnError::config(format!(
                            "entry '{}' of target '{}' embeds '{}' which is not \
                             in its dependency list",
                            entry.name, target.name, embed.target
                        )));
                    }
                }
            }
        }

        let mut remaining: BTreeMap<&str, BTreeSet<&str>> = targets
            .iter()
            .map(|t| {
                (
                    t.name.as_str(),
                    t.depends_on.iter().map(|d| d.as_str()).collect(),
                )
            })
            .collect();

        let mut levels = Vec::new();
        while !remaining.is_empty() {
            let ready: Vec<String> = remaining
                .iter()
                .filter(|(_, deps)| deps.is_empty())
                .map(|(name, _)| name.to_string())
                .collect();

            if ready.is_empty() {
                let cycle: Vec<&str> = remaining.keys().copied().collect();
                return Err(KilnError::CyclicDependency(cycle.join(", ")));
            }

            for name in &ready {
                remaining.remove(name.as_str());
            }
            for deps in remaining.values_mut() {
                for name in &ready {
                    deps.remove(name.as_str());
                }
            }
            levels.push(ready);
        }

        Ok(levels)
    }

    /// Flattened compilation order, dependency-first.
    pub fn flatten(levels: &[Vec<String>]) -> Vec<String> {
        levels.iter().flatten().cloned().collect()
    }
}
