use crate::core::models::{ChunkGroup, ResolvedModule};
use crate::utils::Result;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// Default minimum number of entry points that must share a module before a
/// non-enforced group may claim it.
pub const DEFAULT_MIN_SHARED: usize = 2;

/// Where one module ended up after policy evaluation.
#[derive(Debug, Clone, Default)]
pub struct ModuleAssignment {
    /// Named chunk that claimed the module, if any
    pub chunk: Option<String>,
    /// Entries excluded from the claiming group; they keep a private copy
    pub private_entries: BTreeSet<String>,
}

/// The chunking decision for one target: every module reachable from at
/// least one entry is assigned to exactly one chunk (a named group's chunk,
/// or per-entry duplication).
#[derive(Debug, Default)]
pub struct ChunkPlan {
    assignments: BTreeMap<String, ModuleAssignment>,
    chunk_order: Vec<String>,
}

impl ChunkPlan {
    /// Named chunks in policy-priority order.
    pub fn chunk_names(&self) -> &[String] {
        &self.chunk_order
    }

    /// Modules claimed by the named chunk, in the order of the supplied
    /// slice.
    pub fn chunk_modules<'a>(
        &'a self,
        chunk: &'a str,
        modules: &'a [ResolvedModule],
    ) -> impl Iterator<Item = &'a ResolvedModule> {
        modules.iter().filter(move |m| {
            self.assignments
                .get(&module_key(m))
                .and_then(|a| a.chunk.as_deref())
                == Some(chunk)
        })
    }

    /// Modules that belong in an entry's own bundle: everything the entry
    /// reaches that no chunk claimed, plus private copies where the entry
    /// was excluded from the claiming group.
    pub fn entry_modules<'a>(
        &'a self,
        entry: &'a str,
        modules: &'a [ResolvedModule],
    ) -> impl Iterator<Item = &'a ResolvedModule> {
        modules.iter().filter(move |m| {
            if !m.entries.contains(entry) {
                return false;
            }
            match self.assignments.get(&module_key(m)) {
                Some(assignment) if assignment.chunk.is_some() => {
                    assignment.private_entries.contains(entry)
                }
                _ => true,
            }
        })
    }

    pub fn assignment(&self, key: &str) -> Option<&ModuleAssignment> {
        self.assignments.get(key)
    }
}

fn module_key(module: &ResolvedModule) -> String {
    module.info.path.to_string_lossy().to_string()
}

/// Evaluates named chunk-policy groups over a target's module graph. The
/// bundler-default automatic grouping is disabled; only declared groups run,
/// in descending priority, and at most one group claims any module.
pub struct ChunkSplitter {
    groups: Vec<(ChunkGroup, Option<Regex>)>,
}

impl ChunkSplitter {
    pub fn new(groups: &[ChunkGroup]) -> Result<Self> {
        let mut ordered: Vec<ChunkGroup> = groups.to_vec();
        // Stable sort keeps declaration order among equal priorities
        ordered.sort_by_key(|g| std::cmp::Reverse(g.priority));

        let groups = ordered
            .into_iter()
            .map(|g| {
                let test = g.test.as_deref().map(Regex::new).transpose()?;
                Ok((g, test))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { groups })
    }

    pub fn split(&self, modules: &[ResolvedModule]) -> ChunkPlan {
        let mut plan = ChunkPlan::default();

        for (group, _) in &self.groups {
            if !plan.chunk_order.contains(&group.name) {
                plan.chunk_order.push(group.name.clone());
            }
        }

        for module in modules {
            let key = module_key(module);
            let mut assignment = ModuleAssignment::default();

            for (group, test) in &self.groups {
                if let Some(test) = test {
                    if !test.is_match(&key) {
                        continue;
                    }
                }

                let eligible: BTreeSet<String> = module
                    .entries
                    .iter()
                    .filter(|e| !group.exclude_entries.contains(e))
                    .cloned()
                    .collect();
                if eligible.is_empty() || eligible.len() < group.min_entries {
                    continue;
                }
                // `enforce` bypasses only the default shared-usage threshold,
                // never the group's own explicit gate above
                if !group.enforce && eligible.len() < DEFAULT_MIN_SHARED {
                    continue;
                }

                assignment.chunk = Some(group.name.clone());
                assignment.private_entries = module
                    .entries
                    .iter()
                    .filter(|e| group.exclude_entries.contains(e))
                    .cloned()
                    .collect();
                break;
            }

            plan.assignments.insert(key, assignment);
        }

        // Drop named chunks that claimed nothing
        let claimed: BTreeSet<&String> = plan
            .assignments
            .values()
            .filter_map(|a| a.chunk.as_ref())
            .collect();
        plan.chunk_order.retain(|name| claimed.contains(name));

        plan
    }
}
