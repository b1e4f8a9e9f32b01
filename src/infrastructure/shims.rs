use dashmap::DashMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Source text for identifiers mapped to the "empty" sentinel: a stub module
/// with no capabilities.
pub const EMPTY_STUB_SOURCE: &str = "// unavailable in the extension sandbox\n";

/// What a server-side standard-library identifier resolves to inside the
/// browser sandbox.
#[derive(Debug, Clone, PartialEq)]
pub enum ShimTarget {
    /// Exact literal override: a fixed implementation pinned by path, so the
    /// project-local version is used instead of whatever a dependency ships
    Pinned(PathBuf),
    /// Generic browser-compatible substitute module
    Replace(String),
    /// The identifier resolves to a capability-free stub
    Empty,
}

impl ShimTarget {
    fn precedence(&self) -> u8 {
        match self {
            ShimTarget::Pinned(_) => 2,
            ShimTarget::Replace(_) => 1,
            ShimTarget::Empty => 0,
        }
    }
}

/// Mapping from standard-library module identifiers to their browser
/// substitutes. Insertion respects precedence: a literal override is never
/// displaced by a generic substitute, and a substitute never by the empty
/// sentinel.
#[derive(Debug, Clone, Default)]
pub struct ShimMap {
    map: HashMap<String, ShimTarget>,
}

impl ShimMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The default browser substitutes for the extension sandbox: no
    /// filesystem, no raw sockets, no native binary-buffer type.
    pub fn browser_defaults() -> Self {
        let mut shims = Self::new();
        // Dependencies bundle their own buffer; pin the project-local one
        shims.insert("buffer", ShimTarget::Pinned(PathBuf::from("node_modules/buffer")));
        // The prebuilt joi bundle is missing Joi.binary; pin the full lib
        shims.insert(
            "joi",
            ShimTarget::Pinned(PathBuf::from("node_modules/joi/lib/index.js")),
        );
        shims.insert("url", ShimTarget::Replace("iso-url".to_string()));
        shims.insert("stream", ShimTarget::Replace("readable-stream".to_string()));
        // Raw TCP/UDP and DNS ride on the extension socket APIs
        shims.insert("http", ShimTarget::Replace("http-node".to_string()));
        shims.insert("dns", ShimTarget::Replace("http-dns".to_string()));
        shims.insert("dgram", ShimTarget::Replace("chrome-dgram".to_string()));
        shims.insert("net", ShimTarget::Replace("chrome-net".to_string()));
        shims.insert("fs", ShimTarget::Empty);
        shims.insert("tls", ShimTarget::Empty);
        shims.insert("cluster", ShimTarget::Empty);
        shims
    }

    pub fn insert(&mut self, identifier: &str, target: ShimTarget) {
        match self.map.get(identifier) {
            Some(existing) if existing.precedence() > target.precedence() => {}
            _ => {
                self.map.insert(identifier.to_string(), target);
            }
        }
    }

    pub fn get(&self, identifier: &str) -> Option<&ShimTarget> {
        self.map.get(identifier)
    }
}

/// A shim decision for one requested identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedShim {
    /// Load the substitute module from this path
    Module(PathBuf),
    /// Synthesize the capability-free stub
    EmptyStub,
}

/// Resolves module identifiers against the shim map. Resolution is global
/// per build run: the map is read-only and every decision is cached, so
/// resolving the same identifier twice always yields the same substitute,
/// including across concurrently compiling targets.
pub struct ShimResolver {
    map: ShimMap,
    // Resolved paths embed the project root, so the cache is keyed by
    // (root, specifier) and the resolver stays reusable across builds
    cache: DashMap<(PathBuf, String), ResolvedShim>,
}

impl ShimResolver {
    pub fn new(map: ShimMap) -> Self {
        Self {
            map,
            cache: DashMap::new(),
        }
    }

    /// Consult the shim map for `specifier`. `None` means the identifier is
    /// not shimmed and falls through to the normal resolution search path.
    pub fn resolve(&self, specifier: &str, root: &Path) -> Option<ResolvedShim> {
        let key = (root.to_path_buf(), specifier.to_string());
        if let Some(hit) = self.cache.get(&key) {
            return Some(hit.clone());
        }

        let resolved = match self.map.get(specifier)? {
            ShimTarget::Pinned(path) => ResolvedShim::Module(root.join(path)),
            ShimTarget::Replace(substitute) => {
                ResolvedShim::Module(root.join("node_modules").join(substitute))
            }
            ShimTarget::Empty => ResolvedShim::EmptyStub,
        };

        self.cache.insert(key, resolved.clone());
        Some(resolved)
    }
}
