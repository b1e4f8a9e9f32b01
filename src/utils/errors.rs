use std::path::PathBuf;
use thiserror::Error;

/// Build-wide error taxonomy. Every variant is fatal: the driver aborts the
/// whole multi-target build on the first error it sees.
#[derive(Error, Debug)]
pub enum KilnError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("transform failed for {path} (rule: {rule}): {message}")]
    Transform {
        path: PathBuf,
        rule: String,
        message: String,
    },

    #[error("cyclic dependency between targets: {0}")]
    CyclicDependency(String),

    #[error("missing artifact: target '{target}' has not produced bundle '{bundle}' yet")]
    MissingArtifact { target: String, bundle: String },

    #[error("asset {path} is {size} bytes, over the {limit} byte packaging limit")]
    AssetTooLarge {
        path: PathBuf,
        size: u64,
        limit: u64,
    },

    #[error("build error: {0}")]
    Build(String),
}

impl KilnError {
    /// Create a transform error carrying the offending file and rule name
    pub fn transform(path: PathBuf, rule: &str, message: String) -> Self {
        Self::Transform {
            path,
            rule: rule.to_string(),
            message,
        }
    }

    /// Create a simple build error
    pub fn build(message: String) -> Self {
        Self::Build(message)
    }

    /// Create a configuration error
    pub fn config(message: String) -> Self {
        Self::Config(message)
    }
}

pub type Result<T> = std::result::Result<T, KilnError>;

impl From<regex::Error> for KilnError {
    fn from(err: regex::Error) -> Self {
        KilnError::config(format!("invalid pattern: {}", err))
    }
}

impl From<anyhow::Error> for KilnError {
    fn from(err: anyhow::Error) -> Self {
        KilnError::build(err.to_string())
    }
}
