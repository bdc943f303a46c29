use thiserror::Error;

/// Everything that can go wrong for a single plugin during a check or apply pass.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("missing @{tag} in {file}")]
    MissingMetadata { file: String, tag: &'static str },

    #[error("cannot compare versions: {0}")]
    Comparison(#[from] VersionError),

    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("'{0}' is not a dotted integer version")]
    Malformed(String),

    #[error("'{left}' and '{right}' have different segment counts")]
    SegmentMismatch { left: String, right: String },
}

/// Fatal startup condition: no plugins folder could be established.
#[derive(Debug, Error)]
#[error("a plugins folder is required to continue")]
pub struct ConfigMissing;
