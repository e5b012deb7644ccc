use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("no public key configured; set auth.public_key_path or auth.public_key_pem")]
    Missing,

    #[error("failed to read public key from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid RS256 public key: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Resolve the PEM text of the relying side's public key.
///
/// A configured path wins over inline PEM content and must be readable.
/// Inline content may carry literal `\n` sequences, as single-line
/// environment variables usually do.
pub fn resolve_public_key_pem(path: Option<&Path>, pem: Option<&str>) -> Result<String, KeyError> {
    if let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) {
        return std::fs::read_to_string(path).map_err(|source| KeyError::Read {
            path: path.to_path_buf(),
            source,
        });
    }

    match pem.map(str::trim).filter(|p| !p.is_empty()) {
        Some(pem) => Ok(pem.replace("\\n", "\n")),
        None => Err(KeyError::Missing),
    }
}
