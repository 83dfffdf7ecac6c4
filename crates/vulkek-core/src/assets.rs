// SPDX-License-Identifier: CEPL-1.0
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Reads a whole binary asset (shader bytecode, etc.) into memory.
pub fn read_binary(path: impl AsRef<Path>) -> Result<Vec<u8>, AssetError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| AssetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}
