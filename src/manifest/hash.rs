// src/manifest/hash.rs

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;
use crate::manifest::Manifest;
use crate::project::path_utils::relative_str;

/// Compute the hash of a single file.
///
/// The file is streamed through the hasher in fixed-size chunks, so memory
/// use does not grow with file size.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("reading file for hashing: {:?}", path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Hash every file in `files` and key the digests by their path relative to
/// `root`.
///
/// Files that cannot be read (vanished, permission denied) or that do not
/// live under `root` are skipped: a partial manifest is still a valid one.
pub fn build_manifest(fs: &dyn FileSystem, files: &[PathBuf], root: &Path) -> Manifest {
    let mut manifest = Manifest::new();

    for path in files {
        let Some(rel) = relative_str(root, path) else {
            debug!(?path, ?root, "skipping file outside manifest root");
            continue;
        };
        if rel.is_empty() {
            continue;
        }

        match compute_file_hash(fs, path) {
            Ok(hash) => manifest.insert(rel, hash),
            Err(err) => debug!(?path, error = %err, "skipping unreadable file"),
        }
    }

    debug!(files = manifest.len(), hash = %manifest.aggregate_hash(), "built manifest");
    manifest
}
