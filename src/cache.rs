//! On-disk snapshot cache.
//!
//! The serialized snapshot is trusted only while it is at least as new
//! as every existing launcher root; anything else (missing file, stale
//! mtime, unreadable JSON) degrades to a fresh scan.

use crate::catalog::CatalogSnapshot;
use log::{debug, warn};
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Load the cached snapshot if it is still fresh for `roots`.
pub fn load_if_fresh(cache_path: &Path, roots: &[PathBuf]) -> Option<CatalogSnapshot> {
    let cache_mtime = fs::metadata(cache_path).ok()?.modified().ok()?;
    if !is_fresh(cache_path, cache_mtime, roots) {
        return None;
    }

    let file = fs::File::open(cache_path).ok()?;
    match serde_json::from_reader(BufReader::new(file)) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            warn!("Discarding unreadable catalog cache {:?}: {}", cache_path, err);
            None
        }
    }
}

fn is_fresh(cache_path: &Path, cache_mtime: SystemTime, roots: &[PathBuf]) -> bool {
    for root in roots {
        // Roots that do not exist yet are cache-neutral; they are
        // still watched so the first install there triggers a rebuild.
        let Ok(mtime) = fs::metadata(root).and_then(|meta| meta.modified()) else {
            continue;
        };
        if mtime > cache_mtime {
            debug!("Cache {:?} is older than {:?}", cache_path, root);
            return false;
        }
    }
    true
}

/// Write the snapshot to `cache_path`, creating parent directories as
/// needed. Failures are logged and otherwise ignored.
pub fn store(cache_path: &Path, snapshot: &CatalogSnapshot) {
    if let Some(parent) = cache_path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    match fs::File::create(cache_path) {
        Ok(file) => {
            if let Err(err) = serde_json::to_writer(file, snapshot) {
                warn!("Could not serialize catalog cache {:?}: {}", cache_path, err);
            }
        }
        Err(err) => {
            warn!("Could not write catalog cache {:?}: {}", cache_path, err);
        }
    }
}
