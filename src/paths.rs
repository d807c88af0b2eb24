//! Path helpers for XDG directories and the snapshot cache.

use std::path::PathBuf;

/// Default launcher roots: every XDG data directory's `applications`
/// subdirectory plus the Flatpak and Snap export locations.
///
/// Order matters: roots scanned later override earlier ones on id
/// conflicts, so system directories come first and the user's own
/// data directory comes last. Roots that do not exist yet are still
/// returned; the scanner skips them and the monitor picks up the
/// first install there.
pub fn default_application_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    let home = std::env::var("HOME").unwrap_or_default();

    let xdg_data_dirs = std::env::var("XDG_DATA_DIRS")
        .unwrap_or_else(|_| "/usr/local/share:/usr/share".to_string());
    for data_dir in xdg_data_dirs.split(':') {
        if !data_dir.is_empty() {
            roots.push(PathBuf::from(data_dir).join("applications"));
        }
    }

    roots.push(PathBuf::from("/var/lib/flatpak/exports/share/applications"));
    roots.push(PathBuf::from("/var/lib/snapd/desktop/applications"));
    roots.push(PathBuf::from(&home).join(".local/share/flatpak/exports/share/applications"));

    let xdg_data_home =
        std::env::var("XDG_DATA_HOME").unwrap_or_else(|_| format!("{}/.local/share", home));
    roots.push(PathBuf::from(&xdg_data_home).join("applications"));

    roots
}

/// Cache file for the serialized snapshot, under the user cache
/// directory. None when no cache directory is available (the catalog
/// then always scans).
pub fn snapshot_cache_path() -> Option<PathBuf> {
    Some(dirs::cache_dir()?.join("nook-apps").join("catalog_cache.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Use a mutex to ensure tests that modify env vars don't race
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_user_root_is_scanned_last() {
        let _guard = ENV_LOCK.lock().unwrap();

        unsafe {
            env::set_var("HOME", "/home/me");
            env::set_var("XDG_DATA_DIRS", "/usr/local/share:/usr/share");
            env::set_var("XDG_DATA_HOME", "/home/me/.local/share");
        }

        let roots = default_application_roots();
        assert_eq!(roots.first().unwrap(), &PathBuf::from("/usr/local/share/applications"));
        assert_eq!(
            roots.last().unwrap(),
            &PathBuf::from("/home/me/.local/share/applications")
        );

        unsafe {
            env::remove_var("XDG_DATA_DIRS");
            env::remove_var("XDG_DATA_HOME");
        }
    }

    #[test]
    fn test_empty_data_dir_components_skipped() {
        let _guard = ENV_LOCK.lock().unwrap();

        unsafe {
            env::set_var("HOME", "/home/me");
            env::set_var("XDG_DATA_DIRS", "/usr/share::");
        }

        let roots = default_application_roots();
        assert!(roots.iter().all(|r| r != &PathBuf::from("applications")));

        unsafe {
            env::remove_var("XDG_DATA_DIRS");
        }
    }
}
