//! App catalog implementation.
//!
//! `build_snapshot` is a pure function of on-disk state: it scans the
//! launcher roots in order, deduplicates by entry id (later roots win)
//! and groups the survivors into a fixed category order. `AppCatalog`
//! wraps it with the current-snapshot handoff point and the observer
//! registry that panels hook into.

use crate::cache;
use crate::desktop_entry::{self, DesktopApp};
use crate::paths;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Category order for the published snapshot, keyed by the freedesktop
/// main-category name. Entries declaring none of these land in the
/// trailing "Other" category.
const CATEGORY_TABLE: &[(&str, &str)] = &[
    ("AudioVideo", "Sound & Video"),
    ("Development", "Programming"),
    ("Education", "Education"),
    ("Game", "Games"),
    ("Graphics", "Graphics"),
    ("Network", "Internet"),
    ("Office", "Office"),
    ("Science", "Science"),
    ("Settings", "Settings"),
    ("System", "System Tools"),
    ("Utility", "Accessories"),
];

pub const FALLBACK_CATEGORY_KEY: &str = "Other";

/// Event published to observers after a rebuild. Carries no diff;
/// consumers re-fetch the snapshot.
#[derive(Clone, Debug)]
pub struct CatalogEvent {
    pub reason: String,
}

/// A named group of applications. Entry order is discovery order,
/// never sorted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub key: String,
    pub name: String,
    pub entries: Vec<DesktopApp>,
}

/// Immutable view of the catalog at one point in time. Replaced
/// wholesale on rebuild; holders of an `Arc<CatalogSnapshot>` keep the
/// old view alive for as long as they need it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub categories: Vec<Category>,
}

impl CatalogSnapshot {
    /// Find an application by id. A miss is a normal outcome.
    pub fn lookup(&self, id: &str) -> Option<&DesktopApp> {
        self.categories
            .iter()
            .flat_map(|category| category.entries.iter())
            .find(|app| app.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Scan `roots` into a snapshot.
///
/// Roots are visited in caller order, files within a root in
/// lexicographic order; a missing or unreadable root is skipped, an
/// unparsable file is skipped with a log line. An empty root list is
/// legal and yields an empty snapshot.
pub fn build_snapshot(roots: &[PathBuf]) -> CatalogSnapshot {
    let locale = desktop_entry::current_locale();
    let mut seq = 0u64;
    let mut order: HashMap<String, u64> = HashMap::new();
    let mut apps: HashMap<String, DesktopApp> = HashMap::new();

    for root in roots {
        if !root.is_dir() {
            debug!("Skipping launcher root {:?}: not a readable directory", root);
            continue;
        }

        let walker = walkdir::WalkDir::new(root)
            .follow_links(true)
            .max_depth(1)
            .sort_by_file_name();
        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some("desktop")
            {
                continue;
            }

            match desktop_entry::parse_desktop_file(path, locale.as_deref()) {
                Ok(app) if app.no_display => {
                    debug!("Skipping hidden entry {:?}", path);
                }
                Ok(app) => {
                    // Later occurrences replace earlier ones and take
                    // the later scan position.
                    order.insert(app.id.clone(), seq);
                    seq += 1;
                    apps.insert(app.id.clone(), app);
                }
                Err(err) => {
                    warn!("Skipping {:?}: {}", path, err);
                }
            }
        }
    }

    let snapshot = group_by_category(apps, &order);
    info!(
        "Scanned {} launcher roots into {} categories",
        roots.len(),
        snapshot.categories.len()
    );
    snapshot
}

fn group_by_category(apps: HashMap<String, DesktopApp>, order: &HashMap<String, u64>) -> CatalogSnapshot {
    let mut sorted: Vec<DesktopApp> = apps.into_values().collect();
    sorted.sort_by_key(|app| order[app.id.as_str()]);

    let mut buckets: HashMap<&str, Vec<DesktopApp>> = HashMap::new();
    for app in sorted {
        let declared: Vec<&str> = CATEGORY_TABLE
            .iter()
            .filter(|(key, _)| app.categories.iter().any(|c| c == key))
            .map(|(key, _)| *key)
            .collect();

        if declared.is_empty() {
            buckets.entry(FALLBACK_CATEGORY_KEY).or_default().push(app);
        } else {
            for key in declared {
                buckets.entry(key).or_default().push(app.clone());
            }
        }
    }

    let mut categories = Vec::new();
    for (key, name) in CATEGORY_TABLE {
        if let Some(entries) = buckets.remove(key) {
            categories.push(Category {
                key: key.to_string(),
                name: name.to_string(),
                entries,
            });
        }
    }
    if let Some(entries) = buckets.remove(FALLBACK_CATEGORY_KEY) {
        categories.push(Category {
            key: FALLBACK_CATEGORY_KEY.to_string(),
            name: FALLBACK_CATEGORY_KEY.to_string(),
            entries,
        });
    }

    CatalogSnapshot { categories }
}

/// Stable handle for a registered observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type ObserverFn = Box<dyn Fn(&CatalogEvent) + Send + Sync>;

/// The application catalog.
///
/// The embedding shell constructs one of these (plus a
/// [`crate::CatalogMonitor`] when auto-refresh is wanted) and passes
/// `Arc` handles to its panels; there is no process-wide instance.
pub struct AppCatalog {
    roots: Vec<PathBuf>,
    cache_path: Option<PathBuf>,
    current: RwLock<Arc<CatalogSnapshot>>,
    observers: RwLock<Vec<(ObserverId, ObserverFn)>>,
    next_observer_id: AtomicU64,
}

impl AppCatalog {
    /// Create a catalog over the given roots, with an empty snapshot.
    /// Call [`AppCatalog::refresh`] to populate it.
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            cache_path: None,
            current: RwLock::new(Arc::new(CatalogSnapshot::default())),
            observers: RwLock::new(Vec::new()),
            next_observer_id: AtomicU64::new(0),
        }
    }

    /// Catalog over the standard XDG application directories.
    pub fn with_default_roots() -> Self {
        Self::new(paths::default_application_roots())
    }

    /// Enable the on-disk snapshot cache at `path`.
    pub fn with_cache(mut self, path: PathBuf) -> Self {
        self.cache_path = Some(path);
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Rebuild the snapshot and swap it in.
    ///
    /// When a cache path is configured and the cache file is at least
    /// as new as every existing root, the cached snapshot is loaded
    /// instead of scanning; otherwise a fresh scan runs and rewrites
    /// the cache.
    pub fn refresh(&self) -> Arc<CatalogSnapshot> {
        if let Some(cache_path) = &self.cache_path {
            if let Some(snapshot) = cache::load_if_fresh(cache_path, &self.roots) {
                debug!("Catalog cache hit");
                let snapshot = Arc::new(snapshot);
                *self.current.write().unwrap() = snapshot.clone();
                return snapshot;
            }
            debug!("Catalog cache miss");
        }

        let snapshot = Arc::new(build_snapshot(&self.roots));
        if let Some(cache_path) = &self.cache_path {
            cache::store(cache_path, &snapshot);
        }
        *self.current.write().unwrap() = snapshot.clone();
        snapshot
    }

    /// Rescan (bypassing the cache), swap the snapshot in, and notify
    /// every observer in registration order.
    pub fn rebuild_and_publish(&self, reason: &str) {
        info!("Rebuilding app catalog: {}", reason);
        let snapshot = Arc::new(build_snapshot(&self.roots));
        if let Some(cache_path) = &self.cache_path {
            cache::store(cache_path, &snapshot);
        }
        *self.current.write().unwrap() = snapshot;

        let event = CatalogEvent {
            reason: reason.to_string(),
        };
        let observers = self.observers.read().unwrap();
        for (_, callback) in observers.iter() {
            callback(&event);
        }
    }

    /// The latest published snapshot.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.current.read().unwrap().clone()
    }

    /// Look up an application by id in the latest snapshot.
    pub fn lookup(&self, id: &str) -> Option<DesktopApp> {
        self.current.read().unwrap().lookup(id).cloned()
    }

    /// Register a change observer. Observers run synchronously, in
    /// registration order, on whichever thread publishes.
    pub fn observe<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&CatalogEvent) + Send + Sync + 'static,
    {
        let id = ObserverId(self.next_observer_id.fetch_add(1, Ordering::Relaxed));
        self.observers
            .write()
            .unwrap()
            .push((id, Box::new(callback)));
        id
    }

    /// Remove an observer. Returns false when the id is unknown.
    pub fn unobserve(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write().unwrap();
        let before = observers.len();
        observers.retain(|(observer_id, _)| *observer_id != id);
        observers.len() != before
    }
}
