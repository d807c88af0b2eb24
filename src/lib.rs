//! nook-apps: Application launcher catalog for netbook-class shells.
//!
//! Provides:
//! - Desktop-entry scanning into an immutable, categorized snapshot
//! - Last-write-wins layering across system and user roots
//! - A filesystem monitor that debounces change bursts and republishes
//! - An on-disk snapshot cache for fast startup
//!
//! Icon resolution and process launching are deliberately left to the
//! embedding shell; the catalog only hands out `icon_name` and `exec`
//! hints.

mod cache;
mod catalog;
mod desktop_entry;
mod error;
mod monitor;
mod paths;

pub use catalog::{
    AppCatalog, CatalogEvent, CatalogSnapshot, Category, FALLBACK_CATEGORY_KEY, ObserverId,
    build_snapshot,
};
pub use desktop_entry::{DesktopApp, current_locale, parse_desktop_file};
pub use error::CatalogError;
pub use monitor::{CatalogMonitor, DEFAULT_DEBOUNCE, MonitorState};
pub use paths::{default_application_roots, snapshot_cache_path};
