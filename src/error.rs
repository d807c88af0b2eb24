//! Error types for nook-apps

/// Catalog errors.
///
/// None of these are fatal to the embedding shell: a root that cannot be
/// read is skipped, a descriptor that cannot be parsed is skipped, and a
/// root that cannot be watched simply does not auto-refresh. The worst
/// outcome is an empty or stale snapshot, which is always usable.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no [Desktop Entry] section")]
    MissingSection,

    #[error("not an application entry (Type={0})")]
    NotAnApplication(String),

    #[error("entry has neither Name nor Exec")]
    MissingFields,

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}
