//! Desktop entry parsing.

use crate::error::CatalogError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// One launchable application, parsed from a descriptor file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DesktopApp {
    /// File name with the extension stripped, case preserved.
    /// Unique within one snapshot.
    pub id: String,
    /// Locale-resolved display name. Falls back to `id` when the
    /// descriptor has an Exec but no Name.
    pub name: String,
    /// Command line with field codes (`%f`, `%u`, ...) stripped.
    /// Empty only when the descriptor has a Name but no Exec.
    pub exec: String,
    pub icon_name: Option<String>,
    pub comment: Option<String>,
    /// Category keys as declared, e.g. `["Network", "WebBrowser"]`.
    pub categories: Vec<String>,
    /// NoDisplay or Hidden was set; the catalog drops such entries.
    pub no_display: bool,
    pub source_path: PathBuf,
}

/// Parse a descriptor file into a [`DesktopApp`].
///
/// `locale` is a normalized locale like `de_DE` (see [`current_locale`]).
/// Localized keys are matched `Name[de_DE]` -> `Name[de]` -> `Name`.
pub fn parse_desktop_file(path: &Path, locale: Option<&str>) -> Result<DesktopApp, CatalogError> {
    let content = fs::read_to_string(path)?;
    let mut entries = HashMap::new();
    let mut seen_section = false;
    let mut in_desktop_entry = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            in_desktop_entry = line == "[Desktop Entry]";
            seen_section |= in_desktop_entry;
            continue;
        }

        if in_desktop_entry {
            if let Some((key, value)) = line.split_once('=') {
                entries.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
    }

    if !seen_section {
        return Err(CatalogError::MissingSection);
    }

    // Entries without a Type are treated as applications; only an
    // explicit foreign type (Link, Directory, ...) is rejected.
    if let Some(kind) = entries.get("Type") {
        if kind != "Application" {
            return Err(CatalogError::NotAnApplication(kind.clone()));
        }
    }

    let id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name = locale_string(&entries, "Name", locale);
    let exec = entries.get("Exec").map(|raw| strip_field_codes(raw));

    if name.is_none() && exec.as_deref().is_none_or(str::is_empty) {
        return Err(CatalogError::MissingFields);
    }

    let no_display = flag(&entries, "NoDisplay") || flag(&entries, "Hidden");
    if no_display {
        debug!("{:?} is marked hidden", path);
    }

    Ok(DesktopApp {
        name: name.unwrap_or_else(|| id.clone()),
        id,
        exec: exec.unwrap_or_default(),
        icon_name: entries.get("Icon").cloned(),
        comment: locale_string(&entries, "Comment", locale),
        categories: entries
            .get("Categories")
            .map(|s| s.split(';').filter(|c| !c.is_empty()).map(String::from).collect())
            .unwrap_or_default(),
        no_display,
        source_path: path.to_path_buf(),
    })
}

/// Process locale for localized key lookup, from LC_MESSAGES or LANG
/// with the encoding suffix stripped ("de_DE.UTF-8" -> "de_DE").
pub fn current_locale() -> Option<String> {
    std::env::var("LC_MESSAGES")
        .or_else(|_| std::env::var("LANG"))
        .ok()
        .and_then(|raw| normalize_locale(&raw))
}

fn normalize_locale(raw: &str) -> Option<String> {
    let base = raw.split(['.', '@']).next().unwrap_or("");
    match base {
        "" | "C" | "POSIX" => None,
        _ => Some(base.to_string()),
    }
}

fn locale_string(
    entries: &HashMap<String, String>,
    key: &str,
    locale: Option<&str>,
) -> Option<String> {
    if let Some(locale) = locale {
        if let Some(value) = entries.get(&format!("{key}[{locale}]")) {
            return Some(value.clone());
        }
        if let Some((lang, _)) = locale.split_once('_') {
            if let Some(value) = entries.get(&format!("{key}[{lang}]")) {
                return Some(value.clone());
            }
        }
    }
    entries.get(key).cloned()
}

/// Drop `%`-field codes from an Exec line; argument expansion is the
/// launch collaborator's job.
fn strip_field_codes(raw: &str) -> String {
    raw.split_whitespace()
        .filter(|token| !token.starts_with('%'))
        .collect::<Vec<_>>()
        .join(" ")
}

fn flag(entries: &HashMap<String, String>, key: &str) -> bool {
    entries.get(key).map(|v| v == "true").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_and_parse(file: &str, body: &str, locale: Option<&str>) -> Result<DesktopApp, CatalogError> {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(file);
        fs::write(&path, body).unwrap();
        parse_desktop_file(&path, locale)
    }

    #[test]
    fn test_parse_basic_fields() {
        let app = write_and_parse(
            "gedit.desktop",
            "[Desktop Entry]\n\
             Type=Application\n\
             Name=Text Editor\n\
             Exec=gedit %U\n\
             Icon=accessories-text-editor\n\
             Comment=Edit text files\n\
             Categories=Utility;TextEditor;\n",
            None,
        )
        .unwrap();

        assert_eq!(app.id, "gedit");
        assert_eq!(app.name, "Text Editor");
        assert_eq!(app.exec, "gedit");
        assert_eq!(app.icon_name.as_deref(), Some("accessories-text-editor"));
        assert_eq!(app.comment.as_deref(), Some("Edit text files"));
        assert_eq!(app.categories, vec!["Utility", "TextEditor"]);
        assert!(!app.no_display);
    }

    #[test]
    fn test_id_strips_extension_preserves_case() {
        let app = write_and_parse(
            "MyApp.desktop",
            "[Desktop Entry]\nName=My App\nExec=myapp\n",
            None,
        )
        .unwrap();
        assert_eq!(app.id, "MyApp");
    }

    #[test]
    fn test_locale_exact_match_wins() {
        let app = write_and_parse(
            "ed.desktop",
            "[Desktop Entry]\nName=Editor\nName[de_DE]=Editor (Deutschland)\nName[de]=Editor (Deutsch)\nExec=ed\n",
            Some("de_DE"),
        )
        .unwrap();
        assert_eq!(app.name, "Editor (Deutschland)");
    }

    #[test]
    fn test_locale_language_fallback() {
        let app = write_and_parse(
            "ed.desktop",
            "[Desktop Entry]\nName=Editor\nName[de]=Editor (Deutsch)\nExec=ed\n",
            Some("de_DE"),
        )
        .unwrap();
        assert_eq!(app.name, "Editor (Deutsch)");
    }

    #[test]
    fn test_unlocalized_fallback() {
        let app = write_and_parse(
            "ed.desktop",
            "[Desktop Entry]\nName=Editor\nName[fr]=Editeur\nExec=ed\n",
            Some("de_DE"),
        )
        .unwrap();
        assert_eq!(app.name, "Editor");
    }

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale("de_DE.UTF-8").as_deref(), Some("de_DE"));
        assert_eq!(normalize_locale("en_GB@euro").as_deref(), Some("en_GB"));
        assert_eq!(normalize_locale("C"), None);
        assert_eq!(normalize_locale("POSIX"), None);
        assert_eq!(normalize_locale(""), None);
    }

    #[test]
    fn test_field_codes_stripped_from_exec() {
        let app = write_and_parse(
            "ff.desktop",
            "[Desktop Entry]\nName=Browser\nExec=firefox --new-window %u\n",
            None,
        )
        .unwrap();
        assert_eq!(app.exec, "firefox --new-window");
    }

    #[test]
    fn test_missing_section_rejected() {
        let err = write_and_parse("x.desktop", "Name=X\nExec=x\n", None).unwrap_err();
        assert!(matches!(err, CatalogError::MissingSection));
    }

    #[test]
    fn test_non_application_type_rejected() {
        let err = write_and_parse(
            "x.desktop",
            "[Desktop Entry]\nType=Link\nName=X\nURL=https://example.org\n",
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::NotAnApplication(kind) if kind == "Link"));
    }

    #[test]
    fn test_missing_name_and_exec_rejected() {
        let err = write_and_parse(
            "x.desktop",
            "[Desktop Entry]\nType=Application\nIcon=foo\n",
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::MissingFields));
    }

    #[test]
    fn test_name_only_entry_accepted() {
        let app = write_and_parse("x.desktop", "[Desktop Entry]\nName=X\n", None).unwrap();
        assert_eq!(app.name, "X");
        assert_eq!(app.exec, "");
    }

    #[test]
    fn test_exec_only_entry_falls_back_to_id() {
        let app = write_and_parse("htop.desktop", "[Desktop Entry]\nExec=htop\n", None).unwrap();
        assert_eq!(app.name, "htop");
    }

    #[test]
    fn test_hidden_flags_parsed() {
        let app = write_and_parse(
            "x.desktop",
            "[Desktop Entry]\nName=X\nExec=x\nNoDisplay=true\n",
            None,
        )
        .unwrap();
        assert!(app.no_display);

        let app = write_and_parse(
            "x.desktop",
            "[Desktop Entry]\nName=X\nExec=x\nHidden=true\n",
            None,
        )
        .unwrap();
        assert!(app.no_display);
    }

    #[test]
    fn test_keys_outside_desktop_entry_section_ignored() {
        let app = write_and_parse(
            "x.desktop",
            "# a comment\n\
             [Desktop Entry]\n\
             Name=X\n\
             Exec=x\n\
             \n\
             [Desktop Action new-window]\n\
             Name=New Window\n\
             Exec=x --new-window\n",
            None,
        )
        .unwrap();
        assert_eq!(app.name, "X");
        assert_eq!(app.exec, "x");
    }
}
