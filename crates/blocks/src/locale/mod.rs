//! Interface string translation.
//!
//! Translations are imported from gettext `.po` catalogs into an in-memory
//! cache. Lookups fall back to the source string, so an empty service
//! renders the built-in English strings.

mod po_parser;

use std::path::Path;

use anyhow::{Context, Result};
use dashmap::DashMap;
use tracing::{info, warn};

pub use po_parser::{PoEntry, parse_po};

/// Locale translation service.
#[derive(Default)]
pub struct LocaleService {
    /// Translation cache: key = "language\0context\0source" → translation.
    cache: DashMap<String, String>,
}

impl LocaleService {
    /// Create an empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate a source string.
    ///
    /// Tries the exact context first, then the empty context, then falls
    /// back to the source string.
    pub fn translate(&self, source: &str, context: &str, language: &str) -> String {
        if let Some(translation) = self.cache.get(&cache_key(language, context, source)) {
            return translation.clone();
        }

        if !context.is_empty()
            && let Some(translation) = self.cache.get(&cache_key(language, "", source))
        {
            return translation.clone();
        }

        source.to_string()
    }

    /// Insert parsed entries for a language. Returns the number imported.
    pub fn import(&self, language: &str, entries: &[PoEntry]) -> usize {
        for entry in entries {
            self.cache.insert(
                cache_key(language, &entry.context, &entry.source),
                entry.translation.clone(),
            );
        }
        entries.len()
    }

    /// Import one `.po` file for a language.
    pub fn load_po_file(&self, language: &str, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        let count = self.import(language, &parse_po(&content));
        info!(language = %language, count, path = %path.display(), "loaded translations");
        Ok(count)
    }

    /// Import every `{language}.po` file in a directory.
    ///
    /// Returns the number of catalogs loaded. Unreadable files are skipped
    /// with a warning.
    pub fn load_dir(&self, dir: &Path) -> Result<usize> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("failed to read locale directory {}", dir.display()))?;

        let mut loaded = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("po") {
                continue;
            }
            let Some(language) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match self.load_po_file(language, &path) {
                Ok(_) => loaded += 1,
                Err(e) => warn!(error = %e, path = %path.display(), "skipping catalog"),
            }
        }
        Ok(loaded)
    }

    /// Number of cached translations across all languages.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl std::fmt::Debug for LocaleService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocaleService")
            .field("cache_size", &self.cache.len())
            .finish()
    }
}

/// Build a cache key from language, context, and source.
///
/// The null byte separator keeps "12:00" style sources from colliding with
/// context/source pairs.
fn cache_key(language: &str, context: &str, source: &str) -> String {
    format!("{language}\0{context}\0{source}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn entry(context: &str, source: &str, translation: &str) -> PoEntry {
        PoEntry {
            context: context.to_string(),
            source: source.to_string(),
            translation: translation.to_string(),
        }
    }

    #[test]
    fn falls_back_to_source() {
        let locale = LocaleService::new();
        assert_eq!(locale.translate("(Untitled)", "", "fr"), "(Untitled)");
    }

    #[test]
    fn translates_by_language() {
        let locale = LocaleService::new();
        locale.import("fr", &[entry("", "(Untitled)", "(Sans titre)")]);
        assert_eq!(locale.translate("(Untitled)", "", "fr"), "(Sans titre)");
        assert_eq!(locale.translate("(Untitled)", "", "de"), "(Untitled)");
    }

    #[test]
    fn context_falls_back_to_empty_context() {
        let locale = LocaleService::new();
        locale.import("fr", &[entry("", "Save", "Enregistrer")]);
        assert_eq!(locale.translate("Save", "form", "fr"), "Enregistrer");
    }

    #[test]
    fn cache_keys_do_not_collide() {
        assert_ne!(cache_key("en", "", "12:00"), cache_key("en", "12", "00"));
    }

    #[test]
    fn loads_catalog_directory() {
        let dir = std::env::temp_dir().join(format!("wds-locale-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("es.po"), "msgid \"(Untitled)\"\nmsgstr \"(Sin título)\"\n").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let locale = LocaleService::new();
        assert_eq!(locale.load_dir(&dir).unwrap(), 1);
        assert_eq!(locale.translate("(Untitled)", "", "es"), "(Sin título)");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_directory_is_an_error() {
        let locale = LocaleService::new();
        assert!(locale.load_dir(Path::new("/nonexistent/wds-locale")).is_err());
    }
}
