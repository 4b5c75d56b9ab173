//! Localized UI strings.
//!
//! Language files are JSON objects placed in one directory. Each carries a
//! `language_name` used for the language menu; the remaining keys are either
//! top-level strings or sections of strings:
//!
//! ```json
//! { "language_name": "English", "app_title": "Stinger Chroma Remover",
//!   "help": { "crf_title": "CRF", "crf_msg": "Lower is better quality." } }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::AppError;

/// Read-only string lookup. Missing entries never fail.
pub trait Localize {
    fn lookup(&self, section: &str, field: Option<&str>) -> Option<String>;

    fn get_or(&self, section: &str, field: Option<&str>, default: &str) -> String {
        self.lookup(section, field).unwrap_or_else(|| default.to_string())
    }

    fn get_string(&self, section: &str, field: Option<&str>) -> String {
        self.get_or(section, field, "")
    }
}

pub struct LanguageCatalog {
    dir: PathBuf,
    /// language name -> file name
    available: BTreeMap<String, String>,
    current_name: String,
    current: Value,
}

impl LanguageCatalog {
    /// Scans `dir` and loads the first language by name.
    pub fn scan(dir: &Path) -> Result<Self, AppError> {
        let entries = fs::read_dir(dir).map_err(|e| {
            AppError::Localization(format!("cannot read {}: {}", dir.display(), e))
        })?;

        let mut available = BTreeMap::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().to_string();
            match read_json(&path) {
                Ok(data) => {
                    let name = data
                        .get("language_name")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| file_name.clone());
                    available.insert(name, file_name);
                }
                Err(e) => log::warn!("Could not parse {}: {}", file_name, e),
            }
        }

        let Some(first) = available.keys().next().cloned() else {
            return Err(AppError::Localization(format!(
                "no language files found in {}",
                dir.display()
            )));
        };

        let mut catalog = Self {
            dir: dir.to_path_buf(),
            available,
            current_name: String::new(),
            current: Value::Null,
        };
        if !catalog.load_language(&first) {
            return Err(AppError::Localization(format!("failed to load {}", first)));
        }
        Ok(catalog)
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.available.keys().map(String::as_str)
    }

    pub fn current_language(&self) -> &str {
        &self.current_name
    }

    /// Switches language; returns `false` and keeps the current one on failure.
    pub fn load_language(&mut self, name: &str) -> bool {
        let Some(file_name) = self.available.get(name) else {
            log::warn!("Unknown language: {}", name);
            return false;
        };
        match read_json(&self.dir.join(file_name)) {
            Ok(data) => {
                self.current = data;
                self.current_name = name.to_string();
                log::info!("Loaded language: {}", name);
                true
            }
            Err(e) => {
                log::error!("Failed to load language {}: {}", name, e);
                false
            }
        }
    }
}

impl Localize for LanguageCatalog {
    fn lookup(&self, section: &str, field: Option<&str>) -> Option<String> {
        let value = self.current.get(section)?;
        let value = match field {
            Some(field) => value.get(field)?,
            None => value,
        };
        value.as_str().map(str::to_string)
    }
}

fn read_json(path: &Path) -> Result<Value, AppError> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| AppError::Localization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_languages(dir: &Path) {
        fs::write(
            dir.join("en.json"),
            r#"{"language_name": "English", "app_title": "Stinger Chroma Remover",
                "help": {"crf_title": "CRF", "crf_msg": "Lower is better"}}"#,
        )
        .unwrap();
        fs::write(
            dir.join("de.json"),
            r#"{"language_name": "Deutsch", "app_title": "Stinger Chroma Entferner"}"#,
        )
        .unwrap();
        fs::write(dir.join("broken.json"), "{ not json").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();
    }

    #[test]
    fn test_scan_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        write_languages(dir.path());

        let mut catalog = LanguageCatalog::scan(dir.path()).unwrap();
        assert_eq!(catalog.languages().collect::<Vec<_>>(), vec!["Deutsch", "English"]);
        assert_eq!(catalog.current_language(), "Deutsch");

        assert!(catalog.load_language("English"));
        assert_eq!(catalog.get_string("app_title", None), "Stinger Chroma Remover");
        assert_eq!(catalog.get_string("help", Some("crf_title")), "CRF");
    }

    #[test]
    fn test_missing_strings_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        write_languages(dir.path());
        let mut catalog = LanguageCatalog::scan(dir.path()).unwrap();
        catalog.load_language("English");

        assert_eq!(catalog.get_string("help", Some("nope")), "");
        assert_eq!(catalog.get_string("nope", None), "");
        assert_eq!(catalog.get_or("cancel_button", None, "Cancel"), "Cancel");
        // A section is not a string
        assert_eq!(catalog.get_string("help", None), "");
    }

    #[test]
    fn test_unknown_language_keeps_current() {
        let dir = tempfile::tempdir().unwrap();
        write_languages(dir.path());
        let mut catalog = LanguageCatalog::scan(dir.path()).unwrap();

        assert!(!catalog.load_language("Klingon"));
        assert_eq!(catalog.current_language(), "Deutsch");
    }

    #[test]
    fn test_empty_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            LanguageCatalog::scan(dir.path()),
            Err(AppError::Localization(_))
        ));
    }
}
