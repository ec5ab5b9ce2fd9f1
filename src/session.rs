use anyhow::Result;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::catalog::LocaleCatalog;
use crate::config::Config;
use crate::translator::Translator;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown locale '{requested}' (available: {available})")]
    UnknownLocale { requested: String, available: String },
}

/// Durable storage for the user's chosen locale.
pub trait PreferenceStore {
    fn load(&self) -> Result<Option<String>>;
    fn save(&mut self, locale: &str) -> Result<()>;
}

/// Keeps the preference in the `[i18n] language` entry of the config file.
pub struct ConfigPreferenceStore {
    config: Config,
    path: PathBuf,
}

impl ConfigPreferenceStore {
    pub fn new(config: Config, path: PathBuf) -> Self {
        Self { config, path }
    }
}

impl PreferenceStore for ConfigPreferenceStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.config.get_effective_language())
    }

    fn save(&mut self, locale: &str) -> Result<()> {
        self.config.i18n.language = locale.to_string();
        self.config.save_to(&self.path)
    }
}

/// In-process store, mostly for tests and embedding. Counts writes.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    value: Option<String>,
    writes: usize,
}

impl MemoryPreferenceStore {
    pub fn with_value(value: &str) -> Self {
        Self {
            value: Some(value.to_string()),
            writes: 0,
        }
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.value.clone())
    }

    fn save(&mut self, locale: &str) -> Result<()> {
        self.value = Some(locale.to_string());
        self.writes += 1;
        Ok(())
    }
}

/// Per-user locale state on top of a shared catalog.
pub struct LocaleSession<'a, S: PreferenceStore> {
    catalog: &'a LocaleCatalog,
    store: S,
    current: String,
    // stored preference mapped onto the catalog; differs from `current` under an override
    persisted: Option<String>,
}

impl<'a, S: PreferenceStore> LocaleSession<'a, S> {
    /// Pick the starting locale: `override_tag`, then the stored preference,
    /// then the catalog default. Tags that map to no catalog locale are skipped.
    pub fn open(catalog: &'a LocaleCatalog, store: S, override_tag: Option<&str>) -> Result<Self> {
        let stored = store.load()?;
        let persisted = stored.as_deref().and_then(|tag| catalog.match_locale(tag));
        let current = override_tag
            .and_then(|tag| catalog.match_locale(tag))
            .or(persisted)
            .unwrap_or_else(|| catalog.default_locale())
            .to_string();

        Ok(Self {
            catalog,
            store,
            current,
            persisted: persisted.map(str::to_string),
        })
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn translator(&self) -> Translator<'_> {
        Translator::new(self.catalog, &self.current)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Switch to `tag` and persist it. Returns `false` without writing when
    /// the session is already on that locale and it is the stored one.
    pub fn switch_locale(&mut self, tag: &str) -> Result<bool> {
        let locale = match self.catalog.match_locale(tag) {
            Some(locale) => locale,
            None => {
                return Err(SessionError::UnknownLocale {
                    requested: tag.to_string(),
                    available: self.catalog.locales().collect::<Vec<_>>().join(", "),
                }
                .into())
            }
        };
        if locale == self.current && self.persisted.as_deref() == Some(locale) {
            return Ok(false);
        }

        self.store.save(locale)?;
        info!(from = %self.current, to = locale, "locale switched");
        self.current = locale.to_string();
        self.persisted = Some(locale.to_string());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> LocaleCatalog {
        LocaleCatalog::bundled().unwrap()
    }

    #[test]
    fn starts_at_default_without_preference() {
        let catalog = catalog();
        let session = LocaleSession::open(&catalog, MemoryPreferenceStore::default(), None).unwrap();
        assert_eq!(session.current(), "en");
        assert_eq!(session.store().writes(), 0);
    }

    #[test]
    fn starts_from_stored_preference() {
        let catalog = catalog();
        let session = LocaleSession::open(&catalog, MemoryPreferenceStore::with_value("bg_BG.UTF-8"), None).unwrap();
        assert_eq!(session.current(), "bg");
        assert_eq!(session.translator().t("nav.home"), "Начало");
    }

    #[test]
    fn override_beats_preference_and_unknown_tags_are_skipped() {
        let catalog = catalog();
        let session = LocaleSession::open(&catalog, MemoryPreferenceStore::with_value("bg"), Some("en-GB")).unwrap();
        assert_eq!(session.current(), "en");

        let session = LocaleSession::open(&catalog, MemoryPreferenceStore::with_value("bg"), Some("fr")).unwrap();
        assert_eq!(session.current(), "bg");

        let session = LocaleSession::open(&catalog, MemoryPreferenceStore::with_value("de"), None).unwrap();
        assert_eq!(session.current(), "en");
    }

    #[test]
    fn switch_persists_and_same_locale_is_noop() {
        let catalog = catalog();
        let mut session = LocaleSession::open(&catalog, MemoryPreferenceStore::default(), None).unwrap();

        assert!(session.switch_locale("bg").unwrap());
        assert_eq!(session.current(), "bg");
        assert_eq!(session.store().writes(), 1);

        assert!(!session.switch_locale("bg").unwrap());
        assert!(!session.switch_locale("bg-BG").unwrap());
        assert_eq!(session.store().writes(), 1);

        assert!(session.switch_locale("en").unwrap());
        assert_eq!(session.store().load().unwrap().as_deref(), Some("en"));
        assert_eq!(session.store().writes(), 2);
    }

    #[test]
    fn switch_to_overridden_locale_still_persists() {
        let catalog = catalog();
        let mut session = LocaleSession::open(&catalog, MemoryPreferenceStore::with_value("en"), Some("bg")).unwrap();
        assert_eq!(session.current(), "bg");

        assert!(session.switch_locale("bg").unwrap());
        assert_eq!(session.store().load().unwrap().as_deref(), Some("bg"));
        assert_eq!(session.store().writes(), 1);

        assert!(!session.switch_locale("bg").unwrap());
        assert_eq!(session.store().writes(), 1);
    }

    #[test]
    fn unknown_locale_is_rejected_without_write() {
        let catalog = catalog();
        let mut session = LocaleSession::open(&catalog, MemoryPreferenceStore::default(), None).unwrap();

        let err = session.switch_locale("fr").unwrap_err();
        match err.downcast_ref::<SessionError>() {
            Some(SessionError::UnknownLocale { requested, available }) => {
                assert_eq!(requested, "fr");
                assert_eq!(available, "bg, en");
            }
            None => panic!("unexpected error: {err}"),
        }
        assert_eq!(session.current(), "en");
        assert_eq!(session.store().writes(), 0);
    }

    #[test]
    fn config_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::load_from(&path).unwrap();
        config.i18n.language = "en".to_string();

        let catalog = catalog();
        let store = ConfigPreferenceStore::new(config, path.clone());
        let mut session = LocaleSession::open(&catalog, store, None).unwrap();
        assert!(session.switch_locale("bg").unwrap());

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.i18n.language, "bg");

        let store = ConfigPreferenceStore::new(reloaded, path);
        let session = LocaleSession::open(&catalog, store, None).unwrap();
        assert_eq!(session.current(), "bg");
    }
}
