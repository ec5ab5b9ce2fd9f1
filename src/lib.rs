//! Translation catalog for the coaching site.
//!
//! Copy lives in one nested JSON document per locale. Keys are dotted paths
//! (`"about.hero.title"`); a lookup that misses in the requested locale is
//! retried in the default locale (`en`) and finally degrades to a caller
//! fallback or the key itself, so rendering never fails on missing copy.
//!
//! ```no_run
//! use coach_i18n::{LocaleCatalog, Translator};
//!
//! let catalog = LocaleCatalog::bundled()?;
//! let tr = Translator::new(&catalog, "bg");
//! assert_eq!(tr.t("nav.home"), "Начало");
//! # Ok::<(), coach_i18n::CatalogError>(())
//! ```

pub mod audit;
pub mod catalog;
pub mod config;
pub mod fuzzy_matcher;
pub mod session;
pub mod translator;

pub use catalog::{CatalogError, LocaleCatalog, TranslationNode, TranslationTree, DEFAULT_LOCALE};
pub use session::{ConfigPreferenceStore, LocaleSession, MemoryPreferenceStore, PreferenceStore, SessionError};
pub use translator::{resolve, ResolveOptions, Resolved, Translator};
