use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::debug;

/// Locale every lookup ultimately falls back to.
pub const DEFAULT_LOCALE: &str = "en";

// Site copy, embedded so the binary works without any files next to it
const BUNDLED: &[(&str, &str)] = &[
    ("en", include_str!("../assets/locales/en.json")),
    ("bg", include_str!("../assets/locales/bg.json")),
];

static EMPTY_TREE: TranslationTree = TranslationTree {
    entries: BTreeMap::new(),
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog has no translations for default locale '{0}'")]
    MissingDefaultLocale(String),
    #[error("locale '{0}' is defined more than once")]
    DuplicateLocale(String),
    #[error("invalid JSON for locale '{locale}': {source}")]
    Parse {
        locale: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed translations for locale '{locale}' at '{path}': {reason}")]
    Malformed {
        locale: String,
        path: String,
        reason: String,
    },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A value inside a translation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TranslationNode {
    Text(String),
    List(Vec<String>),
    Tree(TranslationTree),
}

impl TranslationNode {
    pub fn is_leaf(&self) -> bool {
        !matches!(self, TranslationNode::Tree(_))
    }
}

/// Nested key -> value mapping holding the copy of one locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TranslationTree {
    entries: BTreeMap<String, TranslationNode>,
}

impl TranslationTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, node: TranslationNode) -> Option<TranslationNode> {
        self.entries.insert(key.into(), node)
    }

    pub fn get(&self, key: &str) -> Option<&TranslationNode> {
        self.entries.get(key)
    }

    /// Walk nested trees segment by segment.
    ///
    /// Returns `None` as soon as a segment is missing or the walk reaches a
    /// leaf while segments remain.
    pub fn get_path<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Option<&TranslationNode> {
        let mut segments = segments.into_iter();
        let mut node = self.get(segments.next()?)?;
        for segment in segments {
            match node {
                TranslationNode::Tree(tree) => node = tree.get(segment)?,
                _ => return None,
            }
        }
        Some(node)
    }

    /// Every dotted key path ending at a text or list leaf, sorted.
    pub fn leaves(&self) -> Vec<(String, &TranslationNode)> {
        let mut out = Vec::new();
        collect_leaves(self, "", &mut out);
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    pub fn leaf_keys(&self) -> Vec<String> {
        self.leaves().into_iter().map(|(key, _)| key).collect()
    }

    fn from_json(locale: &str, value: Value) -> Result<Self, CatalogError> {
        match value {
            Value::Object(map) => {
                let mut tree = TranslationTree::new();
                for (key, value) in map {
                    let node = node_from_json(locale, &key, value)?;
                    tree.insert(key, node);
                }
                Ok(tree)
            }
            other => Err(malformed(locale, "<root>", format!("expected an object, found {}", kind_name(&other)))),
        }
    }
}

fn collect_leaves<'t>(tree: &'t TranslationTree, prefix: &str, out: &mut Vec<(String, &'t TranslationNode)>) {
    for (key, node) in &tree.entries {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match node {
            TranslationNode::Tree(child) => collect_leaves(child, &path, out),
            leaf => out.push((path, leaf)),
        }
    }
}

fn node_from_json(locale: &str, path: &str, value: Value) -> Result<TranslationNode, CatalogError> {
    match value {
        Value::String(s) => Ok(TranslationNode::Text(s)),
        Value::Array(items) => {
            let mut list = Vec::with_capacity(items.len());
            for (idx, item) in items.into_iter().enumerate() {
                match item {
                    Value::String(s) => list.push(s),
                    other => {
                        return Err(malformed(
                            locale,
                            &format!("{}[{}]", path, idx),
                            format!("list items must be strings, found {}", kind_name(&other)),
                        ))
                    }
                }
            }
            Ok(TranslationNode::List(list))
        }
        Value::Object(map) => {
            let mut tree = TranslationTree::new();
            for (key, value) in map {
                let child = node_from_json(locale, &format!("{}.{}", path, key), value)?;
                tree.insert(key, child);
            }
            Ok(TranslationNode::Tree(tree))
        }
        other => Err(malformed(
            locale,
            path,
            format!("expected a string, list or object, found {}", kind_name(&other)),
        )),
    }
}

fn malformed(locale: &str, path: &str, reason: String) -> CatalogError {
    CatalogError::Malformed {
        locale: locale.to_string(),
        path: path.to_string(),
        reason,
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// All translation trees, keyed by locale code. Immutable once built.
#[derive(Debug, Clone)]
pub struct LocaleCatalog {
    default_locale: String,
    trees: BTreeMap<String, TranslationTree>,
}

impl LocaleCatalog {
    pub fn from_trees<I>(default_locale: &str, trees: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (String, TranslationTree)>,
    {
        let mut map = BTreeMap::new();
        for (locale, tree) in trees {
            match map.entry(locale) {
                Entry::Occupied(e) => return Err(CatalogError::DuplicateLocale(e.key().clone())),
                Entry::Vacant(e) => {
                    e.insert(tree);
                }
            }
        }
        if !map.contains_key(default_locale) {
            return Err(CatalogError::MissingDefaultLocale(default_locale.to_string()));
        }

        for (locale, tree) in &map {
            debug!(locale = %locale, keys = tree.leaves().len(), "loaded translations");
        }

        Ok(Self {
            default_locale: default_locale.to_string(),
            trees: map,
        })
    }

    /// Parse `(locale, json)` documents.
    pub fn from_documents<'d, I>(default_locale: &str, documents: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (&'d str, &'d str)>,
    {
        let mut trees = Vec::new();
        for (locale, text) in documents {
            let value: Value = serde_json::from_str(text).map_err(|source| CatalogError::Parse {
                locale: locale.to_string(),
                source,
            })?;
            trees.push((locale.to_string(), TranslationTree::from_json(locale, value)?));
        }
        Self::from_trees(default_locale, trees)
    }

    /// The site's own English and Bulgarian copy.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::bundled_with_default(DEFAULT_LOCALE)
    }

    /// The bundled copy with another fallback locale, e.g. `bg` from config.
    pub fn bundled_with_default(default_locale: &str) -> Result<Self, CatalogError> {
        Self::from_documents(default_locale, BUNDLED.iter().copied())
    }

    /// Load every `<locale>.json` file of a directory.
    pub fn load_dir(dir: &Path, default_locale: &str) -> Result<Self, CatalogError> {
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| CatalogError::Io { path, source }
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(io_err(dir))? {
            let path = entry.map_err(io_err(dir))?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            if let Some(locale) = path.file_stem().and_then(|s| s.to_str()) {
                files.push((locale.to_string(), path.clone()));
            }
        }
        files.sort();

        let mut documents = Vec::with_capacity(files.len());
        for (locale, path) in files {
            let text = fs::read_to_string(&path).map_err(io_err(&path))?;
            documents.push((locale, text));
        }
        Self::from_documents(
            default_locale,
            documents.iter().map(|(locale, text)| (locale.as_str(), text.as_str())),
        )
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn default_tree(&self) -> &TranslationTree {
        self.trees.get(&self.default_locale).unwrap_or(&EMPTY_TREE)
    }

    pub fn tree(&self, locale: &str) -> Option<&TranslationTree> {
        self.trees.get(locale)
    }

    pub fn contains(&self, locale: &str) -> bool {
        self.trees.contains_key(locale)
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.trees.keys().map(String::as_str)
    }

    /// Whether `key` resolves to a leaf in `locale` without any fallback.
    pub fn has_key(&self, locale: &str, key: &str) -> bool {
        self.tree(locale)
            .and_then(|tree| tree.get_path(key.split('.')))
            .map_or(false, TranslationNode::is_leaf)
    }

    /// Map a language tag onto a catalog locale.
    ///
    /// Exact codes win; otherwise the primary language subtag of a BCP 47
    /// or POSIX tag is used (`bg-BG`, `bg_BG.UTF-8` -> `bg`).
    pub fn match_locale(&self, tag: &str) -> Option<&str> {
        let tag = tag.trim();
        if let Some((code, _)) = self.trees.get_key_value(tag) {
            return Some(code);
        }
        let primary = primary_subtag(tag)?;
        self.trees
            .keys()
            .find(|code| code.eq_ignore_ascii_case(&primary))
            .map(String::as_str)
    }
}

fn primary_subtag(tag: &str) -> Option<String> {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let re = TAG.get_or_init(|| {
        Regex::new(r"^([A-Za-z]{2,3})(?:[-_][A-Za-z0-9]{1,8})*(?:\.[A-Za-z0-9_-]+)?(?:@[A-Za-z0-9_-]+)?$")
            .expect("locale tag pattern is valid")
    });
    re.captures(tag).map(|caps| caps[1].to_ascii_lowercase())
}
