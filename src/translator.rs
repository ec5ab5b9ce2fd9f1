use crate::catalog::{LocaleCatalog, TranslationNode, TranslationTree};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Returned instead of the key itself when nothing displayable is found.
    pub fallback: Option<String>,
    /// Allow lists and subtrees to be returned as-is.
    pub return_objects: bool,
}

impl ResolveOptions {
    pub fn fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    pub fn return_objects(mut self, yes: bool) -> Self {
        self.return_objects = yes;
        self
    }
}

/// Outcome of a lookup. `List` and `Tree` only appear when objects were requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<'a> {
    Text(Cow<'a, str>),
    List(&'a [String]),
    Tree(&'a TranslationTree),
}

impl<'a> Resolved<'a> {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Resolved::Text(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&'a [String]> {
        match self {
            Resolved::List(items) => Some(*items),
            _ => None,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            Resolved::Text(s) => s.into_owned(),
            Resolved::List(items) => items.join(", "),
            Resolved::Tree(tree) => serde_json::to_string_pretty(tree).unwrap_or_default(),
        }
    }
}

impl fmt::Display for Resolved<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Text(s) => f.write_str(s),
            other => f.write_str(&other.clone().into_string()),
        }
    }
}

enum Walk<'a> {
    Found(Resolved<'a>),
    // path exists but ends at something the caller did not ask for
    NotDisplayable,
    Missing,
}

fn walk<'a>(tree: &'a TranslationTree, key: &str, return_objects: bool) -> Walk<'a> {
    match tree.get_path(key.split('.')) {
        None => Walk::Missing,
        Some(TranslationNode::Text(s)) => Walk::Found(Resolved::Text(Cow::Borrowed(s))),
        Some(TranslationNode::List(items)) if return_objects => Walk::Found(Resolved::List(items)),
        Some(TranslationNode::Tree(tree)) if return_objects => Walk::Found(Resolved::Tree(tree)),
        Some(_) => Walk::NotDisplayable,
    }
}

fn fallback_value<'a>(key: &str, options: &ResolveOptions) -> Resolved<'a> {
    Resolved::Text(Cow::Owned(options.fallback.clone().unwrap_or_else(|| key.to_string())))
}

/// Resolve a dotted key path for `locale`, falling back to the default
/// locale, then to `options.fallback`, then to the key itself.
///
/// Never fails: an unknown locale starts at the default locale's tree.
pub fn resolve<'a>(catalog: &'a LocaleCatalog, key: &str, locale: &str, options: &ResolveOptions) -> Resolved<'a> {
    let default_locale = catalog.default_locale();
    let (start_locale, start_tree) = match catalog.tree(locale) {
        Some(tree) => (locale, tree),
        None => (default_locale, catalog.default_tree()),
    };

    match walk(start_tree, key, options.return_objects) {
        Walk::Found(value) => return value,
        Walk::NotDisplayable => return fallback_value(key, options),
        Walk::Missing => {}
    }

    if start_locale != default_locale {
        match walk(catalog.default_tree(), key, options.return_objects) {
            Walk::Found(value) => {
                debug!(key, locale, fallback_locale = default_locale, "translation missing, using default locale");
                return value;
            }
            Walk::NotDisplayable => return fallback_value(key, options),
            Walk::Missing => {}
        }
    }

    warn!(key, locale, "translation missing in requested and default locale");
    fallback_value(key, options)
}

/// Replace `{name}` / `{0}` placeholders; unknown ones are kept verbatim.
fn interpolate<'v>(template: &str, lookup: impl Fn(&str) -> Option<&'v str>) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER.get_or_init(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("placeholder pattern is valid"));
    re.replace_all(template, |caps: &Captures| match lookup(&caps[1]) {
        Some(value) => value.to_string(),
        None => caps[0].to_string(),
    })
    .into_owned()
}

/// Lookup context: a catalog plus the locale of the current session.
#[derive(Debug, Clone, Copy)]
pub struct Translator<'a> {
    catalog: &'a LocaleCatalog,
    locale: &'a str,
}

impl<'a> Translator<'a> {
    pub fn new(catalog: &'a LocaleCatalog, locale: &'a str) -> Self {
        Self { catalog, locale }
    }

    pub fn locale(&self) -> &'a str {
        self.locale
    }

    pub fn catalog(&self) -> &'a LocaleCatalog {
        self.catalog
    }

    pub fn t(&self, key: &str) -> Cow<'a, str> {
        self.text(key, &ResolveOptions::default())
    }

    pub fn t_or(&self, key: &str, fallback: &str) -> Cow<'a, str> {
        self.text(key, &ResolveOptions::default().fallback(fallback))
    }

    pub fn t_with(&self, key: &str, options: &ResolveOptions) -> Resolved<'a> {
        resolve(self.catalog, key, self.locale, options)
    }

    /// List content such as bullet points; empty when `key` is not a list.
    pub fn t_list(&self, key: &str) -> Vec<String> {
        match self.t_with(key, &ResolveOptions::default().return_objects(true)) {
            Resolved::List(items) => items.to_vec(),
            _ => Vec::new(),
        }
    }

    pub fn t_format(&self, key: &str, args: &[&str]) -> String {
        interpolate(&self.t(key), |name| {
            name.parse::<usize>().ok().and_then(|i| args.get(i).copied())
        })
    }

    pub fn t_named(&self, key: &str, args: &[(&str, &str)]) -> String {
        interpolate(&self.t(key), |name| {
            args.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
        })
    }

    fn text(&self, key: &str, options: &ResolveOptions) -> Cow<'a, str> {
        match self.t_with(key, options) {
            Resolved::Text(s) => s,
            other => Cow::Owned(other.into_string()),
        }
    }
}
