use std::collections::BTreeMap;

use crate::catalog::{LocaleCatalog, TranslationNode, TranslationTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeafKind {
    Text,
    List,
}

/// Key coverage of one locale compared to the default locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocaleCoverage {
    pub locale: String,
    /// In the default locale but not here; lookups fall back to the default.
    pub missing: Vec<String>,
    /// Here but not in the default locale.
    pub extra: Vec<String>,
    /// Text in one locale, list in the other.
    pub kind_mismatch: Vec<String>,
}

impl LocaleCoverage {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty() && self.kind_mismatch.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub default_locale: String,
    pub locales: Vec<LocaleCoverage>,
}

impl AuditReport {
    pub fn is_complete(&self) -> bool {
        self.locales.iter().all(LocaleCoverage::is_complete)
    }
}

fn leaf_kinds(tree: &TranslationTree) -> BTreeMap<String, LeafKind> {
    tree.leaves()
        .into_iter()
        .filter_map(|(key, node)| match node {
            TranslationNode::Text(_) => Some((key, LeafKind::Text)),
            TranslationNode::List(_) => Some((key, LeafKind::List)),
            TranslationNode::Tree(_) => None,
        })
        .collect()
}

/// Compare every non-default locale against the default one.
pub fn audit(catalog: &LocaleCatalog) -> AuditReport {
    let default_locale = catalog.default_locale();
    let reference = leaf_kinds(catalog.default_tree());

    let locales = catalog
        .locales()
        .filter(|locale| *locale != default_locale)
        .filter_map(|locale| catalog.tree(locale).map(|tree| (locale, leaf_kinds(tree))))
        .map(|(locale, keys)| {
            let mut coverage = LocaleCoverage {
                locale: locale.to_string(),
                ..Default::default()
            };
            for (key, kind) in &reference {
                match keys.get(key) {
                    None => coverage.missing.push(key.clone()),
                    Some(other) if other != kind => coverage.kind_mismatch.push(key.clone()),
                    Some(_) => {}
                }
            }
            coverage.extra = keys
                .keys()
                .filter(|key| !reference.contains_key(*key))
                .cloned()
                .collect();
            coverage
        })
        .collect();

    AuditReport {
        default_locale: default_locale.to_string(),
        locales,
    }
}
