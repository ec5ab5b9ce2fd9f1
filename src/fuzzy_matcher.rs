use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

/// A key candidate with its match score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMatch {
    pub key: String,
    pub score: i64,
}

/// Ranks catalog keys against a (usually mistyped) key path
pub struct KeyMatcher {
    matcher: SkimMatcherV2,
}

impl KeyMatcher {
    pub fn new() -> Self {
        Self {
            matcher: SkimMatcherV2::default(),
        }
    }

    fn exact_match(&self, pattern: &str, text: &str) -> Option<i64> {
        (text == pattern).then(|| 1000 + (pattern.len() * 10) as i64)
    }

    fn prefix_match(&self, pattern: &str, text: &str) -> Option<i64> {
        text.starts_with(pattern).then(|| 800 + (pattern.len() * 8) as i64)
    }

    fn substring_match(&self, pattern: &str, text: &str) -> Option<i64> {
        text.contains(pattern).then(|| 700 + (pattern.len() * 7) as i64)
    }

    // Same key under a different parent, e.g. "nav.hme" vs "footer.home"
    fn last_segment_match(&self, pattern: &str, text: &str) -> Option<i64> {
        let wanted = pattern.rsplit('.').next()?;
        let actual = text.rsplit('.').next()?;
        (!wanted.is_empty() && wanted == actual).then(|| 600 + (wanted.len() * 6) as i64)
    }

    /// Try strategies by priority, falling back to skim fuzzy scoring
    pub fn score(&self, pattern: &str, text: &str) -> Option<i64> {
        if pattern.is_empty() {
            return None;
        }
        self.exact_match(pattern, text)
            .or_else(|| self.prefix_match(pattern, text))
            .or_else(|| self.substring_match(pattern, text))
            .or_else(|| self.last_segment_match(pattern, text))
            .or_else(|| self.matcher.fuzzy_match(text, pattern))
    }

    /// Best `limit` candidates, higher scores first, shorter keys on ties
    pub fn suggest<'k>(&self, pattern: &str, keys: impl IntoIterator<Item = &'k str>, limit: usize) -> Vec<KeyMatch> {
        let mut results: Vec<KeyMatch> = keys
            .into_iter()
            .filter_map(|key| {
                self.score(pattern, key).map(|score| KeyMatch {
                    key: key.to_string(),
                    score,
                })
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.key.len().cmp(&b.key.len()))
                .then_with(|| a.key.cmp(&b.key))
        });
        results.truncate(limit);
        results
    }
}

impl Default for KeyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: &[&str] = &[
        "nav.home",
        "nav.about",
        "footer.home",
        "home.hero.title",
        "home.leadMagnetSection.benefits",
    ];

    #[test]
    fn strategy_scores() {
        let matcher = KeyMatcher::new();
        assert_eq!(matcher.exact_match("nav.home", "nav.home"), Some(1000 + 8 * 10));
        assert_eq!(matcher.exact_match("home", "nav.home"), None);
        assert_eq!(matcher.prefix_match("nav", "nav.home"), Some(800 + 3 * 8));
        assert_eq!(matcher.substring_match("home", "nav.home"), Some(700 + 4 * 7));
        assert_eq!(matcher.last_segment_match("x.title", "home.hero.title"), Some(600 + 5 * 6));
        assert!(matcher.score("nvhm", "nav.home").is_some());
        assert!(matcher.score("zzz", "nav.home").is_none());
        assert!(matcher.score("", "nav.home").is_none());
    }

    #[test]
    fn suggests_closest_keys_first() {
        let matcher = KeyMatcher::new();
        let results = matcher.suggest("nav.hme", KEYS.iter().copied(), 3);
        assert!(!results.is_empty());
        assert_eq!(results[0].key, "nav.home");
    }

    #[test]
    fn suggest_respects_limit_and_tie_order() {
        let matcher = KeyMatcher::new();
        let results = matcher.suggest("home", KEYS.iter().copied(), 4);
        assert_eq!(results.len(), 4);
        // prefix beats substring; equal scores, shorter key first
        assert_eq!(results[0].key, "home.hero.title");
        assert_eq!(results[1].key, "home.leadMagnetSection.benefits");
        assert_eq!(results[2].key, "nav.home");
        assert_eq!(results[3].key, "footer.home");
    }

    #[test]
    fn exact_then_prefix_then_substring() {
        let matcher = KeyMatcher::new();
        let keys = ["about.nav", "nav.home.title", "nav.home"];
        let results = matcher.suggest("nav.home", keys.iter().copied(), 3);
        let order: Vec<&str> = results.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(order, vec!["nav.home", "nav.home.title"]);
        assert!(results[0].score > results[1].score);

        let results = matcher.suggest("nav", keys.iter().copied(), 3);
        assert_eq!(results[0].key, "nav.home");
        assert_eq!(results[1].key, "nav.home.title");
        assert_eq!(results[2].key, "about.nav");
    }
}
