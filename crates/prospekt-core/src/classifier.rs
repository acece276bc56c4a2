//! Keyword-rule brand classification over offer titles.
//!
//! The active rule set is an immutable snapshot behind an [`ArcSwap`]:
//! `classify` loads one consistent snapshot for its whole scan, and
//! `replace_rules` installs a new set with a single atomic store. Concurrent
//! readers therefore see either the old rules or the new ones, never a
//! partially replaced list.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::rules::BrandRule;

/// A rule with its keywords pre-normalized for matching.
#[derive(Debug)]
struct CompiledRule {
    brand: String,
    keywords: Vec<String>,
}

pub struct BrandClassifier {
    rules: ArcSwap<Vec<CompiledRule>>,
}

impl BrandClassifier {
    #[must_use]
    pub fn new(rules: &[BrandRule]) -> Self {
        Self {
            rules: ArcSwap::from_pointee(compile(rules)),
        }
    }

    /// Replaces the entire rule set atomically.
    pub fn replace_rules(&self, rules: &[BrandRule]) {
        self.rules.store(Arc::new(compile(rules)));
    }

    /// Returns the brand of the first rule with a keyword contained in
    /// `title`, or `None` when no rule matches.
    ///
    /// Matching is substring-based on the normalized title (lowercased,
    /// diacritics folded); rule order from the configuration file decides
    /// ties.
    #[must_use]
    pub fn classify(&self, title: &str) -> Option<String> {
        let rules = self.rules.load();
        let haystack = normalize_for_match(title);

        for rule in rules.iter() {
            for keyword in &rule.keywords {
                if haystack.contains(keyword.as_str()) {
                    return Some(rule.brand.clone());
                }
            }
        }
        None
    }

    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.load().len()
    }
}

fn compile(rules: &[BrandRule]) -> Vec<CompiledRule> {
    rules
        .iter()
        .map(|rule| CompiledRule {
            brand: rule.brand.clone(),
            keywords: rule
                .keywords
                .iter()
                .map(|k| normalize_for_match(k))
                .filter(|k| !k.is_empty())
                .collect(),
        })
        .collect()
}

/// Lowercases and folds Latin diacritics so `"Müller"` matches `"muller"`.
///
/// Manual character map rather than a Unicode normalization pass: the
/// leaflet corpus is German retail text and only ever carries Latin-1
/// accents.
pub(crate) fn normalize_for_match(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars().flat_map(char::to_lowercase) {
        match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => out.push('a'),
            'è' | 'é' | 'ê' | 'ë' => out.push('e'),
            'ì' | 'í' | 'î' | 'ï' => out.push('i'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' => out.push('o'),
            'ù' | 'ú' | 'û' | 'ü' => out.push('u'),
            'ý' | 'ÿ' => out.push('y'),
            'ç' => out.push('c'),
            'ñ' => out.push('n'),
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'œ' => out.push_str("oe"),
            other => out.push(other),
        }
    }
    out
}
