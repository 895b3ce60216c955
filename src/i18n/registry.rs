//! Language registry: the catalog of languages the backend supports.
//!
//! The registry is built once from the backend catalog at startup and is
//! immutable afterwards, so it can be shared behind an `Arc` and read from any
//! number of request handlers without locking.

use std::collections::HashMap;

use crate::i18n::Language;

/// Catalog of supported languages keyed by lower-cased display name.
#[derive(Debug, Clone, Default)]
pub struct LanguageRegistry {
    languages: HashMap<String, Language>,
}

impl LanguageRegistry {
    /// Build a registry from a list of languages.
    ///
    /// Display names are compared case-insensitively; when two entries share a
    /// name the later one replaces the earlier one.
    pub fn from_languages<I>(languages: I) -> Self
    where
        I: IntoIterator<Item = Language>,
    {
        let languages = languages
            .into_iter()
            .map(|language| (language.display_name().to_lowercase(), language))
            .collect();

        Self { languages }
    }

    /// Look up a language by its display name, ignoring case.
    ///
    /// # Returns
    /// The matching language, or an unresolved `Language::default()` (empty
    /// ISO code) if the name is unknown. Callers must check
    /// [`Language::is_resolved`] rather than expect an error.
    pub fn by_display_name(&self, display_name: &str) -> Language {
        self.languages
            .get(&display_name.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    /// All display names in lexicographic order.
    pub fn display_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .languages
            .values()
            .map(Language::display_name)
            .collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_registry() -> LanguageRegistry {
        LanguageRegistry::from_languages(vec![
            Language::new("German", "de"),
            Language::new("French", "fr"),
            Language::new("English", "en"),
            Language::new("Spanish", "es"),
        ])
    }

    #[test]
    fn test_by_display_name_exact() {
        let registry = sample_registry();
        assert_eq!(
            registry.by_display_name("French"),
            Language::new("French", "fr")
        );
    }

    #[test]
    fn test_by_display_name_ignores_case() {
        let registry = sample_registry();
        let french = registry.by_display_name("French");

        assert_eq!(registry.by_display_name("FRENCH"), french);
        assert_eq!(registry.by_display_name("french"), french);
        assert_eq!(registry.by_display_name("fReNcH"), french);
    }

    #[test]
    fn test_by_display_name_unknown_is_unresolved() {
        let registry = sample_registry();
        let unknown = registry.by_display_name("Klingon");

        assert!(!unknown.is_resolved());
        assert_eq!(unknown, Language::default());
    }

    #[test]
    fn test_by_display_name_empty_is_unresolved() {
        let registry = sample_registry();
        assert!(!registry.by_display_name("").is_resolved());
    }

    #[test]
    fn test_display_names_sorted() {
        let registry = sample_registry();
        assert_eq!(
            registry.display_names(),
            vec!["English", "French", "German", "Spanish"]
        );
    }

    #[test]
    fn test_duplicate_name_last_write_wins() {
        let registry = LanguageRegistry::from_languages(vec![
            Language::new("Chinese", "zh"),
            Language::new("chinese", "zh-CN"),
        ]);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.by_display_name("Chinese").iso_code(), "zh-CN");
        assert_eq!(registry.display_names(), vec!["chinese"]);
    }

    #[test]
    fn test_empty_registry() {
        let registry = LanguageRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.display_names().is_empty());
        assert!(!registry.by_display_name("French").is_resolved());
    }
}
