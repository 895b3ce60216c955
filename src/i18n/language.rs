//! Language type: a display name paired with its ISO code.

/// A language supported by the translation backend.
///
/// The default value (both fields empty) stands for an unresolved language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Language {
    /// Human-readable name (e.g., "French")
    display_name: String,

    /// ISO 639 language code (e.g., "fr", "zh-CN")
    iso_code: String,
}

impl Language {
    pub fn new(display_name: impl Into<String>, iso_code: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            iso_code: iso_code.into(),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn iso_code(&self) -> &str {
        &self.iso_code
    }

    /// Whether this language was found in the registry.
    ///
    /// An empty ISO code means the lookup that produced it did not match.
    pub fn is_resolved(&self) -> bool {
        !self.iso_code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let french = Language::new("French", "fr");
        assert_eq!(french.display_name(), "French");
        assert_eq!(french.iso_code(), "fr");
        assert!(french.is_resolved());
    }

    #[test]
    fn test_default_is_unresolved() {
        let unknown = Language::default();
        assert_eq!(unknown.display_name(), "");
        assert_eq!(unknown.iso_code(), "");
        assert!(!unknown.is_resolved());
    }

    #[test]
    fn test_language_equality() {
        assert_eq!(Language::new("German", "de"), Language::new("German", "de"));
        assert_ne!(Language::new("German", "de"), Language::new("German", "de-AT"));
    }

    #[test]
    fn test_language_debug() {
        let debug = format!("{:?}", Language::new("Spanish", "es"));
        assert!(debug.contains("es"));
        assert!(debug.contains("Spanish"));
    }
}
