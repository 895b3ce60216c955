//! Languages supported by the translation backend.
//!
//! # Architecture
//!
//! - `language`: a display name paired with its ISO code
//! - `registry`: the immutable catalog, looked up by display name
//!
//! # Example
//!
//! ```rust
//! use translate_cache::i18n::{Language, LanguageRegistry};
//!
//! let registry = LanguageRegistry::from_languages(vec![
//!     Language::new("French", "fr"),
//!     Language::new("German", "de"),
//! ]);
//!
//! assert_eq!(registry.by_display_name("FRENCH").iso_code(), "fr");
//! assert_eq!(registry.display_names(), vec!["French", "German"]);
//! ```

mod language;
mod registry;

pub use language::Language;
pub use registry::LanguageRegistry;
