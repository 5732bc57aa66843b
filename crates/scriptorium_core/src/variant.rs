//! Script variant type.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// One generated candidate script.
///
/// Variants are immutable once created; a run only ever changes which of its
/// variants is selected.
///
/// # Examples
///
/// ```
/// use scriptorium_core::{ScriptVariant, variant_title};
///
/// let variant = ScriptVariant::new("var_1", variant_title(0), "## Script\nHello");
/// assert_eq!(variant.title(), "Variant A");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters)]
pub struct ScriptVariant {
    /// Unique identifier
    id: String,
    /// Human-readable label, unique within a run
    title: String,
    /// Sectioned script body
    content: String,
}

impl ScriptVariant {
    /// Create a new variant.
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Title for the variant at `index` (zero-based) within a run.
///
/// The first 26 variants are lettered, later ones are numbered by position.
///
/// # Examples
///
/// ```
/// use scriptorium_core::variant_title;
///
/// assert_eq!(variant_title(0), "Variant A");
/// assert_eq!(variant_title(25), "Variant Z");
/// assert_eq!(variant_title(26), "Variant 27");
/// ```
pub fn variant_title(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => format!("Variant {}", char::from(b'A' + i)),
        _ => format!("Variant {}", index + 1),
    }
}
