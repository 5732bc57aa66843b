//! Generation request types.

use derive_getters::Getters;
use scriptorium_error::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of variants produced when a request does not say otherwise.
pub const DEFAULT_VARIANT_COUNT: u32 = 1;

/// Largest variant count accepted unless configured otherwise; one per letter title.
pub const DEFAULT_MAX_VARIANT_COUNT: u32 = 26;

/// Free-form product attributes used to fill script templates.
///
/// The `name` key, when present, is used as the product name.
pub type ProductMetadata = BTreeMap<String, serde_json::Value>;

/// Tone of voice for generated scripts.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Tone {
    /// Polished, professional phrasing
    Formal,
    /// Relaxed, conversational phrasing
    #[default]
    Casual,
}

/// Style options affecting generated phrasing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct StyleOptions {
    /// Tone of voice
    #[serde(default)]
    tone: Tone,
    /// Intended audience, woven into the script when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audience: Option<String>,
    /// Closing call to action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    call_to_action: Option<String>,
}

impl StyleOptions {
    /// Style options with the given tone and no audience or call to action.
    pub fn with_tone(tone: Tone) -> Self {
        Self {
            tone,
            ..Self::default()
        }
    }

    /// Set the intended audience.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Set the closing call to action.
    pub fn with_call_to_action(mut self, cta: impl Into<String>) -> Self {
        self.call_to_action = Some(cta.into());
        self
    }
}

/// A request to generate script variants for a project.
///
/// # Examples
///
/// ```
/// use scriptorium_core::{GenerationRequest, StyleOptions, Tone};
///
/// let request = GenerationRequest::builder()
///     .project_id("p1")
///     .variant_count(3u32)
///     .style(StyleOptions::with_tone(Tone::Formal))
///     .build()
///     .unwrap();
///
/// assert_eq!(request.project_id(), "p1");
/// assert_eq!(*request.variant_count(), 3);
/// assert!(request.validate(26).is_ok());
/// ```
#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder,
)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into))]
pub struct GenerationRequest {
    /// External project reference
    project_id: String,
    /// Number of variants to produce
    #[serde(default = "default_variant_count")]
    #[builder(default = "DEFAULT_VARIANT_COUNT")]
    variant_count: u32,
    /// Attributes used to fill content templates
    #[serde(default)]
    #[builder(default)]
    product_metadata: ProductMetadata,
    /// Phrasing options
    #[serde(default)]
    #[builder(default)]
    style: StyleOptions,
}

fn default_variant_count() -> u32 {
    DEFAULT_VARIANT_COUNT
}

impl GenerationRequest {
    /// Creates a new request builder.
    pub fn builder() -> GenerationRequestBuilder {
        GenerationRequestBuilder::default()
    }

    /// Minimal request for a project with the given variant count.
    pub fn new(project_id: impl Into<String>, variant_count: u32) -> Self {
        Self {
            project_id: project_id.into(),
            variant_count,
            product_metadata: ProductMetadata::new(),
            style: StyleOptions::default(),
        }
    }

    /// Validates the request shape.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` when the project id is blank, the variant count is
    /// zero, or the variant count exceeds `max_variants`.
    pub fn validate(&self, max_variants: u32) -> Result<(), PipelineError> {
        if self.project_id.trim().is_empty() {
            return Err(PipelineError::invalid_request("projectId must not be empty"));
        }
        if self.variant_count < 1 {
            return Err(PipelineError::invalid_request(
                "variantCount must be at least 1",
            ));
        }
        if self.variant_count > max_variants {
            return Err(PipelineError::invalid_request(format!(
                "variantCount must be at most {}, got {}",
                max_variants, self.variant_count
            )));
        }
        Ok(())
    }

    /// Product name taken from `productMetadata.name`, falling back to the project id.
    pub fn product_name(&self) -> String {
        match self.product_metadata.get("name") {
            Some(serde_json::Value::String(name)) if !name.trim().is_empty() => {
                name.trim().to_string()
            }
            Some(value) if !value.is_null() && !value.is_string() => value.to_string(),
            _ => self.project_id.clone(),
        }
    }

    /// Metadata entries other than `name`, rendered as `key: value` pairs.
    pub fn detail_lines(&self) -> Vec<String> {
        self.product_metadata
            .iter()
            .filter(|(key, value)| key.as_str() != "name" && !value.is_null())
            .map(|(key, value)| match value {
                serde_json::Value::String(s) => format!("{}: {}", key, s),
                other => format!("{}: {}", key, other),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptorium_error::PipelineErrorKind;
    use serde_json::json;

    #[test]
    fn deserializes_with_defaults() {
        let request: GenerationRequest =
            serde_json::from_value(json!({"projectId": "p1"})).expect("valid body");
        assert_eq!(request.project_id(), "p1");
        assert_eq!(*request.variant_count(), 1);
        assert!(request.product_metadata().is_empty());
        assert_eq!(*request.style().tone(), Tone::Casual);
    }

    #[test]
    fn missing_project_id_fails_to_deserialize() {
        let result = serde_json::from_value::<GenerationRequest>(json!({"variantCount": 2}));
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_blank_project_and_zero_count() {
        let blank = GenerationRequest::new("  ", 1);
        assert!(matches!(
            blank.validate(26).unwrap_err().kind,
            PipelineErrorKind::InvalidRequest(_)
        ));

        let zero = GenerationRequest::new("p1", 0);
        assert!(matches!(
            zero.validate(26).unwrap_err().kind,
            PipelineErrorKind::InvalidRequest(_)
        ));

        let too_many = GenerationRequest::new("p1", 27);
        assert!(too_many.validate(26).is_err());
        assert!(GenerationRequest::new("p1", 26).validate(26).is_ok());
    }

    #[test]
    fn product_name_prefers_metadata() {
        let request: GenerationRequest = serde_json::from_value(json!({
            "projectId": "p1",
            "productMetadata": {"name": "Glow Serum", "price": 29, "scent": "citrus"}
        }))
        .expect("valid body");

        assert_eq!(request.product_name(), "Glow Serum");
        assert_eq!(request.detail_lines(), vec!["price: 29", "scent: citrus"]);
        assert_eq!(GenerationRequest::new("p9", 1).product_name(), "p9");
    }

    #[test]
    fn tone_parses_from_lowercase() {
        assert_eq!("formal".parse::<Tone>().ok(), Some(Tone::Formal));
        assert_eq!(Tone::Casual.to_string(), "casual");
    }
}
