//! Deterministic template-based script builder.

use crate::compose_content;
use async_trait::async_trait;
use scriptorium_core::{
    DEFAULT_MAX_VARIANT_COUNT, GenerationRequest, GeneratorInfo, ScriptVariant, StyleOptions, Tone,
    VARIANT_PREFIX, new_id, variant_title,
};
use scriptorium_error::ScriptoriumResult;
use scriptorium_interface::ScriptBuilder;
use tracing::{debug, instrument};

/// Name recorded on runs produced by this builder.
pub(crate) const TEMPLATE_GENERATOR: &str = "template";

/// Script angles cycled across variants so each one reads differently.
#[derive(Debug, Clone, Copy)]
enum Angle {
    Introduction,
    ProblemSolution,
    Benefits,
    Question,
}

impl Angle {
    const ALL: [Angle; 4] = [
        Angle::Introduction,
        Angle::ProblemSolution,
        Angle::Benefits,
        Angle::Question,
    ];

    fn for_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }
}

/// Builds variants from fixed phrasing templates without calling any backend.
///
/// Output depends only on the request (apart from the generated ids), which makes
/// this builder suitable for tests and local development. Runs it produces are
/// labelled `stub: true`.
#[derive(Debug, Clone)]
pub struct TemplateScriptBuilder {
    max_variant_count: u32,
}

impl Default for TemplateScriptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateScriptBuilder {
    /// Create a template builder accepting up to 26 variants per request.
    pub fn new() -> Self {
        Self {
            max_variant_count: DEFAULT_MAX_VARIANT_COUNT,
        }
    }

    /// Set the largest variant count a request may ask for.
    pub fn with_max_variant_count(mut self, max: u32) -> Self {
        self.max_variant_count = max;
        self
    }

    /// Script text for the variant at `index`.
    pub fn script_text(request: &GenerationRequest, index: usize) -> String {
        let name = request.product_name();
        let style = request.style();
        let opening = opening_line(&name, *style.tone(), Angle::for_index(index));

        let mut lines = vec![opening];
        if let Some(audience) = style.audience() {
            lines.push(match style.tone() {
                Tone::Formal => format!("Created for {}.", audience),
                Tone::Casual => format!("Made for {}.", audience),
            });
        }
        lines.push(closing_line(&name, style));
        lines.join(" ")
    }
}

fn opening_line(name: &str, tone: Tone, angle: Angle) -> String {
    match (tone, angle) {
        (Tone::Formal, Angle::Introduction) => {
            format!("Introducing {}, built to a standard you can rely on.", name)
        }
        (Tone::Formal, Angle::ProblemSolution) => format!(
            "When ordinary solutions fall short, {} delivers consistent results.",
            name
        ),
        (Tone::Formal, Angle::Benefits) => format!(
            "{} combines quality, reliability and thoughtful design.",
            name
        ),
        (Tone::Formal, Angle::Question) => {
            format!("Are you ready for a better experience? Consider {}.", name)
        }
        (Tone::Casual, Angle::Introduction) => format!("Say hello to {}!", name),
        (Tone::Casual, Angle::ProblemSolution) => {
            format!("Tired of stuff that just doesn't work? {} has your back.", name)
        }
        (Tone::Casual, Angle::Benefits) => {
            format!("{} is easy, fun and seriously good.", name)
        }
        (Tone::Casual, Angle::Question) => format!("What if your day had a little more {}?", name),
    }
}

fn closing_line(name: &str, style: &StyleOptions) -> String {
    match (style.call_to_action(), style.tone()) {
        (Some(cta), _) => cta.trim().to_string(),
        (None, Tone::Formal) => format!("Discover {} today.", name),
        (None, Tone::Casual) => format!("Grab {} now!", name),
    }
}

#[async_trait]
impl ScriptBuilder for TemplateScriptBuilder {
    #[instrument(
        skip(self, request),
        fields(project_id = %request.project_id(), count = request.variant_count())
    )]
    async fn build(&self, request: &GenerationRequest) -> ScriptoriumResult<Vec<ScriptVariant>> {
        request.validate(self.max_variant_count)?;

        let count = *request.variant_count() as usize;
        let variants: Vec<ScriptVariant> = (0..count)
            .map(|index| {
                let script = Self::script_text(request, index);
                ScriptVariant::new(
                    new_id(VARIANT_PREFIX),
                    variant_title(index),
                    compose_content(request, &script),
                )
            })
            .collect();

        debug!(count = variants.len(), "Built template variants");
        Ok(variants)
    }

    fn generator(&self) -> GeneratorInfo {
        GeneratorInfo::new(TEMPLATE_GENERATOR, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tone_changes_phrasing() {
        let formal = GenerationRequest::builder()
            .project_id("p1")
            .style(StyleOptions::with_tone(Tone::Formal))
            .build()
            .expect("valid request");
        let casual = GenerationRequest::new("p1", 1);

        let formal_text = TemplateScriptBuilder::script_text(&formal, 0);
        let casual_text = TemplateScriptBuilder::script_text(&casual, 0);
        assert_ne!(formal_text, casual_text);
        assert!(formal_text.ends_with("Discover p1 today."));
        assert!(casual_text.ends_with("Grab p1 now!"));
    }

    #[test]
    fn custom_call_to_action_and_audience() {
        let request = GenerationRequest::builder()
            .project_id("p1")
            .style(
                StyleOptions::with_tone(Tone::Casual)
                    .with_audience("busy parents")
                    .with_call_to_action("Order before Friday."),
            )
            .build()
            .expect("valid request");

        let text = TemplateScriptBuilder::script_text(&request, 1);
        assert!(text.contains("Made for busy parents."));
        assert!(text.ends_with("Order before Friday."));
    }

    #[test]
    fn angles_cycle() {
        let request = GenerationRequest::new("p1", 5);
        let first = TemplateScriptBuilder::script_text(&request, 0);
        let second = TemplateScriptBuilder::script_text(&request, 1);
        let fifth = TemplateScriptBuilder::script_text(&request, 4);
        assert_ne!(first, second);
        assert_eq!(first, fifth);
    }
}
