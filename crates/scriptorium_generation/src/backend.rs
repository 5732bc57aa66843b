//! Script builder backed by an OpenAI-compatible chat completion endpoint.

use crate::{ChatClient, ChatCompletionRequest, Message, compose_content};
use async_trait::async_trait;
use futures::future::try_join_all;
use scriptorium_core::{
    DEFAULT_MAX_VARIANT_COUNT, GenerationRequest, GeneratorInfo, ScriptVariant, Tone,
    VARIANT_PREFIX, new_id, variant_title,
};
use scriptorium_error::{BackendError, ScriptoriumResult};
use scriptorium_interface::ScriptBuilder;
use tracing::{debug, info, instrument};

/// Requests one chat completion per variant, concurrently.
///
/// Each variant's script text is the trimmed content of the first choice; an empty
/// completion is reported as a backend error rather than producing an empty variant.
#[derive(Debug, Clone)]
pub struct BackendScriptBuilder {
    client: ChatClient,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    max_variant_count: u32,
}

impl BackendScriptBuilder {
    /// Create a builder sending requests for `model` through `client`.
    pub fn new(client: ChatClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: None,
            max_tokens: None,
            max_variant_count: DEFAULT_MAX_VARIANT_COUNT,
        }
    }

    /// Set the largest variant count a request may ask for.
    pub fn with_max_variant_count(mut self, max: u32) -> Self {
        self.max_variant_count = max;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the completion length cap.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Chat request for the variant titled `title`.
    pub fn chat_request(&self, request: &GenerationRequest, title: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(system_prompt(*request.style().tone())),
                Message::user(user_prompt(request, title)),
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    async fn build_one(
        &self,
        request: &GenerationRequest,
        index: usize,
    ) -> ScriptoriumResult<ScriptVariant> {
        let title = variant_title(index);
        let response = self
            .client
            .chat_completion(&self.chat_request(request, &title))
            .await?;

        let script = response
            .first_content()
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                BackendError::new(format!("Backend returned no script text for {}", title))
            })?;

        debug!(title = %title, chars = script.len(), "Received backend script");
        Ok(ScriptVariant::new(
            new_id(VARIANT_PREFIX),
            title,
            compose_content(request, script),
        ))
    }
}

fn system_prompt(tone: Tone) -> String {
    let voice = match tone {
        Tone::Formal => "polished, professional and precise",
        Tone::Casual => "relaxed, friendly and conversational",
    };
    format!(
        "You are a marketing copywriter. Write a short spoken marketing script. \
         Keep the voice {}. Reply with the script text only, without headings.",
        voice
    )
}

fn user_prompt(request: &GenerationRequest, title: &str) -> String {
    let mut lines = vec![
        format!("Product: {}", request.product_name()),
        format!("Variant: {}", title),
    ];
    for detail in request.detail_lines() {
        lines.push(format!("Detail: {}", detail));
    }
    let style = request.style();
    if let Some(audience) = style.audience() {
        lines.push(format!("Audience: {}", audience));
    }
    if let Some(cta) = style.call_to_action() {
        lines.push(format!("End with this call to action: {}", cta));
    }
    lines.join("\n")
}

#[async_trait]
impl ScriptBuilder for BackendScriptBuilder {
    #[instrument(
        skip(self, request),
        fields(project_id = %request.project_id(), count = request.variant_count(), model = %self.model)
    )]
    async fn build(&self, request: &GenerationRequest) -> ScriptoriumResult<Vec<ScriptVariant>> {
        request.validate(self.max_variant_count)?;

        let count = *request.variant_count() as usize;
        info!(base_url = %self.client.base_url(), "Requesting variants from backend");
        let variants = try_join_all((0..count).map(|index| self.build_one(request, index))).await?;

        debug!(count = variants.len(), "Built backend variants");
        Ok(variants)
    }

    fn generator(&self) -> GeneratorInfo {
        GeneratorInfo::new(format!("backend:{}", self.model), false)
    }
}
