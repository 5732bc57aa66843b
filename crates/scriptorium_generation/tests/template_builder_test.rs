//! Tests for the deterministic template builder.

use scriptorium_core::{DEFAULT_MAX_VARIANT_COUNT, GenerationRequest, StyleOptions, Tone};
use scriptorium_error::PipelineErrorKind;
use scriptorium_generation::{BuilderKind, GenerationConfig, TemplateScriptBuilder, create_builder};
use scriptorium_interface::ScriptBuilder;
use std::collections::HashSet;

#[tokio::test]
async fn builds_requested_number_of_variants() {
    let builder = TemplateScriptBuilder::new();
    let request = GenerationRequest::new("p1", 3);

    let variants = builder.build(&request).await.expect("build succeeds");

    assert_eq!(variants.len(), 3);
    let titles: Vec<&str> = variants.iter().map(|v| v.title().as_str()).collect();
    assert_eq!(titles, vec!["Variant A", "Variant B", "Variant C"]);

    let ids: HashSet<&str> = variants.iter().map(|v| v.id().as_str()).collect();
    assert_eq!(ids.len(), 3);
    assert!(variants.iter().all(|v| v.id().starts_with("var_")));
}

#[tokio::test]
async fn content_is_sectioned() {
    let builder = TemplateScriptBuilder::new();
    let request: GenerationRequest = serde_json::from_value(serde_json::json!({
        "projectId": "p1",
        "productMetadata": {"name": "Glow Serum", "size": "30ml"}
    }))
    .expect("valid request");

    let variants = builder.build(&request).await.expect("build succeeds");
    let content = variants[0].content();

    assert!(content.starts_with("## Product\nGlow Serum"));
    assert!(content.contains("## Details\n- size: 30ml"));
    assert!(content.contains("## Script\n"));
}

#[tokio::test]
async fn formal_and_casual_outputs_differ() {
    let builder = TemplateScriptBuilder::new();
    let formal = GenerationRequest::builder()
        .project_id("p1")
        .style(StyleOptions::with_tone(Tone::Formal))
        .build()
        .expect("valid request");
    let casual = GenerationRequest::new("p1", 1);

    let formal_variants = builder.build(&formal).await.expect("build succeeds");
    let casual_variants = builder.build(&casual).await.expect("build succeeds");

    assert_ne!(formal_variants[0].content(), casual_variants[0].content());
}

#[tokio::test]
async fn rejects_invalid_requests() {
    let builder = TemplateScriptBuilder::new();

    let err = builder
        .build(&GenerationRequest::new("", 1))
        .await
        .expect_err("empty project is rejected");
    assert!(matches!(
        err.pipeline_kind(),
        Some(PipelineErrorKind::InvalidRequest(_))
    ));

    let err = builder
        .build(&GenerationRequest::new("p1", 0))
        .await
        .expect_err("zero variants is rejected");
    assert_eq!(err.kind_label(), "InvalidRequest");
}

#[test]
fn default_config_creates_stub_builder() {
    let config = GenerationConfig::default();
    assert_eq!(*config.builder(), BuilderKind::Template);

    let builder = create_builder(&config, DEFAULT_MAX_VARIANT_COUNT).expect("template builder");
    let info = builder.generator();
    assert_eq!(info.name(), "template");
    assert!(*info.stub());
}

#[test]
fn invalid_backend_config_is_a_configuration_error() {
    let config: GenerationConfig =
        toml::from_str("builder = \"backend\"\nbase_url = \"ftp://nowhere\"\nmodel = \"m\"")
            .expect("valid toml");
    let err = create_builder(&config, DEFAULT_MAX_VARIANT_COUNT)
        .err()
        .expect("config rejected");
    assert_eq!(err.kind_label(), "Configuration");

    let err = create_builder(&GenerationConfig::default(), 0)
        .err()
        .expect("zero cap rejected");
    assert_eq!(err.kind_label(), "Configuration");
}

#[tokio::test]
async fn builders_enforce_their_variant_cap() {
    let builder = TemplateScriptBuilder::new();
    let err = builder
        .build(&GenerationRequest::new("p1", DEFAULT_MAX_VARIANT_COUNT + 1))
        .await
        .expect_err("above default cap");
    assert_eq!(err.kind_label(), "InvalidRequest");

    let configured = create_builder(&GenerationConfig::default(), 2).expect("template builder");
    assert_eq!(
        configured
            .build(&GenerationRequest::new("p1", 2))
            .await
            .expect("within cap")
            .len(),
        2
    );
    let err = configured
        .build(&GenerationRequest::new("p1", u32::MAX))
        .await
        .expect_err("above configured cap");
    assert_eq!(err.kind_label(), "InvalidRequest");
}
