//! Script variant builders for Scriptorium.
//!
//! Two [`ScriptBuilder`](scriptorium_interface::ScriptBuilder) implementations are
//! provided, chosen through [`GenerationConfig`] rather than hardcoded branching:
//!
//! - [`TemplateScriptBuilder`]: deterministic templating, no network. Runs it produces
//!   are labelled as stub output.
//! - [`BackendScriptBuilder`]: one chat completion per variant against an
//!   OpenAI-compatible endpoint.
//!
//! # Example
//!
//! ```rust
//! use scriptorium_core::GenerationRequest;
//! use scriptorium_generation::{GenerationConfig, create_builder};
//! use scriptorium_interface::ScriptBuilder;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let builder = create_builder(&GenerationConfig::default(), 26)?;
//! let variants = builder.build(&GenerationRequest::new("p1", 3)).await?;
//! assert_eq!(variants.len(), 3);
//! assert!(*builder.generator().stub());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod chat;
mod client;
mod config;
mod content;
mod template;

pub use backend::BackendScriptBuilder;
pub use chat::{ChatCompletionRequest, ChatCompletionResponse, Choice, ChoiceMessage, Message, Usage};
pub use client::ChatClient;
pub use config::{BuilderKind, GenerationConfig, create_builder};
pub use content::compose_content;
pub use template::TemplateScriptBuilder;
