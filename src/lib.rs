//! # Address Pipeline
//!
//! Decomposes raw postal address text into six structured fields
//! (`Address1`, `Address2`, `City`, `State`, `ZIP`, `Country`).
//!
//! Decomposition is delegated first to a locally hosted language model over
//! a loopback HTTP endpoint. When the model is unreachable, slow, or replies
//! with something unusable, a deterministic pattern-based parser takes over,
//! so callers always get a complete result.
//!
//! ## Core Concepts
//!
//! - **[`AddressPipeline`]**: the dual-strategy parser. Returns a
//!   [`ParseOutcome`] tagged with the strategy that produced it.
//! - **[`ModelParser`]**: one model round trip, JSON extraction from free
//!   text, projection onto the six fields.
//! - **[`DeterministicParser`]**: regex extraction plus positional rules.
//!   Infallible.
//! - **[`ExecCtx`]**: shared context (HTTP client, endpoint, backend, model,
//!   timeout, optional event handler).
//! - **[`Backend`](backend::Backend)**: OpenAI-compatible servers (LM Studio,
//!   llama.cpp, vLLM) by default, or Ollama's native API.
//!
//! ## Quick Start
//!
//! ```no_run
//! use address_pipeline::{AddressPipeline, ExecCtx};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ctx = ExecCtx::builder("http://127.0.0.1:1234").build();
//!     let outcome = AddressPipeline::new()
//!         .parse(&ctx, "123 Main St Apt 4B\nSpringfield, IL 62704")
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&outcome)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Without a model
//!
//! ```
//! use address_pipeline::DeterministicParser;
//!
//! let address = DeterministicParser::new().parse("500 Oak Ave Suite 200, Austin, TX 78701");
//! assert_eq!(address.address2, "Suite 200");
//! assert_eq!(address.zip, "78701");
//! ```

pub mod availability;
pub mod backend;
pub mod clean;
pub mod client;
pub mod error;
pub mod events;
pub mod exec_ctx;
pub mod extract;
pub mod heuristic;
pub mod model_parser;
pub mod pipeline;
pub mod prompt;
pub mod record;
pub mod types;

pub use availability::AvailabilityProbe;
pub use backend::{MockBackend, OllamaBackend, OpenAiBackend};
pub use client::LlmConfig;
pub use error::{AddressError, Result};
pub use events::{Event, EventHandler, FnEventHandler};
pub use exec_ctx::{ExecCtx, ExecCtxBuilder};
pub use heuristic::DeterministicParser;
pub use model_parser::ModelParser;
pub use pipeline::AddressPipeline;
pub use types::{AddressField, ParseOutcome, ParsedAddress, DEFAULT_COUNTRY};
