//! `address-parse`: decompose a postal address from the command line.
//!
//! Reads plain text or a JSON record from the positional argument or stdin,
//! runs the model-first pipeline and prints the result as pretty JSON.

use address_pipeline::{
    backend::Backend, exec_ctx::DEFAULT_BASE_URL, record, AddressError, AddressPipeline,
    AvailabilityProbe, ExecCtx, OllamaBackend, OpenAiBackend,
};
use anyhow::Context;
use clap::{Parser, ValueEnum};
use serde_json::{json, Value};
use std::io::Read;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    /// OpenAI-compatible chat completions (LM Studio, llama.cpp, vLLM)
    Openai,
    /// Ollama native chat API
    Ollama,
}

#[derive(Debug, Parser)]
#[command(name = "address-parse", version, about = "Split a postal address into structured fields")]
struct Cli {
    /// Address text, or a JSON record with --json. Read from stdin when omitted
    address: Option<String>,

    /// Treat the input as a JSON object and merge the result into it
    #[arg(long)]
    json: bool,

    /// Field holding the address in --json mode
    #[arg(long, value_name = "NAME", default_value = "Address")]
    field: String,

    /// Contact name to strip from the address text
    #[arg(long, value_name = "NAME")]
    contact: Option<String>,

    /// Record field holding the contact name in --json mode
    #[arg(long, value_name = "NAME", default_value = "Name")]
    contact_field: String,

    /// Base URL of the inference server
    #[arg(long, value_name = "URL", env = "ADDRESS_LLM_URL", default_value = DEFAULT_BASE_URL)]
    url: String,

    /// Model identifier sent with each request
    #[arg(long, value_name = "ID", env = "ADDRESS_LLM_MODEL")]
    model: Option<String>,

    /// Inference API flavour
    #[arg(long, value_enum, env = "ADDRESS_LLM_BACKEND", default_value_t = BackendKind::Openai)]
    backend: BackendKind,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", env = "ADDRESS_LLM_TIMEOUT_SECS", default_value_t = 5)]
    timeout: u64,

    /// Use the pattern-based parser only
    #[arg(long)]
    no_model: bool,

    /// Report whether the inference server is reachable and exit
    #[arg(long)]
    probe: bool,
}

impl Cli {
    fn exec_ctx(&self) -> address_pipeline::Result<ExecCtx> {
        if self.timeout == 0 {
            return Err(AddressError::InvalidConfig(
                "timeout must be at least one second".to_string(),
            ));
        }

        let backend: Arc<dyn Backend> = match self.backend {
            BackendKind::Openai => match std::env::var("OPENAI_API_KEY") {
                Ok(key) if !key.is_empty() => Arc::new(OpenAiBackend::new().with_api_key(key)),
                _ => Arc::new(OpenAiBackend::new()),
            },
            BackendKind::Ollama => Arc::new(OllamaBackend),
        };

        let mut builder = ExecCtx::builder(&self.url)
            .timeout(Duration::from_secs(self.timeout))
            .backend(backend);
        if let Some(ref model) = self.model {
            builder = builder.model(model);
        }
        Ok(builder.build())
    }

    fn input(&self) -> anyhow::Result<String> {
        match self.address {
            Some(ref text) => Ok(text.clone()),
            None => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("failed to read stdin")?;
                Ok(buf)
            }
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = cli.exec_ctx()?;
    log::debug!("{:?}", ctx);

    if cli.probe {
        let available = AvailabilityProbe::new().refresh(&ctx).await;
        let report = json!({
            "url": ctx.base_url,
            "backend": ctx.backend.name(),
            "available": available,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let pipeline = if cli.no_model {
        AddressPipeline::deterministic_only()
    } else {
        AddressPipeline::new()
    };
    let input = cli.input()?;

    if cli.json {
        let mut record = match serde_json::from_str::<Value>(&input).map_err(AddressError::from)? {
            Value::Object(map) => map,
            other => {
                return Err(AddressError::InputInvalid(format!(
                    "expected a JSON object, got {}",
                    other
                ))
                .into())
            }
        };
        let text = record::address_text(&record, &cli.field)?;
        let contact = cli
            .contact
            .clone()
            .or_else(|| record::text_field(&record, &cli.contact_field).map(str::to_string));

        let outcome = pipeline
            .parse_with_contact(&ctx, &text, contact.as_deref())
            .await?;
        log::info!("parsed record field {:?} (model: {})", cli.field, outcome.used_model);
        record::merge_outcome(&mut record, &outcome);
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        let outcome = pipeline
            .parse_with_contact(&ctx, &input, cli.contact.as_deref())
            .await?;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            match e.downcast_ref::<AddressError>() {
                Some(AddressError::InputInvalid(_)) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}
