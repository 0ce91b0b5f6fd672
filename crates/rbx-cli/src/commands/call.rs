//! `rbx call`: execute one endpoint and print its envelope

use std::time::Duration;

use clap::{Args, ValueEnum};
use rbx_client::{ApiGroup, ApiResponse, CallOptions, EndpointDescriptor};
use rbx_core::error::{RbxError, RbxResult};
use rbx_core::{CredentialKind, HttpMethod};
use serde_json::Value;

use super::{build_engine, describe_source, CommandContext};

#[derive(Debug, Clone, Args)]
pub struct CallArgs {
    /// HTTP method
    pub method: HttpMethod,

    /// Request path, already filled in (e.g. /v1/users/1)
    pub path: String,

    /// Base URL of the API group
    #[arg(long, default_value = "https://users.roblox.com")]
    pub base_url: String,

    /// API group name used for cache rules
    #[arg(long, default_value = "cli")]
    pub group: String,

    /// Endpoint name used for cache rules and keys
    #[arg(long, default_value = "call")]
    pub name: String,

    /// Search parameter as NAME=VALUE; repeatable
    #[arg(short, long = "query", value_name = "NAME=VALUE", value_parser = parse_key_value)]
    pub query: Vec<(String, String)>,

    /// JSON request body
    #[arg(long)]
    pub body: Option<String>,

    /// Credential the endpoint requires
    #[arg(long, value_enum, default_value_t = AuthArg::None)]
    pub auth: AuthArg,

    /// Per-request timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Follow nextPageCursor for up to this many pages
    #[arg(long, default_value_t = 1)]
    pub pages: usize,

    /// Search parameter carrying the page cursor
    #[arg(long, default_value = "cursor")]
    pub cursor_param: String,

    /// Print only the data field
    #[arg(long)]
    pub data_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AuthArg {
    None,
    Cookie,
    ApiKey,
}

impl AuthArg {
    fn kind(self) -> Option<CredentialKind> {
        match self {
            AuthArg::None => None,
            AuthArg::Cookie => Some(CredentialKind::Cookie),
            AuthArg::ApiKey => Some(CredentialKind::ApiKey),
        }
    }
}

/// Parse a `NAME=VALUE` pair
pub fn parse_key_value(raw: &str) -> anyhow::Result<(String, String)> {
    let Some((name, value)) = raw.split_once('=') else {
        anyhow::bail!("expected NAME=VALUE, got '{raw}'");
    };
    if name.is_empty() {
        anyhow::bail!("parameter name cannot be empty in '{raw}'");
    }
    Ok((name.to_string(), value.to_string()))
}

/// Turn command line arguments into an endpoint descriptor
pub fn build_descriptor(args: &CallArgs) -> RbxResult<EndpointDescriptor> {
    let group = ApiGroup::new(args.group.clone(), &args.base_url)?;
    let mut builder = group.endpoint(args.name.clone(), args.method, args.path.clone());

    for (name, value) in &args.query {
        builder = builder.query(name.clone(), value.clone());
    }

    if let Some(body) = &args.body {
        let body: Value = serde_json::from_str(body).map_err(|e| RbxError::ConfigValidation {
            field: "--body".to_string(),
            reason: format!("not valid JSON: {e}"),
        })?;
        builder = builder.body(body);
    }

    if let Some(kind) = args.auth.kind() {
        builder = builder.credential(kind);
    }

    Ok(builder.build())
}

/// JSON printed for a set of pages
pub fn render(pages: &[ApiResponse], data_only: bool) -> RbxResult<Value> {
    let mut rendered = Vec::with_capacity(pages.len());
    for page in pages {
        let value = if data_only {
            page.data.clone()
        } else {
            serde_json::to_value(page).map_err(|e| RbxError::Format {
                endpoint: "output".to_string(),
                message: e.to_string(),
                source: Some(Box::new(e)),
            })?
        };
        rendered.push(value);
    }

    Ok(match rendered.len() {
        1 => rendered.remove(0),
        _ => Value::Array(rendered),
    })
}

pub async fn execute(args: CallArgs, ctx: &CommandContext) -> RbxResult<()> {
    let (config, source) = ctx.load_config().await?;
    ctx.output.info(&format!("using {}", describe_source(&source, &ctx.cwd)));

    let descriptor = build_descriptor(&args)?;
    let engine = build_engine(config)?;

    let mut options = CallOptions::new();
    if let Some(ms) = args.timeout_ms {
        options = options.with_timeout(Duration::from_millis(ms));
    }

    let pages = if args.pages > 1 {
        engine
            .execute_pages(&descriptor, &args.cursor_param, args.pages, options)
            .await?
    } else {
        vec![engine.execute(&descriptor, options).await?]
    };

    for page in &pages {
        if page.is_cached() {
            ctx.output.info("served from cache");
        }
    }
    if args.pages > 1 && pages.last().and_then(ApiResponse::next_cursor).is_some() {
        ctx.output.warn(&format!("stopped after {} pages; more are available", pages.len()));
    }

    ctx.output.json(&render(&pages, args.data_only)?)
}
