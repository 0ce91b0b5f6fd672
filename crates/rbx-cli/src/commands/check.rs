//! `rbx check`: validate configuration and explain cache resolution

use rbx_config::{CacheDirective, ClientConfig};
use rbx_core::error::RbxResult;
use rbx_core::CredentialKind;

use super::{build_engine, describe_source, CommandContext};

/// One line describing the cache directive an endpoint resolves to
pub fn describe_cache(config: &ClientConfig, group: &str, endpoint: &str) -> String {
    match config.cache.resolve_directive(group, endpoint) {
        None => format!("{group}/{endpoint}: not cached (no rule)"),
        Some(CacheDirective::Off(_)) => format!("{group}/{endpoint}: disabled"),
        Some(CacheDirective::On(settings)) => match settings.lifetime_secs {
            Some(secs) => format!("{group}/{endpoint}: {} adapter, lifetime {secs}s", settings.adapter),
            None => format!("{group}/{endpoint}: {} adapter, no expiry", settings.adapter),
        },
    }
}

fn presence(config: &ClientConfig, kind: CredentialKind) -> &'static str {
    if config.credentials.get(kind).is_some() {
        "set"
    } else {
        "not set"
    }
}

pub async fn execute(group: Option<String>, endpoint: Option<String>, ctx: &CommandContext) -> RbxResult<()> {
    ctx.output.heading("Checking configuration...");

    let (config, source) = ctx.load_config().await?;
    ctx.output.field("config", &describe_source(&source, &ctx.cwd));
    ctx.output.field("cookie", presence(&config, CredentialKind::Cookie));
    ctx.output.field("api key", presence(&config, CredentialKind::ApiKey));
    ctx.output.field("csrf", &format!("{} attempt(s)", config.csrf_retries()));

    let adapters = config.cache.adapter_names().join(", ");
    ctx.output.field(
        "adapters",
        if adapters.is_empty() { "none" } else { adapters.as_str() },
    );

    if let Some(group) = &group {
        let endpoint = endpoint.as_deref().unwrap_or(rbx_config::WILDCARD);
        ctx.output.field("cache", &describe_cache(&config, group, endpoint));
    } else if endpoint.is_some() {
        ctx.output.warn("--endpoint needs --group to resolve cache settings");
    }

    // Building the engine checks adapter names against registered adapters.
    build_engine(config)?;

    ctx.output.success("Configuration is valid");
    Ok(())
}
