//! newsletter-agent: inspect the tool set and run workflow steps from the command line.
//!
//! Usage:
//!   newsletter-agent tools [--config <file>]                  Print tool signatures
//!   newsletter-agent check <tool> <json> [--config <file>]    Validate arguments only
//!   newsletter-agent social-post --tenant <id> --issue <id> --platform <name>
//!                                --content-file <file> [--config <file>]
//!   newsletter-agent insights --tenant <id> --issue <id> --report-file <file>
//!                             [--config <file>]

use anyhow::{anyhow, bail, Context};
use newsletter_agent::newsletter::{all_tools, InsightsStep, SocialPostStep};
use newsletter_agent::{model, AgentConfig, MemoryStore, PersistenceSink, TenantContext, ToolRegistry};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "tools" => cmd_tools(&args[2..]),
        "check" => cmd_check(&args[2..]),
        "social-post" => cmd_social_post(&args[2..]).await,
        "insights" => cmd_insights(&args[2..]).await,
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(true)
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(true)
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(2);
        }
    }
}

fn print_usage() {
    println!(
        r#"newsletter-agent: LLM tool dispatch for newsletter workflows

USAGE:
    newsletter-agent <COMMAND> [OPTIONS]

COMMANDS:
    tools                            Print tool signatures as JSON
    check <tool> <json>              Validate arguments without dispatching
    social-post                      Draft a social post for an issue
        --tenant <id> --issue <id> --platform <name> --content-file <file>
    insights                         Record insights from a performance report
        --tenant <id> --issue <id> --report-file <file>
    version                          Show version information
    help                             Show this help message

OPTIONS:
    --config <file>                  YAML configuration (defaults plus environment otherwise)

ENVIRONMENT:
    NEWSLETTER_AGENT_API_STYLE       openai_compatible | anthropic_messages | scripted
    NEWSLETTER_AGENT_MODEL           Model id
    NEWSLETTER_AGENT_BASE_URL        Model endpoint base URL
    NEWSLETTER_AGENT_TIMEOUT_SECS    Model request timeout
    NEWSLETTER_AGENT_RETENTION_DAYS  Social draft retention
    RUST_LOG                         Log filter (default: info)"#
    );
}

fn cmd_version() {
    println!("newsletter-agent {}", env!("CARGO_PKG_VERSION"));
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn required_flag<'a>(args: &'a [String], name: &str) -> anyhow::Result<&'a str> {
    flag(args, name).ok_or_else(|| anyhow!("missing required option {name}"))
}

/// Positional arguments, skipping `--flag value` pairs.
fn positionals(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            iter.next();
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

fn load_config(args: &[String]) -> anyhow::Result<AgentConfig> {
    let config = match flag(args, "--config") {
        Some(path) => AgentConfig::load(path).with_context(|| format!("loading {path}"))?,
        None => AgentConfig::from_env()?,
    };
    Ok(config)
}

fn registry(config: &AgentConfig) -> anyhow::Result<ToolRegistry> {
    let sink: Arc<dyn PersistenceSink> = Arc::new(MemoryStore::new());
    Ok(ToolRegistry::new(all_tools(sink, config.social.clone()))?)
}

fn cmd_tools(args: &[String]) -> anyhow::Result<bool> {
    let config = load_config(args)?;
    let signatures = registry(&config)?.signatures();
    println!("{}", serde_json::to_string_pretty(&signatures)?);
    Ok(true)
}

fn cmd_check(args: &[String]) -> anyhow::Result<bool> {
    let positional = positionals(args);
    let &[tool, raw] = positional.as_slice() else {
        bail!("usage: newsletter-agent check <tool> <json>");
    };

    let config = load_config(args)?;
    let registry = registry(&config)?;
    let descriptor = registry
        .get(tool)
        .ok_or_else(|| anyhow!("unknown tool '{tool}' (known: {})", registry.names().join(", ")))?;

    // Same shape a provider delivers: validation decodes it exactly once.
    let result = descriptor.validate(&serde_json::Value::String(raw.to_string()));
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(result.is_valid())
}

async fn cmd_social_post(args: &[String]) -> anyhow::Result<bool> {
    let tenant = required_flag(args, "--tenant")?;
    let issue = required_flag(args, "--issue")?;
    let platform = required_flag(args, "--platform")?;
    let content_file = required_flag(args, "--content-file")?;
    let content = std::fs::read_to_string(content_file)
        .with_context(|| format!("reading {content_file}"))?;

    let config = load_config(args)?;
    let model = model::from_config(&config.model)?;
    let sink = Arc::new(MemoryStore::new());
    let step = SocialPostStep::new(model, sink, config);

    let outcome = step
        .run(&cli_context(tenant), issue, platform, &content)
        .await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(outcome.success)
}

async fn cmd_insights(args: &[String]) -> anyhow::Result<bool> {
    let tenant = required_flag(args, "--tenant")?;
    let issue = required_flag(args, "--issue")?;
    let report_file = required_flag(args, "--report-file")?;
    let raw = std::fs::read_to_string(report_file)
        .with_context(|| format!("reading {report_file}"))?;
    let report: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("{report_file} is not JSON"))?;

    let config = load_config(args)?;
    let model = model::from_config(&config.model)?;
    let sink = Arc::new(MemoryStore::new());
    let step = InsightsStep::new(model, sink, config);

    let outcome = step.run(&cli_context(tenant), issue, &report).await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(outcome.success)
}

fn cli_context(tenant: &str) -> TenantContext {
    TenantContext::new(tenant)
        .with_trace_id(uuid::Uuid::new_v4().to_string())
        .with_caller("newsletter-agent-cli")
}
