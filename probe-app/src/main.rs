//! llmprobe: smoke tests for hosted chat-completion APIs.

mod config;
mod console;
mod init;
mod probes;
mod suite;
mod targets;

use crate::config::ProbeConfig;
use crate::console::{ConsoleReporter, Reporter};
use crate::probes::ProbeContext;
use crate::targets::Target;
use clap::{Args, Parser, Subcommand};
use probe_llm::{ApiKey, LlmClient};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Debug, Parser)]
#[command(name = "llmprobe", version, about = "Smoke-test LLM chat-completion APIs")]
struct Cli {
    /// Config file (default: ~/.llmprobe/config.toml).
    #[arg(long, global = true, env = "LLMPROBE_CONFIG")]
    config: Option<PathBuf>,

    /// Disable ANSI colors.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Probe the DeepSeek API: connectivity, completion, domain knowledge, rate limits.
    Deepseek(DeepSeekArgs),
    /// Probe the DashScope chat endpoint for Qwen3.
    Qwen(TargetArgs),
    /// Probe the DashScope text-generation service (Qwen3-235B-A22B).
    QwenNative(TargetArgs),
    /// Write a config template (idempotent).
    Init,
}

#[derive(Debug, Clone, Args)]
struct TargetArgs {
    /// API key (default: the provider's *_API_KEY environment variable).
    #[arg(long)]
    api_key: Option<String>,

    /// Base URL for the API.
    #[arg(long)]
    api_base: Option<String>,

    /// Model to test.
    #[arg(long)]
    model: Option<String>,

    /// Show request and response details.
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Clone, Args)]
struct DeepSeekArgs {
    #[command(flatten)]
    common: TargetArgs,

    /// API version path segment.
    #[arg(long)]
    api_version: Option<String>,

    /// Skip the sequential-request rate limit probe.
    #[arg(long)]
    skip_rate_limits: bool,
}

impl Command {
    fn verbose(&self) -> bool {
        match self {
            Command::Deepseek(a) => a.common.verbose,
            Command::Qwen(a) | Command::QwenNative(a) => a.verbose,
            Command::Init => false,
        }
    }

    /// Exit code when the run cannot start at all.
    fn fatal_code(&self) -> u8 {
        match self {
            Command::Deepseek(_) => Target::DeepSeek.exit_policy().fatal_code(),
            Command::Qwen(_) => Target::Qwen.exit_policy().fatal_code(),
            Command::QwenNative(_) => Target::QwenNative.exit_policy().fatal_code(),
            Command::Init => 1,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.command.verbose()) {
        eprintln!("llmprobe: {e:#}");
        return ExitCode::from(cli.command.fatal_code());
    }
    install_panic_hook();

    if cli.no_color {
        colored::control::set_override(false);
    }

    match cli.command {
        Command::Init => match init::initialize(cli.config).await {
            Ok(report) if report.created => {
                println!("llmprobe init: wrote {}", report.path.display());
                ExitCode::SUCCESS
            }
            Ok(report) => {
                println!("llmprobe init: kept existing {}", report.path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "init failed");
                eprintln!("llmprobe init: {e:#}");
                ExitCode::FAILURE
            }
        },
        Command::Deepseek(args) => {
            let opts = RunOptions {
                args: args.common,
                api_version: args.api_version,
                skip_rate_limits: args.skip_rate_limits,
            };
            ExitCode::from(run_target(Target::DeepSeek, opts, cli.config).await)
        }
        Command::Qwen(args) => {
            ExitCode::from(run_target(Target::Qwen, RunOptions::from(args), cli.config).await)
        }
        Command::QwenNative(args) => ExitCode::from(
            run_target(Target::QwenNative, RunOptions::from(args), cli.config).await,
        ),
    }
}

struct RunOptions {
    args: TargetArgs,
    api_version: Option<String>,
    skip_rate_limits: bool,
}

impl From<TargetArgs> for RunOptions {
    fn from(args: TargetArgs) -> Self {
        Self {
            args,
            api_version: None,
            skip_rate_limits: false,
        }
    }
}

async fn run_target(target: Target, opts: RunOptions, config_path: Option<PathBuf>) -> u8 {
    let policy = target.exit_policy();
    let reporter = ConsoleReporter::new(opts.args.verbose);
    match probe_target(target, &opts, config_path, &reporter).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(target_name = target.config_key(), error = %e, "probe run aborted");
            reporter.error(&format!("Tests failed with unexpected error: {e:#}"));
            policy.fatal_code()
        }
    }
}

async fn probe_target(
    target: Target,
    opts: &RunOptions,
    config_path: Option<PathBuf>,
    reporter: &dyn Reporter,
) -> anyhow::Result<u8> {
    let policy = target.exit_policy();
    let cfg = ProbeConfig::load(config_path).await?;
    if !cfg.general.color {
        colored::control::set_override(false);
    }

    let mut endpoint = cfg.overrides_for(target).apply(target.endpoint());
    if let Some(v) = opts.args.api_base.as_deref() {
        endpoint = endpoint.with_base_url(v);
    }
    if let Some(v) = opts.api_version.as_deref() {
        endpoint = endpoint.with_api_version(v);
    }
    if let Some(v) = opts.args.model.as_deref() {
        endpoint = endpoint.with_model(v);
    }

    reporter.info(&format!("Starting {} API tests...", target.display_name()));
    reporter.info(&format!("API Base: {}", endpoint.base_url));
    reporter.info(&format!("Model: {}", endpoint.model));
    reporter.debug(&format!(
        "Run started at {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));

    let api_key = match ApiKey::resolve(opts.args.api_key.as_deref(), endpoint.provider) {
        Ok(key) => key,
        Err(e) => {
            tracing::error!(error = %e, "missing credentials");
            reporter.error(&e.to_string());
            return Ok(policy.fatal_code());
        }
    };
    let client = LlmClient::from_key(api_key, endpoint)?;

    let ctx = ProbeContext {
        client: &client,
        reporter,
        pause: cfg.pause(),
    };
    let probes = target.probes(opts.skip_rate_limits);
    let results = suite::run_suite(&ctx, &probes).await;
    suite::print_summary(reporter, target.display_name(), &results);

    Ok(policy.exit_code(&results))
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(v) => v,
        Err(_) if verbose => EnvFilter::new("info,llmprobe=debug,probe_app=debug,probe_llm=debug"),
        Err(_) => EnvFilter::new("error"),
    };
    let span_events = if verbose {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let log_format = std::env::var("LLMPROBE_LOG_FORMAT")
        .unwrap_or_else(|_| "compact".to_string())
        .to_ascii_lowercase();

    match log_format.as_str() {
        "compact" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_span_events(span_events)
                .with_target(true)
                .with_writer(std::io::stderr)
                .compact()
                .init();
        }
        "pretty" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_span_events(span_events)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr)
                .pretty()
                .init();
        }
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_span_events(span_events)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr)
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .init();
        }
        other => {
            return Err(anyhow::anyhow!(
                "unsupported LLMPROBE_LOG_FORMAT={other:?}; expected one of: compact, pretty, json"
            ));
        }
    }

    tracing::debug!(log_format = %log_format, "tracing initialized");
    Ok(())
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info.location().map(ToString::to_string);
        tracing::error!(
            location = location.as_deref().unwrap_or("<unknown>"),
            payload = panic_message(info.payload()),
            "llmprobe panicked"
        );
        previous(info);
    }));
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}
