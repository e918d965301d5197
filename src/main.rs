//! Command-line entry point.
//!
//! Parses the flag surface, establishes the session, and hands everything to
//! the orchestrator. Structured records go to stdout; progress and diagnostics
//! go to stderr through tracing so the two streams never mix.

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use trailprobe::catalog::{default_models_dir, BotocoreCatalog};
use trailprobe::client::SigningClientFactory;
use trailprobe::config::RunConfig;
use trailprobe::orchestrator::Orchestrator;
use trailprobe::recorder::Recorder;
use trailprobe::session::make_session;
use tracing_subscriber::prelude::*;

const USAGE: &str = "\
trailprobe - simulate AWS API calls (no AssumeRole, no analysis)

USAGE:
    trailprobe --aws-services ec2,s3,lambda [OPTIONS]

OPTIONS:
    --aws-services LIST   Comma-separated service list (required)
    --region REGION       AWS region [default: us-east-1]
    --profile NAME        Local credential profile to use
    --rate N              Max calls per second per service [default: 5]
    --max-ops N           Max operations to attempt per service [default: 30]
    --include-dryrun      Include DryRun-capable mutating APIs
    --min-dryrun N        Ensure at least this many DryRun ops [default: 5]
    --aggressive          Include representative non-dryrun WRITE ops with
                          bogus IDs to force safe server-side failure
                          (CloudTrail will log)
    --all-ops             Attempt EVERY operation per service (up to --max-ops)
    --only-safe           Only call read-only ops (List/Get/Describe/Head)
    --verbose             Log selected operations before execution
    --threads N           Concurrent workers per service [default: 1]
    --parallel-services   Run multiple services in parallel
    --models-dir DIR      Service model root [default: $AWS_DATA_PATH,
                          then ~/.aws/models]
    --help                Print this help
";

fn parse_args(args: &[String]) -> Result<RunConfig> {
    let mut config = RunConfig::default();
    let mut models_dir: Option<PathBuf> = None;

    let mut iter = args.iter();
    let mut value_for = |flag: &str, iter: &mut std::slice::Iter<'_, String>| -> Result<String> {
        iter.next()
            .cloned()
            .with_context(|| format!("{} requires a value", flag))
    };

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--aws-services" => {
                let list = value_for(arg, &mut iter)?;
                config.services = list
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            "--region" => config.region = value_for(arg, &mut iter)?,
            "--profile" => config.profile = Some(value_for(arg, &mut iter)?),
            "--rate" => {
                config.rate_per_second = value_for(arg, &mut iter)?
                    .parse()
                    .context("--rate must be an integer")?
            }
            "--max-ops" => {
                config.max_ops_per_service = value_for(arg, &mut iter)?
                    .parse()
                    .context("--max-ops must be an integer")?
            }
            "--min-dryrun" => {
                config.min_dry_run = value_for(arg, &mut iter)?
                    .parse()
                    .context("--min-dryrun must be an integer")?
            }
            "--threads" => {
                config.threads = value_for(arg, &mut iter)?
                    .parse()
                    .context("--threads must be an integer")?
            }
            "--models-dir" => models_dir = Some(PathBuf::from(value_for(arg, &mut iter)?)),
            "--include-dryrun" => config.include_dry_run = true,
            "--aggressive" => config.aggressive = true,
            "--all-ops" => config.all_ops = true,
            "--only-safe" => config.only_safe = true,
            "--verbose" => config.verbose = true,
            "--parallel-services" => config.parallel_services = true,
            "--help" | "-h" => {
                print!("{}", USAGE);
                std::process::exit(0);
            }
            other => bail!("unknown argument '{}'\n\n{}", other, USAGE),
        }
    }

    if config.services.is_empty() {
        bail!("--aws-services is required\n\n{}", USAGE);
    }
    config.models_dir = default_models_dir(models_dir.as_deref())?;
    Ok(config)
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("trailprobe=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = parse_args(&args)?;
    tracing::debug!("Run configuration: {:?}", config);

    let runtime = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
    runtime.block_on(async {
        let sdk_config = make_session(&config.region, config.profile.as_deref()).await;
        let catalog = Arc::new(BotocoreCatalog::new(config.models_dir.clone()));
        let clients = Arc::new(SigningClientFactory::new(sdk_config));
        let recorder = Arc::new(Recorder::stdout());
        Orchestrator::new(config, catalog, clients, recorder)
            .run()
            .await;
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_full_flag_surface() {
        let config = parse_args(&args(&[
            "--aws-services",
            "ec2, s3,,lambda",
            "--region",
            "eu-west-1",
            "--profile",
            "dev",
            "--rate",
            "10",
            "--max-ops",
            "50",
            "--include-dryrun",
            "--aggressive",
            "--threads",
            "4",
            "--parallel-services",
            "--models-dir",
            "/tmp/models",
        ]))
        .unwrap();
        assert_eq!(config.services, vec!["ec2", "s3", "lambda"]);
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.profile.as_deref(), Some("dev"));
        assert_eq!(config.rate_per_second, 10);
        assert_eq!(config.max_ops_per_service, 50);
        assert!(config.include_dry_run);
        assert!(config.aggressive);
        assert_eq!(config.threads, 4);
        assert!(config.parallel_services);
        assert_eq!(config.models_dir, PathBuf::from("/tmp/models"));
    }

    #[test]
    fn test_services_are_required() {
        assert!(parse_args(&args(&["--region", "us-east-1"])).is_err());
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(parse_args(&args(&["--aws-services", "ec2", "--bogus"])).is_err());
    }
}
