#![allow(clippy::result_large_err)]

use anyhow::{anyhow, Context};
use ssm_ready::config::ReadyConfig;
use ssm_ready::control_plane::{ControlPlaneScript, ScriptedControlPlane};
use ssm_ready::readiness::ReadinessOrchestrator;
use ssm_ready::telemetry;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct Overrides {
    config_path: Option<String>,
    instance_ids: Vec<String>,
    timeout: Option<u64>,
    interval: Option<u64>,
    script_path: Option<String>,
}

enum CliCommand {
    Wait(Overrides),
    Validate(Overrides),
    Help,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise telemetry")?;

    match parse_cli_args(std::env::args().skip(1))? {
        CliCommand::Wait(overrides) => run_wait(overrides).await,
        CliCommand::Validate(overrides) => run_validate(overrides),
        CliCommand::Help => {
            print_help();
            Ok(())
        }
    }
}

async fn run_wait(overrides: Overrides) -> anyhow::Result<()> {
    let config = resolve_config(overrides)?;
    let request = config.request().context("invalid readiness request")?;

    let script_path = config
        .script_path
        .as_deref()
        .ok_or_else(|| anyhow!("no control plane configured; pass --script <PATH>"))?;
    let script = ControlPlaneScript::from_path(script_path)?;
    let plane = ScriptedControlPlane::new(script);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling readiness wait");
            signal_token.cancel();
        }
    });

    let token = ReadinessOrchestrator::new(&plane, &plane)
        .with_shutdown(shutdown)
        .wait(&request)
        .await
        .context("readiness wait failed")?;

    println!("{token}");
    Ok(())
}

fn run_validate(overrides: Overrides) -> anyhow::Result<()> {
    let config = resolve_config(overrides)?;
    let request = config.request().context("invalid readiness request")?;
    let policy = request.status_policy();

    println!("instances: {}", request.instance_ids().len());
    for id in request.instance_ids() {
        println!("  - {id}");
    }
    println!("timeout: {}s", policy.timeout.as_secs());
    println!("interval: {}s", policy.interval.as_secs());
    if policy.interval_exceeds_timeout() {
        println!("warning: interval is not shorter than timeout; only one poll will run");
    }
    Ok(())
}

fn resolve_config(overrides: Overrides) -> anyhow::Result<ReadyConfig> {
    let mut config = match overrides.config_path.as_deref() {
        Some(path) => ReadyConfig::load_from(path)
            .with_context(|| format!("failed to load configuration `{path}`"))?,
        None => ReadyConfig::load().context("failed to load configuration")?,
    };

    if !overrides.instance_ids.is_empty() {
        config.instance_ids = overrides.instance_ids;
    }
    if let Some(timeout) = overrides.timeout {
        config.timeout = timeout;
    }
    if let Some(interval) = overrides.interval {
        config.interval = interval;
    }
    if overrides.script_path.is_some() {
        config.script_path = overrides.script_path;
    }
    Ok(config)
}

fn parse_cli_args<I>(args: I) -> anyhow::Result<CliCommand>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter().peekable();
    let validate = args.peek().map(String::as_str) == Some("validate");
    if validate {
        args.next();
    }

    let mut overrides = Overrides::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                if overrides.config_path.is_some() {
                    anyhow::bail!("config path specified multiple times");
                }
                overrides.config_path = Some(expect_value(&mut args, &arg)?);
            }
            "-i" | "--instance" => overrides.instance_ids.push(expect_value(&mut args, &arg)?),
            "--timeout" => overrides.timeout = Some(expect_seconds(&mut args, &arg)?),
            "--interval" => overrides.interval = Some(expect_seconds(&mut args, &arg)?),
            "--script" => overrides.script_path = Some(expect_value(&mut args, &arg)?),
            "-h" | "--help" => return Ok(CliCommand::Help),
            other => anyhow::bail!("unrecognised argument `{other}`"),
        }
    }

    if validate {
        Ok(CliCommand::Validate(overrides))
    } else {
        Ok(CliCommand::Wait(overrides))
    }
}

fn expect_value<I>(args: &mut I, flag: &str) -> anyhow::Result<String>
where
    I: Iterator<Item = String>,
{
    args.next().ok_or_else(|| anyhow!("expected value after {flag}"))
}

fn expect_seconds<I>(args: &mut I, flag: &str) -> anyhow::Result<u64>
where
    I: Iterator<Item = String>,
{
    let raw = expect_value(args, flag)?;
    raw.parse::<u64>()
        .with_context(|| format!("{flag} expects whole seconds, got `{raw}`"))
}

fn print_help() {
    println!(
        "\
Usage: ssm-ready [OPTIONS] --script <PATH>
       ssm-ready validate [OPTIONS]

Waits until every instance reports online and is present in inventory, then prints
an `ssm-ready-<unix-seconds>` token. Progress is logged to stderr.

Options:
  -c, --config <PATH>      Configuration file (default: config/local, optional)
  -i, --instance <ID>      Instance id to wait for (repeatable; replaces configured ids)
      --timeout <SECS>     Status phase timeout (default: 300)
      --interval <SECS>    Seconds between status polls (default: 10)
      --script <PATH>      Scripted control plane responses (YAML)
  -h, --help               Print this help

Environment:
  SSM_READY__INSTANCE_IDS, SSM_READY__TIMEOUT, SSM_READY__INTERVAL, SSM_READY__SCRIPT_PATH
  RUST_LOG                 Log filter (default: ssm_ready=info,info)"
    );
}
