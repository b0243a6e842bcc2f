//! Developer tool: normalize an alignment payload and print its timeline.
//!
//! ```text
//! lipsync-timeline <payload.json> [--text TEXT] [--at SECONDS]...
//! ```
//!
//! Prints the viseme timeline as JSON on stdout, followed by the resolved
//! viseme for every `--at` position. Diagnostics go to stderr.

use anyhow::{Context, bail};
use lipsync::{AlignmentSource, LipSyncConfig, Normalizer};
use std::path::PathBuf;

const USAGE: &str = "usage: lipsync-timeline <payload.json> [--text TEXT] [--at SECONDS]...";

struct Args {
    payload: PathBuf,
    text: String,
    probes: Vec<f64>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut payload = None;
    let mut text = String::new();
    let mut probes = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--text" => text = args.next().context(USAGE)?,
            "--at" => {
                let raw = args.next().context(USAGE)?;
                let secs: f64 = raw
                    .parse()
                    .with_context(|| format!("invalid --at value: {raw}"))?;
                probes.push(secs);
            }
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            _ if payload.is_none() => payload = Some(PathBuf::from(arg)),
            other => bail!("unexpected argument: {other}\n{USAGE}"),
        }
    }

    Ok(Args {
        payload: payload.context(USAGE)?,
        text,
        probes,
    })
}

fn load_config() -> anyhow::Result<LipSyncConfig> {
    let path = LipSyncConfig::default_config_path();
    if !path.exists() {
        return Ok(LipSyncConfig::default());
    }
    let config = LipSyncConfig::from_file(&path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    config.validate()?;
    tracing::info!(path = %path.display(), "loaded lip-sync config");
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("lipsync=info")),
        )
        .init();

    let args = parse_args()?;
    let config = load_config()?;

    let raw = std::fs::read_to_string(&args.payload)
        .with_context(|| format!("failed to read {}", args.payload.display()))?;
    let source = AlignmentSource::parse_str(&raw);
    tracing::info!(
        payload = %args.payload.display(),
        source = source.kind(),
        "parsed alignment payload"
    );

    let normalizer = Normalizer::new(config.normalizer.clone());
    let timeline = normalizer.normalize_source(source, &args.text);

    println!("{}", timeline.to_json_pretty()?);
    for t in args.probes {
        let viseme = timeline.resolve(t);
        println!("{t:.3}s\t{viseme}\t{}", config.assets.asset_for(viseme));
    }
    Ok(())
}
