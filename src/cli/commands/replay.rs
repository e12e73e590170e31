//! Replay command implementation.

use anyhow::{Context, Result};
use rotator_config::{load_config, AppConfig};
use rotator_core::types::Security;
use rotator_data::{load_universe, parse_date, ReplayFeed};
use rotator_engine::{PresetRegistry, RotationConfig, RotationEngine};
use rotator_monitor::{log_engine_state, render_engine_state};
use rotator_replay::ReplayRunner;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::cli::{OutputFormat, ReplayArgs};

pub async fn run(args: ReplayArgs, config_path: &Path) -> Result<()> {
    let app = if config_path.exists() {
        load_config(config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?
    } else {
        warn!(path = %config_path.display(), "config file not found, using defaults");
        AppConfig::default()
    };

    let engine_config = engine_config(&args, &app)?;
    let universe = engine_config.universe.clone();
    let mut engine = RotationEngine::new(engine_config).context("Failed to create engine")?;

    let mut settings = app.replay.clone();
    if let Some(capital) = args.capital {
        settings.initial_capital = capital;
    }
    if let Some(start) = &args.start {
        settings.start_date = Some(parse_date(start)?);
    }
    if let Some(end) = &args.end {
        settings.end_date = Some(parse_date(end)?);
    }
    settings.validate()?;

    let data_dir = args
        .data
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.data_dir));
    if !data_dir.is_dir() {
        anyhow::bail!(
            "Data directory '{}' does not exist. Provide a directory containing one CSV per security (e.g. --data ./data)",
            data_dir.display()
        );
    }

    let histories = load_universe(&data_dir, &universe)
        .with_context(|| format!("Failed to load histories from {}", data_dir.display()))?;
    let mut feed = ReplayFeed::new(&universe, histories)?
        .with_range(settings.start_date, settings.end_date);
    if let Some((first, last)) = feed.date_range() {
        info!(%first, %last, bars = feed.len(), "replay window");
    }

    let runner = ReplayRunner::new(settings.runner_config());
    let report = runner.run(&mut engine, &mut feed).await?;

    match args.output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => {
            println!("{}", report.summary());
            println!("{}", render_engine_state(&report.final_state));
        }
    }
    log_engine_state(&report.final_state);

    if let Some(save_path) = &args.save {
        std::fs::write(save_path, report.to_json()?)?;
        info!("Report saved to {:?}", save_path);
    }
    if let Some(csv_path) = &args.equity_csv {
        std::fs::write(csv_path, report.equity_to_csv())?;
        info!("Equity curve saved to {:?}", csv_path);
    }

    Ok(())
}

fn engine_config(args: &ReplayArgs, app: &AppConfig) -> Result<RotationConfig> {
    let universe: Vec<Security> = if args.symbols.is_empty() {
        app.engine.universe.clone()
    } else {
        args.symbols.iter().map(|s| Security::new(s.trim())).collect()
    };
    if universe.is_empty() {
        anyhow::bail!("No universe configured. Set [engine] universe or pass --symbols");
    }

    match &args.preset {
        Some(preset) => {
            let overrides = match &args.overrides {
                Some(raw) => serde_json::from_str(raw).context("Invalid --overrides JSON")?,
                None => serde_json::Value::Null,
            };
            info!(preset = %preset, securities = universe.len(), "using preset");
            Ok(PresetRegistry::new().config(preset, overrides, universe)?)
        }
        None => Ok(RotationConfig {
            universe,
            ..app.engine.clone()
        }),
    }
}
