mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use beatgrid::config::{self, Config, OutputConfig, OutputFormat};
use beatgrid::{analyze_file, playback_rate, round_bpm, AnalysisError, AnalysisResult};
use cli::Cli;

struct FileOutcome {
    path: PathBuf,
    result: Result<AnalysisResult, AnalysisError>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let mut cfg = match config::find_config_path(cli.config.clone()) {
        Some(path) => match config::load_config(&path) {
            Some(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            None => {
                log::warn!("Failed to load config from {}", path.display());
                Config::default()
            }
        },
        None => Config::default(),
    };
    cli.apply(&mut cfg);
    cfg.analysis.validate().context("Invalid analysis configuration")?;

    for input in &cli.inputs {
        if !input.exists() {
            anyhow::bail!("Input file not found: {}", input.display());
        }
    }

    log::info!("Analyzing {} file(s) with the {:?} estimator", cli.inputs.len(), cfg.analysis.estimator);

    let pb = ProgressBar::new(cli.inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files ({eta} remaining)")
            .context("Invalid progress bar template")?
            .progress_chars("=>-"),
    );

    let outcomes: Vec<FileOutcome> = cli
        .inputs
        .par_iter()
        .map(|path| {
            let result = analyze_file(path, &cfg.analysis);
            pb.inc(1);
            FileOutcome {
                path: path.clone(),
                result,
            }
        })
        .collect();

    pb.finish_and_clear();

    let mut failed = 0;
    for outcome in &outcomes {
        if let Err(err) = &outcome.result {
            log::error!("Could not determine BPM for {}: {}", outcome.path.display(), err);
            failed += 1;
        }
        let line = match cfg.output.format {
            OutputFormat::Json => json_line(outcome, &cfg.output, cli.target_bpm)?,
            OutputFormat::Text => text_line(outcome, cli.target_bpm),
        };
        println!("{}", line);
    }

    if failed > 0 {
        anyhow::bail!("{} of {} file(s) could not be analyzed", failed, outcomes.len());
    }
    Ok(())
}

fn rate_for(result: &AnalysisResult, target_bpm: Option<f64>) -> Option<f64> {
    let target = target_bpm?;
    match playback_rate(result.bpm, target) {
        Ok(rate) => Some(rate),
        Err(err) => {
            log::warn!("No playback rate for target {}: {}", target, err);
            None
        }
    }
}

fn json_line(outcome: &FileOutcome, output: &OutputConfig, target_bpm: Option<f64>) -> Result<String> {
    let record = match &outcome.result {
        Ok(result) => {
            let mut value = serde_json::to_value(result)?;
            if let Value::Object(map) = &mut value {
                if !output.include_grid {
                    map.remove("beatGrid");
                }
                map.insert("file".into(), json!(display(&outcome.path)));
                if let Some(rate) = rate_for(result, target_bpm) {
                    map.insert("playbackRate".into(), json!(rate));
                }
            }
            value
        }
        Err(err) => json!({ "file": display(&outcome.path), "error": err.to_string() }),
    };
    let line = if output.pretty {
        serde_json::to_string_pretty(&record)?
    } else {
        serde_json::to_string(&record)?
    };
    Ok(line)
}

fn text_line(outcome: &FileOutcome, target_bpm: Option<f64>) -> String {
    let name = display(&outcome.path);
    match &outcome.result {
        Ok(result) => {
            let mut line = format!(
                "{}: {:.1} BPM, first beat {:.3}s, {} beats over {:.1}s",
                name,
                round_bpm(result.bpm),
                result.offset_seconds,
                result.beat_grid.len(),
                result.duration
            );
            if let Some(rate) = rate_for(result, target_bpm) {
                line.push_str(&format!(", playback rate {:.4}", rate));
            }
            line
        }
        Err(err) => format!("{}: could not determine BPM ({})", name, err),
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
