use clap::Parser;
use std::path::PathBuf;

use beatgrid::config::{Config, OutputFormat};
use beatgrid::EstimatorKind;

#[derive(Parser, Debug)]
#[command(name = "beatgrid", about = "Detect the tempo and beat grid of audio files")]
pub struct Cli {
    /// Input audio files (WAV, MP3, FLAC, OGG)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Config file (defaults to beatgrid.toml or the user config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Low-pass cutoff in Hz applied before peak picking
    #[arg(long)]
    pub lowpass_hz: Option<f32>,

    /// Lower bound of the canonical tempo range
    #[arg(long)]
    pub min_bpm: Option<f64>,

    /// Upper bound of the canonical tempo range (at least twice --min-bpm)
    #[arg(long)]
    pub max_bpm: Option<f64>,

    /// Tempo estimator
    #[arg(long, value_enum)]
    pub estimator: Option<EstimatorKind>,

    /// Round peak intervals to this many samples (e.g. 100) before counting
    #[arg(long)]
    pub quantum: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Omit beat grids from the output
    #[arg(long)]
    pub no_grid: bool,

    /// Also report the playback rate that brings each track to this tempo
    #[arg(long)]
    pub target_bpm: Option<f64>,
}

impl Cli {
    /// Flags given on the command line override the file values.
    pub fn apply(&self, cfg: &mut Config) {
        if let Some(hz) = self.lowpass_hz {
            cfg.analysis.lowpass_hz = hz;
        }
        if let Some(low) = self.min_bpm {
            cfg.analysis.tempo_range_low = low;
        }
        if let Some(high) = self.max_bpm {
            cfg.analysis.tempo_range_high = high;
        }
        if let Some(kind) = self.estimator {
            cfg.analysis.estimator = kind;
        }
        if let Some(quantum) = self.quantum {
            cfg.analysis.interval_quantum = quantum;
        }
        if let Some(format) = self.format {
            cfg.output.format = format;
        }
        if self.pretty {
            cfg.output.pretty = true;
        }
        if self.no_grid {
            cfg.output.include_grid = false;
        }
    }
}
