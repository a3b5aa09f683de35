use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::audio::tempo::{TempoRange, MAX_TEMPO_DECIMALS};
use crate::error::{AnalysisError, Result};

const CONFIG_FILE: &str = "beatgrid.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Which tempo estimator feeds the beat-grid synthesizer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorKind {
    /// Peak-interval histogram with octave folding.
    #[default]
    Intervals,
    /// Envelope autocorrelation, corrected into the tempo range afterwards.
    Autocorrelation,
}

/// Parameters of a single analysis run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Amplitude threshold the peak search starts at
    #[serde(default = "default_initial_threshold")]
    pub initial_threshold: f32,
    /// Peak count that ends the threshold search early
    #[serde(default = "default_min_peaks")]
    pub min_peaks: usize,
    /// Lowest threshold the search may reach
    #[serde(default = "default_min_threshold")]
    pub min_threshold: f32,
    #[serde(default = "default_threshold_step")]
    pub threshold_step: f32,
    /// Low-pass cutoff applied before peak picking (Hz)
    #[serde(default = "default_lowpass_hz")]
    pub lowpass_hz: f32,
    #[serde(default = "default_tempo_range_low")]
    pub tempo_range_low: f64,
    #[serde(default = "default_tempo_range_high")]
    pub tempo_range_high: f64,
    /// Dead time after a detected peak (seconds)
    #[serde(default = "default_refractory_seconds")]
    pub refractory_seconds: f64,
    /// Successors each peak is paired with in the interval histogram
    #[serde(default = "default_neighbor_count")]
    pub neighbor_count: usize,
    /// Interval keys are rounded to a multiple of this many samples (1 = exact)
    #[serde(default = "default_interval_quantum")]
    pub interval_quantum: usize,
    /// Decimal places tempo candidates are bucketed to before merging
    #[serde(default = "default_tempo_decimals")]
    pub tempo_decimals: u32,
    #[serde(default)]
    pub estimator: EstimatorKind,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            initial_threshold: default_initial_threshold(),
            min_peaks: default_min_peaks(),
            min_threshold: default_min_threshold(),
            threshold_step: default_threshold_step(),
            lowpass_hz: default_lowpass_hz(),
            tempo_range_low: default_tempo_range_low(),
            tempo_range_high: default_tempo_range_high(),
            refractory_seconds: default_refractory_seconds(),
            neighbor_count: default_neighbor_count(),
            interval_quantum: default_interval_quantum(),
            tempo_decimals: default_tempo_decimals(),
            estimator: EstimatorKind::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn tempo_range(&self) -> TempoRange {
        TempoRange {
            low: self.tempo_range_low,
            high: self.tempo_range_high,
        }
    }

    /// Rejects malformed parameters before any work is done.
    ///
    /// The cutoff is only checked for sign here; the Nyquist bound depends on
    /// the buffer and is enforced by the pre-filter.
    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("initial_threshold", self.initial_threshold),
            ("min_threshold", self.min_threshold),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value <= 0.0 || value > 1.0 {
                return Err(AnalysisError::invalid(format!(
                    "{name} must lie in (0, 1], got {value}"
                )));
            }
        }
        if self.min_threshold > self.initial_threshold {
            return Err(AnalysisError::invalid(format!(
                "min_threshold ({}) exceeds initial_threshold ({})",
                self.min_threshold, self.initial_threshold
            )));
        }
        if !self.threshold_step.is_finite() || self.threshold_step <= 0.0 {
            return Err(AnalysisError::invalid(format!(
                "threshold_step must be positive, got {}",
                self.threshold_step
            )));
        }
        if !self.lowpass_hz.is_finite() || self.lowpass_hz <= 0.0 {
            return Err(AnalysisError::invalid(format!(
                "lowpass_hz must be positive, got {}",
                self.lowpass_hz
            )));
        }
        if !self.refractory_seconds.is_finite() || self.refractory_seconds <= 0.0 {
            return Err(AnalysisError::invalid(format!(
                "refractory_seconds must be positive, got {}",
                self.refractory_seconds
            )));
        }
        if self.min_peaks == 0 {
            return Err(AnalysisError::invalid("min_peaks must be at least 1"));
        }
        if self.neighbor_count == 0 {
            return Err(AnalysisError::invalid("neighbor_count must be at least 1"));
        }
        if self.interval_quantum == 0 {
            return Err(AnalysisError::invalid("interval_quantum must be at least 1"));
        }
        if self.tempo_decimals > MAX_TEMPO_DECIMALS {
            return Err(AnalysisError::invalid(format!(
                "tempo_decimals must be at most {MAX_TEMPO_DECIMALS}, got {}",
                self.tempo_decimals
            )));
        }
        self.tempo_range().validate()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub pretty: bool,
    #[serde(default = "default_include_grid")]
    pub include_grid: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            pretty: false,
            include_grid: default_include_grid(),
        }
    }
}

fn default_initial_threshold() -> f32 { 0.9 }
fn default_min_peaks() -> usize { 30 }
fn default_min_threshold() -> f32 { 0.3 }
fn default_threshold_step() -> f32 { 0.05 }
fn default_lowpass_hz() -> f32 { 150.0 }
fn default_tempo_range_low() -> f64 { 80.0 }
fn default_tempo_range_high() -> f64 { 160.0 }
fn default_refractory_seconds() -> f64 { 0.25 }
fn default_neighbor_count() -> usize { 10 }
fn default_interval_quantum() -> usize { 1 }
fn default_tempo_decimals() -> u32 { 1 }
fn default_include_grid() -> bool { true }

/// Resolves the config file: an explicit path wins, then `beatgrid.toml` in the
/// working directory, then the per-user config locations.
pub fn find_config_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("beatgrid").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("beatgrid").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    })
}

pub fn load_config(path: &Path) -> Option<Config> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            log::warn!("Cannot read {}: {}", path.display(), err);
            return None;
        }
    };
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Option<Config> {
    match toml::from_str(content) {
        Ok(cfg) => Some(cfg),
        Err(err) => {
            log::warn!("Invalid config: {}", err);
            None
        }
    }
}
