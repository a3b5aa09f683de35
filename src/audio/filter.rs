use rayon::prelude::*;

use super::buffer::SampleBuffer;
use crate::error::{AnalysisError, Result};

/// Single-pole low-pass: `y[n] = y[n-1] + a * (x[n] - y[n-1])`.
#[derive(Clone, Copy, Debug)]
pub struct LowPass {
    cutoff_hz: f32,
    coefficient: f32,
}

impl LowPass {
    /// Fails unless `0 < cutoff_hz < sample_rate / 2`.
    pub fn new(cutoff_hz: f32, sample_rate: u32) -> Result<Self> {
        let nyquist = sample_rate as f32 / 2.0;
        if !cutoff_hz.is_finite() || cutoff_hz <= 0.0 || cutoff_hz >= nyquist {
            return Err(AnalysisError::invalid(format!(
                "low-pass cutoff {cutoff_hz}Hz outside (0, {nyquist}Hz)"
            )));
        }
        let omega = 2.0 * std::f64::consts::PI * cutoff_hz as f64 / sample_rate as f64;
        Ok(Self {
            cutoff_hz,
            coefficient: (1.0 - (-omega).exp()) as f32,
        })
    }

    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }

    /// Filters a whole channel from a zero initial state.
    pub fn apply(&self, input: &[f32]) -> Vec<f32> {
        let a = self.coefficient;
        let mut state = 0.0f32;
        input
            .iter()
            .map(|&x| {
                state += a * (x - state);
                state
            })
            .collect()
    }
}

/// Renders a filter over a complete buffer before anything downstream runs.
///
/// One renderer is created per analysis and dropped with it, so concurrent
/// analyses never share filter state. Channels render in parallel.
pub struct OfflineRenderer<'a> {
    source: &'a SampleBuffer,
}

impl<'a> OfflineRenderer<'a> {
    pub fn new(source: &'a SampleBuffer) -> Self {
        Self { source }
    }

    pub fn render(&self, filter: &LowPass) -> Result<SampleBuffer> {
        let channels: Vec<Vec<f32>> = self
            .source
            .channels()
            .collect::<Vec<_>>()
            .into_par_iter()
            .map(|samples| filter.apply(samples))
            .collect();
        SampleBuffer::new(self.source.sample_rate(), channels)
    }
}

/// Low-pass filters every channel of `buffer` at `cutoff_hz`.
pub fn lowpass(buffer: &SampleBuffer, cutoff_hz: f32) -> Result<SampleBuffer> {
    let filter = LowPass::new(cutoff_hz, buffer.sample_rate())?;
    log::debug!(
        "Rendering {}Hz low-pass over {} channel(s) x {} samples",
        filter.cutoff_hz(),
        buffer.channel_count(),
        buffer.len()
    );
    OfflineRenderer::new(buffer).render(&filter)
}
