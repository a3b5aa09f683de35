use crate::error::{AnalysisError, Result};

/// Decoded PCM audio, one `Vec<f32>` per channel. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl SampleBuffer {
    /// Builds a buffer from planar channel data. Every channel must have the
    /// same length and there must be at least one.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(AnalysisError::invalid("sample rate must be positive"));
        }
        let Some(first) = channels.first() else {
            return Err(AnalysisError::invalid("buffer has no channels"));
        };
        let len = first.len();
        if let Some(bad) = channels.iter().position(|c| c.len() != len) {
            return Err(AnalysisError::invalid(format!(
                "channel {} has {} samples, expected {}",
                bad,
                channels[bad].len(),
                len
            )));
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    pub fn mono(sample_rate: u32, samples: Vec<f32>) -> Result<Self> {
        Self::new(sample_rate, vec![samples])
    }

    /// Splits interleaved frames into planar channels. A trailing partial
    /// frame is dropped.
    pub fn from_interleaved(sample_rate: u32, channel_count: usize, interleaved: &[f32]) -> Result<Self> {
        if channel_count == 0 {
            return Err(AnalysisError::invalid("channel count must be positive"));
        }
        let frames = interleaved.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in interleaved.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self::new(sample_rate, channels)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn duration(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_is_derived_from_length() {
        let buf = SampleBuffer::mono(48000, vec![0.0; 24000]).unwrap();
        assert_eq!(buf.len(), 24000);
        assert!((buf.duration() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn deinterleaves_frames() {
        let buf = SampleBuffer::from_interleaved(44100, 2, &[0.1, -0.1, 0.2, -0.2, 0.3]).unwrap();
        assert_eq!(buf.channel_count(), 2);
        assert_eq!(buf.channel(0).unwrap(), &[0.1, 0.2]);
        assert_eq!(buf.channel(1).unwrap(), &[-0.1, -0.2]);
    }

    #[test]
    fn rejects_ragged_channels() {
        let err = SampleBuffer::new(44100, vec![vec![0.0; 4], vec![0.0; 3]]).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter(_)));
    }

    #[test]
    fn rejects_zero_rate_and_no_channels() {
        assert!(SampleBuffer::mono(0, vec![0.0]).is_err());
        assert!(SampleBuffer::new(44100, Vec::new()).is_err());
    }
}
