use std::path::Path;
use symphonia::core::audio::SampleBuffer as InterleavedBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::buffer::SampleBuffer;
use crate::error::{AnalysisError, Result};

fn incomplete(what: &str, path: &Path, err: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::AnalysisIncomplete(format!("{} ({}): {}", what, path.display(), err))
}

/// Decodes the first audio track of `path` into a planar [`SampleBuffer`].
///
/// Every decoder failure is reported as `AnalysisIncomplete`; corrupt packets
/// are skipped the way symphonia recommends.
pub fn decode_file(path: &Path) -> Result<SampleBuffer> {
    let file = std::fs::File::open(path).map_err(|e| incomplete("failed to open audio file", path, e))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| incomplete("failed to probe audio format", path, e))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| incomplete("no audio tracks found", path, "empty container"))?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count());
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| incomplete("unknown sample rate", path, "missing codec parameter"))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| incomplete("failed to create audio decoder", path, e))?;

    let mut interleaved: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => return Err(incomplete("failed to read packet", path, e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                log::debug!("Skipping corrupt packet: {}", msg);
                continue;
            }
            Err(e) => return Err(incomplete("failed to decode packet", path, e)),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();

        let mut sample_buf = InterleavedBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(sample_buf.samples());
    }

    let buffer = SampleBuffer::from_interleaved(sample_rate, channels, &interleaved)?;

    log::info!(
        "Decoded {}: {} samples x {} channel(s), {}Hz, {:.1}s",
        path.display(),
        buffer.len(),
        buffer.channel_count(),
        sample_rate,
        buffer.duration()
    );

    Ok(buffer)
}
