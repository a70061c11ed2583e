//! Audio decoding via Symphonia.
//!
//! Contract: decode to a single-channel sample array plus the source
//! sample rate. Multi-channel sources contribute their first channel
//! only; no resampling happens here.

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use lucidscan_core::{AudioClip, Modality};

use crate::error::{DetectError, DetectResult};

pub(crate) fn decode_audio(bytes: Vec<u8>) -> DetectResult<AudioClip> {
    let decode_err = |e: SymphoniaError| DetectError::decode(Modality::Audio, e);

    let stream = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(decode_err)?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| {
            DetectError::decode_msg(Modality::Audio, "container has no decodable audio track")
        })?;
    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.ok_or_else(|| {
        DetectError::decode_msg(Modality::Audio, "audio track does not declare a sample rate")
    })?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(decode_err)?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // End of stream surfaces as an unexpected-eof IO error.
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(decode_err(e)),
        };
        if packet.track_id() != track_id {
            continue;
        }
        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let channel_count = spec.channels.count().max(1);
                let mut buffer =
                    SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                samples.extend(buffer.samples().iter().step_by(channel_count));
            }
            // A malformed packet is skipped; the track may still decode.
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(decode_err(e)),
        }
    }

    if samples.is_empty() {
        return Err(DetectError::decode_msg(
            Modality::Audio,
            "no audio samples decoded from input",
        ));
    }

    tracing::debug!(
        samples = samples.len(),
        sample_rate,
        "audio decoded to mono PCM"
    );
    AudioClip::new(samples, sample_rate)
        .map_err(|e| DetectError::decode(Modality::Audio, e))
}
