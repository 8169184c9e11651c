//! Audio extraction (S2): decode the video's audio track to WAV
//! (PCM signed 16-bit LE, 44.1 kHz, 2 channels) via FFmpeg.

use std::path::Path;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::progress::FfmpegProgress;

const SAMPLE_RATE: u32 = 44_100;
const CHANNELS: u8 = 2;

/// Extract the audio track of `input` into `output` as 16-bit PCM WAV.
pub async fn extract_audio<P, F>(input: P, output: P, progress_callback: F) -> MediaResult<()>
where
    P: AsRef<Path>,
    F: Fn(FfmpegProgress) + Send + 'static,
{
    let input = input.as_ref();
    let output = output.as_ref();

    info!(
        "Extracting audio: {} -> {} (pcm_s16le, {} Hz, {}ch)",
        input.display(),
        output.display(),
        SAMPLE_RATE,
        CHANNELS
    );

    let cmd = FfmpegCommand::new(input, output)
        .output_arg("-vn")
        .output_arg("-acodec")
        .output_arg("pcm_s16le")
        .output_arg("-ar")
        .output_arg(SAMPLE_RATE.to_string())
        .output_arg("-ac")
        .output_arg(CHANNELS.to_string());

    FfmpegRunner::new()
        .run_with_progress(&cmd, progress_callback)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_pcm_args() {
        let cmd = FfmpegCommand::new("in.mp4", "out.wav")
            .output_arg("-vn")
            .output_arg("-acodec")
            .output_arg("pcm_s16le")
            .output_arg("-ar")
            .output_arg(SAMPLE_RATE.to_string())
            .output_arg("-ac")
            .output_arg(CHANNELS.to_string());
        let args = cmd.build_args();
        assert!(args.contains(&"pcm_s16le".to_string()));
        assert!(args.contains(&"44100".to_string()));
        assert!(args.contains(&"2".to_string()));
    }
}
