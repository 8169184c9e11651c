//! Clip extraction (S6): cut a padded, word-boundary-aligned window out of
//! the source video into its own file.

use std::path::Path;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::MediaResult;
use crate::progress::FfmpegProgress;

const VIDEO_CODEC: &str = "libx264";
const VIDEO_PRESET: &str = "veryfast";
const VIDEO_CRF: u8 = 20;
const AUDIO_CODEC: &str = "aac";
const AUDIO_BITRATE: &str = "128k";

/// Extract `[start_secs, end_secs)` from `input` into `output`, re-encoded.
pub async fn extract_segment<P, F>(
    input: P,
    output: P,
    start_secs: f64,
    end_secs: f64,
    progress_callback: F,
) -> MediaResult<()>
where
    P: AsRef<Path>,
    F: Fn(FfmpegProgress) + Send + 'static,
{
    let input = input.as_ref();
    let output = output.as_ref();
    let duration = (end_secs - start_secs).max(0.0);

    info!(
        "Extracting clip: {} [{:.2}-{:.2}] -> {}",
        input.display(),
        start_secs,
        end_secs,
        output.display()
    );

    let cmd = FfmpegCommand::new(input, output)
        .seek(start_secs)
        .duration(duration)
        .video_codec(VIDEO_CODEC)
        .preset(VIDEO_PRESET)
        .crf(VIDEO_CRF)
        .audio_codec(AUDIO_CODEC)
        .audio_bitrate(AUDIO_BITRATE);

    FfmpegRunner::new()
        .run_with_progress(&cmd, progress_callback)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_duration_never_negative() {
        // end before start (shouldn't happen upstream, but the clamp guards it)
        let cmd = FfmpegCommand::new("in.mp4", "out.mp4").seek(10.0).duration((5.0_f64 - 10.0).max(0.0));
        let args = cmd.build_args();
        assert!(args.contains(&"0.000".to_string()));
    }
}
