//! ffmpeg-based audio conversion shared by TTS and transcription.

use std::ffi::OsStr;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use super::{MediaError, ScratchFile};

/// Run an external tool, failing on timeout or a non-zero exit.
///
/// Returns stdout.
pub(crate) async fn run_tool<I, S>(program: &str, args: I, limit: Duration) -> Result<Vec<u8>, MediaError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| MediaError::Process(format!("failed to run {program}: {e}")))?;

    let output = tokio::time::timeout(limit, child.wait_with_output())
        .await
        .map_err(|_| MediaError::Timeout)?
        .map_err(|e| MediaError::Process(format!("{program} failed: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: String = stderr.chars().rev().take(300).collect::<Vec<_>>().into_iter().rev().collect();
        return Err(MediaError::Process(format!("{program} exited with {}: {}", output.status, tail)));
    }
    Ok(output.stdout)
}

/// Convert WAV audio to OGG Opus for Telegram voice messages.
///
/// Pads 300ms of silence at the start; Telegram clips the first ~200ms on playback.
pub async fn wav_to_ogg(wav_data: &[u8], limit: Duration) -> Result<ScratchFile, MediaError> {
    let input = ScratchFile::write(".wav", wav_data).await?;
    let output = ScratchFile::with_suffix(".ogg")?;

    run_tool(
        "ffmpeg",
        [
            OsStr::new("-y"),
            OsStr::new("-f"),
            OsStr::new("lavfi"),
            OsStr::new("-i"),
            OsStr::new("anullsrc=r=44100:cl=mono"),
            OsStr::new("-i"),
            input.path().as_os_str(),
            OsStr::new("-filter_complex"),
            OsStr::new("[0]atrim=0:0.3[silence];[silence][1:a]concat=n=2:v=0:a=1"),
            OsStr::new("-c:a"),
            OsStr::new("libopus"),
            OsStr::new("-b:a"),
            OsStr::new("64k"),
            output.path().as_os_str(),
        ],
        limit,
    )
    .await?;

    debug!("Converted {} bytes of WAV to {}", wav_data.len(), output.path().display());
    Ok(output)
}

/// Decode any ffmpeg-readable audio to 16KHz mono f32 PCM samples.
pub async fn to_pcm_16k(data: &[u8], limit: Duration) -> Result<Vec<f32>, MediaError> {
    // ffmpeg needs seekable input for OGG
    let input = ScratchFile::write(".audio", data).await?;

    let raw = run_tool(
        "ffmpeg",
        [
            OsStr::new("-i"),
            input.path().as_os_str(),
            OsStr::new("-ar"),
            OsStr::new("16000"),
            OsStr::new("-ac"),
            OsStr::new("1"),
            OsStr::new("-f"),
            OsStr::new("s16le"),
            OsStr::new("-acodec"),
            OsStr::new("pcm_s16le"),
            OsStr::new("-y"),
            OsStr::new("pipe:1"),
        ],
        limit,
    )
    .await?;

    let samples = pcm_s16le_to_f32(&raw);
    debug!("Decoded {} bytes into {} samples", data.len(), samples.len());
    Ok(samples)
}

fn pcm_s16le_to_f32(raw: &[u8]) -> Vec<f32> {
    raw.chunks_exact(2)
        .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]) as f32 / 32768.0)
        .collect()
}

/// Format seconds as `m:ss`.
pub fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
