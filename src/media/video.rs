#[cfg(feature = "media-ffmpeg")]
use std::path::Path;
#[cfg(feature = "media-ffmpeg")]
use std::process::Command;

use crate::foundation::core::{Dimensions, Fps, Seconds};
use crate::foundation::error::DecodeError;
use crate::media::source::MediaSource;
#[cfg(feature = "media-ffmpeg")]
use crate::media::source::{RgbaFrame, Sequence};

/// Stream metadata reported by `ffprobe` for a video payload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoProbe {
    /// Display dimensions (after applying rotation metadata).
    pub dimensions: Dimensions,
    /// Nominal frame rate (`r_frame_rate`, falling back to `avg_frame_rate`).
    pub fps: Fps,
    /// Container duration in seconds, when reported.
    pub duration_secs: Option<f64>,
}

/// Probe a video payload through `ffprobe`.
///
/// The payload is streamed over stdin. Containers that must be seeked to be read (MP4 with its
/// `moov` atom after the media data) are retried from a temporary file.
#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(bytes: &[u8]) -> Result<VideoProbe, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Truncated);
    }
    with_seekable_retry(bytes, probe_from)
}

#[cfg(feature = "media-ffmpeg")]
fn probe_from(input: &Input<'_>) -> Result<VideoProbe, Attempt> {
    #[derive(serde::Deserialize)]
    struct SideData {
        rotation: Option<f64>,
    }
    #[derive(serde::Deserialize)]
    struct Tags {
        rotate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
        avg_frame_rate: Option<String>,
        side_data_list: Option<Vec<SideData>>,
        tags: Option<Tags>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let mut cmd = Command::new("ffprobe");
    cmd.args([
        "-v",
        "error",
        "-print_format",
        "json",
        "-show_streams",
        "-show_format",
    ]);
    input.push_arg(&mut cmd);
    let stdout = input
        .run(&mut cmd)
        .map_err(|e| DecodeError::tool(format!("failed to run ffprobe: {e}")))?
        .into_stdout()?;

    let parsed: ProbeOut = serde_json::from_slice(&stdout)
        .map_err(|e| DecodeError::tool(format!("ffprobe json parse failed: {e}")))?;
    let stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| DecodeError::unsupported("no video stream found"))?;
    let width = stream
        .width
        .ok_or_else(|| DecodeError::malformed("missing video width from ffprobe"))?;
    let height = stream
        .height
        .ok_or_else(|| DecodeError::malformed("missing video height from ffprobe"))?;

    let fps = [stream.r_frame_rate.as_deref(), stream.avg_frame_rate.as_deref()]
        .into_iter()
        .flatten()
        .find_map(crate::ffmpeg::parse_ff_ratio)
        .and_then(|(num, den)| Fps::new(num, den))
        .ok_or_else(|| DecodeError::invalid_source("video stream reports no usable frame rate"))?;

    let rotation = stream
        .side_data_list
        .iter()
        .flatten()
        .find_map(|sd| sd.rotation)
        .or_else(|| {
            stream
                .tags
                .as_ref()
                .and_then(|t| t.rotate.as_deref())
                .and_then(|r| r.trim().parse::<f64>().ok())
        })
        .unwrap_or(0.0);
    let quarter_turns = ((rotation / 90.0).round() as i64).rem_euclid(4);
    let dimensions = if quarter_turns % 2 == 1 {
        Dimensions::new(height, width)
    } else {
        Dimensions::new(width, height)
    };

    let duration_secs = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|s| s.parse::<f64>().ok());

    Ok(VideoProbe {
        dimensions,
        fps,
        duration_secs,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Probe a video payload through `ffprobe`.
///
/// Returns an error when the `media-ffmpeg` feature is disabled.
pub fn probe_video(_bytes: &[u8]) -> Result<VideoProbe, DecodeError> {
    Err(DecodeError::tool(
        "video inputs require the 'media-ffmpeg' feature",
    ))
}

#[cfg(feature = "media-ffmpeg")]
pub(crate) fn decode_video(bytes: &[u8], limit: Option<Seconds>) -> Result<MediaSource, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Truncated);
    }
    with_seekable_retry(bytes, |input| decode_from(input, limit))
}

#[cfg(feature = "media-ffmpeg")]
fn decode_from(input: &Input<'_>, limit: Option<Seconds>) -> Result<MediaSource, Attempt> {
    let info = probe_from(input)?;
    let expected_len = info
        .dimensions
        .rgba8_len()
        .filter(|&len| len > 0)
        .ok_or_else(|| {
            DecodeError::invalid_source(format!("unusable video dimensions {}", info.dimensions))
        })?;

    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-v", "error"]);
    input.push_arg(&mut cmd);
    cmd.arg("-an");
    if let Some(limit) = limit {
        let max_frames = limit.frames_ceil(info.fps).max(1);
        cmd.args(["-frames:v", &max_frames.to_string()]);
    }
    // Resample to the probed rate so variable-rate inputs map onto one nominal timeline.
    cmd.args([
        "-r",
        &format!("{}/{}", info.fps.num, info.fps.den),
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "pipe:1",
    ]);

    let stdout = input
        .run(&mut cmd)
        .map_err(|e| DecodeError::tool(format!("failed to run ffmpeg for video decode: {e}")))?
        .into_stdout()?;

    if stdout.is_empty() {
        return Err(DecodeError::malformed("ffmpeg produced no video frames").into());
    }
    if !stdout.len().is_multiple_of(expected_len) {
        return Err(DecodeError::malformed(format!(
            "decoded video has invalid size: got {} bytes, expected multiples of {expected_len}",
            stdout.len()
        ))
        .into());
    }

    let Dimensions { width, height } = info.dimensions;
    let frames = stdout
        .chunks_exact(expected_len)
        .map(|chunk| RgbaFrame::new(width, height, chunk.to_vec()))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(
        frames = frames.len(),
        fps = %info.fps,
        dims = %info.dimensions,
        "decoded video"
    );
    Ok(MediaSource::Sequence(Sequence::from_frames(frames, info.fps)?))
}

/// Where ffmpeg reads the payload from.
#[cfg(feature = "media-ffmpeg")]
enum Input<'a> {
    Pipe(&'a [u8]),
    File(&'a Path),
}

#[cfg(feature = "media-ffmpeg")]
impl Input<'_> {
    fn push_arg(&self, cmd: &mut Command) {
        cmd.arg("-i");
        match self {
            Self::Pipe(_) => cmd.arg("pipe:0"),
            Self::File(path) => cmd.arg(path),
        };
    }

    fn run(&self, cmd: &mut Command) -> std::io::Result<ToolOutput> {
        let out = match self {
            Self::Pipe(bytes) => crate::ffmpeg::run_with_input(cmd, bytes)?,
            Self::File(_) => crate::ffmpeg::run_detached(cmd)?,
        };
        Ok(ToolOutput(out))
    }
}

#[cfg(feature = "media-ffmpeg")]
struct ToolOutput(std::process::Output);

#[cfg(feature = "media-ffmpeg")]
impl ToolOutput {
    fn into_stdout(self) -> Result<Vec<u8>, Attempt> {
        if self.0.status.success() {
            Ok(self.0.stdout)
        } else {
            Err(Attempt::Failed(self.0.stderr))
        }
    }
}

/// Failure of one ffmpeg/ffprobe pass, keeping stderr so the caller can decide to retry.
#[cfg(feature = "media-ffmpeg")]
enum Attempt {
    Failed(Vec<u8>),
    Decode(DecodeError),
}

#[cfg(feature = "media-ffmpeg")]
impl From<DecodeError> for Attempt {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

#[cfg(feature = "media-ffmpeg")]
impl Attempt {
    fn into_decode_error(self) -> DecodeError {
        match self {
            Self::Failed(stderr) => classify_ffmpeg_failure(&stderr),
            Self::Decode(e) => e,
        }
    }
}

/// Run `pass` over stdin first; when the demuxer needs to seek, rerun it on a temporary copy.
#[cfg(feature = "media-ffmpeg")]
fn with_seekable_retry<T>(
    bytes: &[u8],
    pass: impl Fn(&Input<'_>) -> Result<T, Attempt>,
) -> Result<T, DecodeError> {
    match pass(&Input::Pipe(bytes)) {
        Err(Attempt::Failed(stderr)) if needs_seekable_input(&stderr) => {
            tracing::debug!(
                bytes = bytes.len(),
                "input is not streamable; retrying from a temporary file"
            );
            let spill = crate::ffmpeg::SpillFile::write(bytes)
                .map_err(|e| DecodeError::tool(format!("failed to spill video input: {e}")))?;
            pass(&Input::File(spill.path())).map_err(Attempt::into_decode_error)
        }
        other => other.map_err(Attempt::into_decode_error),
    }
}

#[cfg(not(feature = "media-ffmpeg"))]
pub(crate) fn decode_video(
    _bytes: &[u8],
    _limit: Option<Seconds>,
) -> Result<MediaSource, DecodeError> {
    Err(DecodeError::tool(
        "video inputs require the 'media-ffmpeg' feature",
    ))
}

/// ffmpeg diagnostics showing the demuxer needed to seek back, which stdin cannot do.
///
/// A payload that is actually cut short reports the same, so it is only classified after a
/// seekable retry.
#[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
pub(crate) fn needs_seekable_input(stderr: &[u8]) -> bool {
    let text = String::from_utf8_lossy(stderr).to_ascii_lowercase();
    text.contains("moov atom not found") || text.contains("partial file")
}

/// Map ffmpeg diagnostics onto the decode taxonomy.
#[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
pub(crate) fn classify_ffmpeg_failure(stderr: &[u8]) -> DecodeError {
    let text = String::from_utf8_lossy(stderr).to_ascii_lowercase();
    if text.contains("partial file")
        || text.contains("moov atom not found")
        || text.contains("end of file")
        || text.contains("truncat")
    {
        return DecodeError::Truncated;
    }
    let summary = summarize(stderr);
    if text.contains("invalid data found when processing input")
        || text.contains("could not find codec")
        || text.contains("unknown format")
    {
        return DecodeError::unsupported(summary);
    }
    DecodeError::tool(summary)
}

#[cfg(feature = "media-ffmpeg")]
fn summarize(stderr: &[u8]) -> String {
    crate::ffmpeg::stderr_summary(stderr)
}

#[cfg(not(feature = "media-ffmpeg"))]
fn summarize(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr).trim().to_owned()
}

#[cfg(test)]
#[path = "../../tests/unit/media/video.rs"]
mod tests;
