//! Typed wrappers around the external ffprobe/ffmpeg collaborators.
//!
//! Every call takes a timeout. Expiry, a non-zero exit, and unparsable
//! output are all `ProbeError` variants; callers treat them as non-fatal
//! and retry on their next cycle.

use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::platform;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{0} binary not found")]
    BinaryMissing(&'static str),
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("probe exited with {0}")]
    Failed(std::process::ExitStatus),
    #[error("unparsable probe output")]
    Unparsable,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

struct ProbeOutput {
    stdout: String,
    stderr: String,
}

async fn run_probe(
    binary: &'static str,
    program: std::path::PathBuf,
    args: &[&str],
    timeout: Duration,
    allow_failure: bool,
) -> Result<ProbeOutput, ProbeError> {
    debug!("probe: {} {:?}", binary, args);
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| ProbeError::Timeout(timeout))??;

    if !output.status.success() && !allow_failure {
        return Err(ProbeError::Failed(output.status));
    }

    Ok(ProbeOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Current `StreamTitle` from the stream's ICY metadata, if any.
pub async fn stream_title(url: &str, timeout: Duration) -> Result<String, ProbeError> {
    let bin = platform::find_ffprobe_binary().ok_or(ProbeError::BinaryMissing("ffprobe"))?;
    let out = run_probe(
        "ffprobe",
        bin,
        &[
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_entries",
            "format=icy",
            url,
        ],
        timeout,
        false,
    )
    .await?;
    parse_icy_tag(&out.stdout, "StreamTitle").ok_or(ProbeError::Unparsable)
}

/// Station name from the stream's `icy-name` header.
pub async fn station_name(url: &str, timeout: Duration) -> Result<String, ProbeError> {
    let bin = platform::find_ffprobe_binary().ok_or(ProbeError::BinaryMissing("ffprobe"))?;
    let out = run_probe(
        "ffprobe",
        bin,
        &[
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_entries",
            "format=icy",
            url,
        ],
        timeout,
        false,
    )
    .await?;
    parse_icy_tag(&out.stdout, "icy-name").ok_or(ProbeError::Unparsable)
}

/// Codec name of the stream's first audio track (e.g. "mp3", "aac").
pub async fn stream_codec(url: &str, timeout: Duration) -> Result<String, ProbeError> {
    let bin = platform::find_ffprobe_binary().ok_or(ProbeError::BinaryMissing("ffprobe"))?;
    let out = run_probe(
        "ffprobe",
        bin,
        &[
            "-v",
            "error",
            "-select_streams",
            "a:0",
            "-show_entries",
            "stream=codec_name",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
            url,
        ],
        timeout,
        false,
    )
    .await?;
    let codec = out.stdout.lines().next().unwrap_or("").trim().to_string();
    if codec.is_empty() {
        return Err(ProbeError::Unparsable);
    }
    Ok(codec)
}

/// Run a short level-detection pass against the stream and return the mean
/// RMS level in dB. ffmpeg's astats filter reports on stderr.
pub async fn sample_level_db(
    url: &str,
    window: Duration,
    timeout: Duration,
) -> Result<f32, ProbeError> {
    let bin = platform::find_ffmpeg_binary().ok_or(ProbeError::BinaryMissing("ffmpeg"))?;
    let window_arg = format!("{:.1}", window.as_secs_f64());
    // ffmpeg exits non-zero for some stream hiccups even after printing
    // usable stats, so tolerate the status and parse whatever arrived.
    let out = run_probe(
        "ffmpeg",
        bin,
        &[
            "-hide_banner",
            "-nostdin",
            "-t",
            &window_arg,
            "-i",
            url,
            "-af",
            "astats=measure_perchannel=none",
            "-f",
            "null",
            "-",
        ],
        timeout,
        true,
    )
    .await?;
    parse_rms_db(&out.stderr).ok_or(ProbeError::Unparsable)
}

/// Extract a named tag from ffprobe's `-print_format json` output.
pub fn parse_icy_tag(json: &str, key: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(json).ok()?;
    let tag = value.get("format")?.get("tags")?.get(key)?.as_str()?;
    let tag = tag.trim();
    if tag.is_empty() {
        None
    } else {
        Some(tag.to_string())
    }
}

/// Find the last "RMS level dB:" reading in astats diagnostic output.
pub fn parse_rms_db(stderr: &str) -> Option<f32> {
    stderr
        .lines()
        .filter_map(|line| {
            let (_, rest) = line.split_once("RMS level dB:")?;
            rest.trim().parse::<f32>().ok()
        })
        .filter(|db| db.is_finite())
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stream_title() {
        let json = r#"{"format":{"tags":{"StreamTitle":"Miles Davis - So What","icy-name":"Jazz FM"}}}"#;
        assert_eq!(
            parse_icy_tag(json, "StreamTitle").as_deref(),
            Some("Miles Davis - So What")
        );
        assert_eq!(parse_icy_tag(json, "icy-name").as_deref(), Some("Jazz FM"));
    }

    #[test]
    fn test_parse_icy_tag_missing_or_empty() {
        assert_eq!(parse_icy_tag(r#"{"format":{}}"#, "StreamTitle"), None);
        assert_eq!(
            parse_icy_tag(r#"{"format":{"tags":{"StreamTitle":"  "}}}"#, "StreamTitle"),
            None
        );
        assert_eq!(parse_icy_tag("not json", "StreamTitle"), None);
    }

    #[test]
    fn test_parse_rms_db_takes_last_reading() {
        let stderr = "\
[Parsed_astats_0 @ 0x55] Channel: 1\n\
[Parsed_astats_0 @ 0x55] RMS level dB: -31.2\n\
[Parsed_astats_0 @ 0x55] Overall\n\
[Parsed_astats_0 @ 0x55] RMS level dB: -23.4\n";
        assert_eq!(parse_rms_db(stderr), Some(-23.4));
    }

    #[test]
    fn test_parse_rms_db_ignores_noise() {
        assert_eq!(parse_rms_db("no stats here"), None);
        assert_eq!(parse_rms_db("RMS level dB: -inf\n"), None);
    }
}
