use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Deserialize;

use crate::error::{Error, Result, FFMPEG_FAILED, FFPROBE_FAILED};

/// Base resolution and frame rate of the source, read once per run. `fps` is
/// kept as the rational string ffprobe reports (e.g. "30000/1001") and passed
/// back to ffmpeg verbatim.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub fps: String,
}

/// Both binaries must answer `-version` before any real work starts.
pub fn ensure_tools_available() -> Result<()> {
    let missing: Vec<&str> = ["ffprobe", "ffmpeg"]
        .into_iter()
        .filter(|tool| !tool_responds(tool))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingTool(missing.join(" and ")))
    }
}

fn tool_responds(name: &str) -> bool {
    Command::new(name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn probe(path: &Path) -> Result<StreamInfo> {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-select_streams",
            "v:0",
        ])
        .arg(path)
        .output()
        .map_err(|_| Error::probe(FFPROBE_FAILED))?;
    if !out.status.success() {
        return Err(Error::probe(FFPROBE_FAILED));
    }
    parse_probe(path, &out.stdout)
}

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeStream {
    width: u32,
    height: u32,
    avg_frame_rate: String,
}

fn parse_probe(path: &Path, stdout: &[u8]) -> Result<StreamInfo> {
    let parsed: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|_| Error::probe(format!("unreadable probe output for '{}'", path.display())))?;
    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| Error::probe(format!("no video stream in '{}'", path.display())))?;
    if stream.avg_frame_rate.is_empty() || stream.avg_frame_rate == "0/0" {
        return Err(Error::probe(format!(
            "'{}' reports no frame rate",
            path.display()
        )));
    }
    Ok(StreamInfo {
        width: stream.width,
        height: stream.height,
        fps: stream.avg_frame_rate,
    })
}

// Seven digits keeps lexicographic order equal to numeric order for any run
// under ten million frames.
const FRAME_PATTERN: &str = "%07d.png";

/// Dump the source to a PNG sequence at its own frame rate and return the
/// stills in index order.
pub fn dump_frames(input: &Path, scratch: &Path, fps: &str) -> Result<Vec<PathBuf>> {
    let status = Command::new("ffmpeg")
        .arg("-hide_banner")
        .arg("-i")
        .arg(input)
        .args(["-an", "-sn", "-dn", "-vf"])
        .arg(format!("fps={fps}"))
        .arg(scratch.join(FRAME_PATTERN))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|_| Error::extract(FFMPEG_FAILED))?;
    if !status.success() {
        return Err(Error::extract(FFMPEG_FAILED));
    }

    let mut frames = vec![];
    for entry in std::fs::read_dir(scratch)
        .map_err(|_| Error::extract(format!("'{}' is not a directory", scratch.display())))?
    {
        let p = entry.map_err(|e| Error::extract(e.to_string()))?.path();
        if p.extension().is_some_and(|ext| ext == "png") {
            frames.push(p);
        }
    }
    frames.sort();

    if frames.is_empty() {
        return Err(Error::extract(format!(
            "no frames were extracted from '{}'",
            input.display()
        )));
    }
    Ok(frames)
}

/// Encode one still into a single-frame VP9 micro-clip scaled to `(w, h)`.
pub fn encode_clip(image: &Path, w: u32, h: u32, fps: &str) -> Result<PathBuf> {
    let clip = image.with_extension("webm");
    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-r", fps, "-i"])
        .arg(image)
        .args(["-an", "-sn", "-dn", "-vf"])
        .arg(format!("scale={w}:{h}:flags=lanczos,setsar=1/1,fps={fps}"))
        .args(["-vcodec", "libvpx-vp9"])
        .arg(&clip)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|_| Error::Encode(FFMPEG_FAILED.into()))?;
    if !status.success() {
        return Err(Error::Encode(FFMPEG_FAILED.into()));
    }
    Ok(clip)
}

/// Concatenate the micro-clips (video stream-copied) and remux audio from the
/// original source, re-encoded to opus at 96k, with container metadata
/// stripped.
pub fn concat(list: &Path, audio_source: &Path, output: &Path) -> Result<()> {
    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-y", "-f", "concat", "-safe", "0", "-i"])
        .arg(list)
        .arg("-i")
        .arg(audio_source)
        .args(["-map", "0:v", "-map", "1:a"])
        .args(["-vcodec", "copy"])
        .args(["-acodec", "libopus", "-b:a", "96k"])
        .args(["-map_metadata", "-1"])
        .arg(output)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|_| Error::Assemble(FFMPEG_FAILED.into()))?;
    if !status.success() {
        return Err(Error::Assemble(FFMPEG_FAILED.into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_probe_reads_resolution_and_rate() {
        let json = br#"{"streams":[{"index":0,"codec_name":"h264","width":1920,"height":1080,"avg_frame_rate":"30000/1001"}]}"#;
        let info = parse_probe(Path::new("a.mp4"), json).unwrap();
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
        assert_eq!(info.fps, "30000/1001");
    }

    #[test]
    fn parse_probe_rejects_streamless_output() {
        let err = parse_probe(Path::new("a.mp4"), br#"{"streams":[]}"#).unwrap_err();
        assert!(err.to_string().contains("no video stream"), "{err}");
    }

    #[test]
    fn parse_probe_rejects_zero_frame_rate() {
        let json = br#"{"streams":[{"width":640,"height":480,"avg_frame_rate":"0/0"}]}"#;
        let err = parse_probe(Path::new("a.mp4"), json).unwrap_err();
        assert!(err.to_string().contains("frame rate"), "{err}");
    }

    #[test]
    fn parse_probe_rejects_garbage() {
        assert!(parse_probe(Path::new("a.mp4"), b"not json").is_err());
    }
}
