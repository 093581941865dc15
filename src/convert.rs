use std::path::{Path, PathBuf};

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Error, Result};
use crate::ffmpeg;
use crate::manifest::ConcatManifest;
use crate::resolution::{FunctionSpec, ResolutionFn};

/// Run the whole pipeline: probe, extract, per-frame transcode, assemble.
/// The scratch directory and everything in it (stills, micro-clips, concat
/// list) is owned by the returned scope and removed on every exit path.
pub fn convert(input: &Path, choice: &FunctionSpec) -> Result<PathBuf> {
    let info = ffmpeg::probe(input)?;

    let scratch = tempfile::tempdir().context("failed to create scratch directory")?;
    eprintln!(
        "Dumping {}x{} frame sequence to {}...",
        info.width,
        info.height,
        scratch.path().display()
    );
    let frames = ffmpeg::dump_frames(input, scratch.path(), &info.fps)?;

    let resfn = choice.instantiate(frames.len() as u64);

    let pb = ProgressBar::new(frames.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {wide_bar} {pos}/{len} frames").unwrap(),
    );

    let mut manifest = ConcatManifest::new();
    for (idx, frame) in frames.iter().enumerate() {
        let idx = idx as u64;
        let (w, h) = target_dimensions(&resfn, idx, info.width, info.height)?;
        let clip = ffmpeg::encode_clip(frame, w, h, &info.fps)?;
        // Each still is dropped as soon as its clip exists, so peak disk usage
        // stays at one image plus the growing clip list.
        std::fs::remove_file(frame)
            .with_context(|| format!("failed to remove '{}'", frame.display()))?;
        manifest.push(&clip);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let list = scratch.path().join("list.txt");
    manifest.write_to(&list)?;

    let output = output_path(input);
    eprintln!("Assembling {}...", output.display());
    ffmpeg::concat(&list, input, &output)?;
    Ok(output)
}

fn target_dimensions(resfn: &ResolutionFn, frame: u64, base_w: u32, base_h: u32) -> Result<(u32, u32)> {
    let w = resfn.dimension(frame, base_w);
    let h = resfn.dimension(frame, base_h);
    for value in [w, h] {
        if value <= 0 {
            return Err(Error::InvalidDimension { frame, value });
        }
    }
    Ok((w as u32, h as u32))
}

fn output_path(input: &Path) -> PathBuf {
    input.with_extension("out.webm")
}
