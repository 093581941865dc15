use std::path::Path;

use anyhow::Context;

use crate::error::Result;

/// Ordered list of micro-clip locations, built during the transcode loop and
/// consumed exactly once by the concat step.
#[derive(Debug, Default)]
pub struct ConcatManifest {
    entries: Vec<String>,
}

impl ConcatManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, clip: &Path) {
        self.entries.push(format!("file {}\n", quote_path(clip)));
    }

    pub fn render(&self) -> String {
        self.entries.concat()
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())
            .with_context(|| format!("failed to write concat list '{}'", path.display()))?;
        Ok(())
    }
}

/// Single-quote a path for the concat demuxer, escaping embedded single quotes
/// as `'\''`.
fn quote_path(path: &Path) -> String {
    let escaped = path.to_string_lossy().replace('\'', r"'\''");
    format!("'{escaped}'")
}
