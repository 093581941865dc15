pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Fixed wrapper message for external-tool failures; raw tool stderr is never
/// surfaced to the user.
pub const FFMPEG_FAILED: &str = "ffmpeg returned an error";
pub const FFPROBE_FAILED: &str = "ffprobe returned an error";

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0} not found")]
    MissingTool(String),

    #[error("{0}")]
    Input(String),

    #[error("probe error: {0}")]
    Probe(String),

    #[error("extract error: {0}")]
    Extract(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("assemble error: {0}")]
    Assemble(String),

    #[error("unknown resolution function '{0}'")]
    UnknownFunction(String),

    #[error("invalid dimension {value} computed for frame {frame}")]
    InvalidDimension { frame: u64, value: i64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    pub fn extract(msg: impl Into<String>) -> Self {
        Self::Extract(msg.into())
    }
}
