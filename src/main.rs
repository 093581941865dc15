mod convert;
mod error;
mod ffmpeg;
mod manifest;
mod resolution;

use clap::Parser;
use std::path::PathBuf;

use error::{Error, Result};
use resolution::{FunctionParams, FunctionSpec};

#[derive(Parser)]
#[command(
    name = "webmangle",
    version,
    about = "Re-encode every frame of a video at its own resolution and stitch the result back together"
)]
struct Cli {
    /// Source video file
    video: PathBuf,

    /// Resolution function: identity, cyclic, random, random_slow,
    /// random_bounded or shrink
    #[arg(long, default_value = "shrink")]
    function: String,

    /// Lower dimension bound (random_bounded)
    #[arg(long)]
    min: Option<u32>,

    /// Upper dimension bound (random_bounded)
    #[arg(long)]
    max: Option<u32>,

    /// Number of consecutive frames that keep one drawn value (random_bounded)
    #[arg(long)]
    hold: Option<u32>,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    // Input and function-name validation come before the tool pre-flight, so
    // bad arguments never spawn a subprocess.
    if !cli.video.is_file() {
        return Err(Error::input(format!(
            "'{}' is not a valid file",
            cli.video.display()
        )));
    }
    let choice = FunctionSpec::resolve(
        &cli.function,
        &FunctionParams {
            min: cli.min,
            max: cli.max,
            hold: cli.hold,
        },
    )?;

    ffmpeg::ensure_tools_available()?;

    let output = convert::convert(&cli.video, &choice)?;
    eprintln!("Successfully encoded {}", output.display());
    Ok(())
}
