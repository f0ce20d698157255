//! image-rotate - rotate an image into the cache, or sweep the cache.
//!
//! Configuration comes from `IMAGE_ROTATE_*` variables (a `.env` file is
//! loaded first) and is overridden by the global flags.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use image_rotate_core::{ImageRotator, InterpolationFilter, RotateConfig, SourceUri};
use tracing::debug;

/// Flags that override the environment configuration.
#[derive(clap::Args, Clone, Debug)]
struct ConfigArgs {
    /// Internal cache directory for rotated files
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// External cache directory, used when it has more free space
    #[arg(long, global = true)]
    external_cache_dir: Option<PathBuf>,

    /// JPEG quality (1-100)
    #[arg(long, global = true, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Resample with Lanczos3 instead of bilinear
    #[arg(long, global = true)]
    lanczos: bool,
}

impl ConfigArgs {
    fn apply(&self, config: &mut RotateConfig) {
        if let Some(dir) = &self.cache_dir {
            config.internal_cache_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.external_cache_dir {
            config.external_cache_dir = Some(dir.clone());
        }
        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if self.lanczos {
            config.filter = InterpolationFilter::Lanczos3;
        }
    }
}

#[derive(Parser)]
#[command(name = "image-rotate", version)]
#[command(about = "Rotate images by any angle, keeping their camera metadata")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rotate an image and print the location of the result
    Rotate {
        /// file:// or content:// URI, remote URL, or a local path
        source: String,

        /// Degrees clockwise; negative turns counter-clockwise
        #[arg(allow_negative_numbers = true)]
        angle: f64,

        /// Move the rotated file here instead of leaving it in the cache
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Delete leftover rotated files from the cache directories
    Sweep,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = RotateConfig::from_env().context("Invalid IMAGE_ROTATE_* configuration")?;
    cli.config.apply(&mut config);
    // The sweep would race the file this run hands out
    config.sweep_on_start = false;
    debug!(?config, "loaded configuration");

    let rotator = ImageRotator::new(config)?;

    match cli.command {
        Command::Rotate {
            source,
            angle,
            output,
        } => {
            let source = resolve_source(&source)?;
            let rotated = rotator.rotate(&source, angle).await?;

            match output {
                Some(dest) => {
                    move_file(&rotated.path, &dest)?;
                    println!("{}", dest.display());
                }
                None => println!("{}", rotated.uri()),
            }
        }
        Command::Sweep => {
            let report = rotator.sweep().await.context("Sweep task failed")?;
            println!("Removed {} file(s)", report.removed);
            if report.failed > 0 {
                bail!("Could not remove {} file(s)", report.failed);
            }
        }
    }

    Ok(())
}

/// Turn an existing local path into a `file://` URI; anything else passes through.
fn resolve_source(source: &str) -> anyhow::Result<String> {
    if source.contains("://") {
        return Ok(source.to_string());
    }

    let path = Path::new(source);
    if !path.exists() {
        return Ok(source.to_string());
    }
    let absolute = path
        .canonicalize()
        .with_context(|| format!("Cannot resolve {}", path.display()))?;
    let uri = SourceUri::from_path(&absolute)
        .with_context(|| format!("Cannot build a file URI for {}", absolute.display()))?;
    Ok(uri.to_string())
}

fn move_file(from: &Path, to: &Path) -> anyhow::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    // Different filesystems
    fs::copy(from, to).with_context(|| format!("Cannot write {}", to.display()))?;
    fs::remove_file(from).with_context(|| format!("Cannot remove {}", from.display()))?;
    Ok(())
}
