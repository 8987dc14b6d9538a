use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use cachepix::{Backend, Config, Grayscale, PixelBuffer, RescaleMaxval, ScaleBias};

/// Applies one pixel transform to a binary PPM file.
#[derive(Debug, Parser)]
#[command(name = "cachepix", version)]
struct Args {
    /// YAML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend to use instead of the configured or detected one
    #[arg(long)]
    backend: Option<Backend>,

    /// Replace OUTPUT if it already exists
    #[arg(long)]
    force: bool,

    /// Input PPM (P6)
    input: PathBuf,

    /// Output PPM
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// round(clamp(v * scale + bias, 0, ceiling)) on every sample, ceiling 255 or maxval
    Scale {
        #[arg(long, default_value_t = 1.0)]
        scale: f32,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        bias: f32,
    },
    /// Rec. 601 luminance written to all three channels
    Grayscale,
    /// Rescale samples to a new maxval
    Rescale {
        #[arg(long)]
        maxval: u16,
    },
    /// Re-lay out the image with the configured alignment only
    Copy,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if args.backend.is_some() {
        config.backend = args.backend;
    }

    common::log_setup::setup_logging(&config.log_level, "logs")?;
    tracing::debug!(?config, "Starting");

    let backend = config.resolve_backend()?;
    tracing::info!(%backend, "Using backend");

    let mut buffer = PixelBuffer::read_file(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    buffer.realign(config.alignment)?;
    tracing::info!(desc = %buffer.desc(), "Loaded {}", args.input.display());

    run(&args.command, backend, &mut buffer)?;

    buffer
        .save_file(&args.output, args.force)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    tracing::info!(desc = %buffer.desc(), "Saved {}", args.output.display());

    Ok(())
}

fn run(command: &Command, backend: Backend, buffer: &mut PixelBuffer) -> Result<()> {
    match *command {
        Command::Scale { scale, bias } => {
            ScaleBias::new(scale, bias).apply_with(backend, buffer)?;
        }
        Command::Grayscale => {
            Grayscale.apply_in_place_with(backend, buffer)?;
        }
        Command::Rescale { maxval } => {
            RescaleMaxval::new(maxval).apply_with(backend, buffer)?;
        }
        Command::Copy => {
            let copy = buffer.view().to_buffer()?;
            *buffer = copy;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scale_with_negative_bias() {
        let args = Args::try_parse_from([
            "cachepix", "--backend", "scalar", "in.ppm", "out.ppm", "scale", "--scale", "1.5",
            "--bias", "-20",
        ])
        .unwrap();

        assert_eq!(args.backend, Some(Backend::Scalar));
        assert!(!args.force);
        assert!(matches!(
            args.command,
            Command::Scale { scale, bias } if scale == 1.5 && bias == -20.0
        ));
    }

    #[test]
    fn rejects_unknown_backend() {
        let result = Args::try_parse_from(["cachepix", "--backend", "mmx", "a", "b", "copy"]);
        assert!(result.is_err());
    }

    #[test]
    fn run_applies_each_command() {
        let mut buffer = PixelBuffer::new(4, 2, 255).unwrap();
        buffer.fill([100, 50, 0]).unwrap();

        run(
            &Command::Scale {
                scale: 2.0,
                bias: 10.0,
            },
            Backend::Scalar,
            &mut buffer,
        )
        .unwrap();
        assert_eq!(buffer.get_pixel(3, 1).unwrap(), [210, 110, 10]);

        run(&Command::Rescale { maxval: 1023 }, Backend::Scalar, &mut buffer).unwrap();
        assert_eq!(buffer.maxval(), 1023);
        assert_eq!(buffer.bytes_per_channel(), 2);

        run(&Command::Grayscale, Backend::Scalar, &mut buffer).unwrap();
        let [r, g, b] = buffer.get_pixel(0, 0).unwrap();
        assert!(r == g && g == b);

        let before = buffer.clone();
        run(&Command::Copy, Backend::Scalar, &mut buffer).unwrap();
        assert_eq!(buffer.bytes(), before.bytes());
    }
}
