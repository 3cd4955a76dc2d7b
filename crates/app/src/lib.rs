//! CLI driver: load images, run the tiled super-resolution pipeline, save.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use image::{imageops::FilterType, RgbImage};
use ndarray::{Array3, ArrayView3};
use tracing::info;

use srtile_core::backend::SessionConfig;
use srtile_core::config::AppConfig;
use srtile_core::logging::{init_logging, LoggingInitOptions};
use srtile_core::{OnnxModel, Pipeline, Strides};

#[derive(Debug, Parser)]
#[command(name = "srtile", about = "Tiled ONNX super-resolution over image files")]
pub struct Cli {
    /// Input image files.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output directory for enhanced images.
    #[arg(short, long, default_value = "out")]
    pub output_dir: PathBuf,

    /// ONNX model path (overrides the config file).
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Horizontal stride in pixels (overrides the config file).
    #[arg(long)]
    pub stride_x: Option<usize>,

    /// Vertical stride in pixels (overrides the config file).
    #[arg(long)]
    pub stride_y: Option<usize>,

    /// Downscale then re-upscale each input by this factor before inference,
    /// reproducing the degraded-input evaluation flow.
    #[arg(long)]
    pub degrade: Option<u32>,

    /// Config file path; defaults to <data_dir>/config.toml.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_logging(&LoggingInitOptions {
        verbose: cli.verbose,
        ..Default::default()
    })?;

    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };

    let model_path = cli
        .model
        .clone()
        .unwrap_or_else(|| config.model.model_path.clone());
    let strides = Strides::new(
        cli.stride_x.unwrap_or(config.tiling.stride_x),
        cli.stride_y.unwrap_or(config.tiling.stride_y),
    );
    if strides.x == 0 || strides.y == 0 {
        bail!("strides must be at least 1 pixel");
    }

    let session_config = SessionConfig {
        model_path: &model_path,
        backend: &config.model.backend(),
        trt_cache_dir: Some(&config.model.trt_cache_dir),
    };
    let model = OnnxModel::load(&session_config, config.model.window)?;

    info!(
        model = %model_path.display(),
        stride_x = strides.x,
        stride_y = strides.y,
        inputs = cli.inputs.len(),
        "Starting batch enhancement"
    );

    std::fs::create_dir_all(&cli.output_dir).with_context(|| {
        format!(
            "failed to create output directory: {}",
            cli.output_dir.display()
        )
    })?;

    let mut pipeline = Pipeline::new(model, strides);

    for input in &cli.inputs {
        let mut rgb = image::open(input)
            .with_context(|| format!("failed to open image: {}", input.display()))?
            .to_rgb8();

        if let Some(factor) = cli.degrade {
            rgb = degrade(&rgb, factor)?;
        }

        let array = rgb_to_array(&rgb);
        let enhanced = pipeline
            .enhance(array.view())
            .with_context(|| format!("enhancement failed for {}", input.display()))?;

        let out_path = output_path(&cli.output_dir, input)?;
        array_to_rgb(enhanced.view())?
            .save(&out_path)
            .with_context(|| format!("failed to save image: {}", out_path.display()))?;

        info!(input = %input.display(), output = %out_path.display(), "Enhanced image written");
    }

    Ok(())
}

/// Simulate a low-resolution source: downscale by `factor`, then scale back
/// to the original size so the pipeline sees a blurred full-size image.
fn degrade(rgb: &RgbImage, factor: u32) -> Result<RgbImage> {
    if factor < 2 {
        bail!("degrade factor must be at least 2, got {factor}");
    }
    let (w, h) = rgb.dimensions();
    if w < factor || h < factor {
        bail!("image {w}x{h} is too small to degrade by {factor}");
    }

    let small = image::imageops::resize(rgb, w / factor, h / factor, FilterType::Triangle);
    Ok(image::imageops::resize(&small, w, h, FilterType::Triangle))
}

fn rgb_to_array(rgb: &RgbImage) -> Array3<u8> {
    let (w, h) = rgb.dimensions();
    Array3::from_shape_fn((h as usize, w as usize, 3), |(y, x, c)| {
        rgb.get_pixel(x as u32, y as u32)[c]
    })
}

fn array_to_rgb(array: ArrayView3<'_, u8>) -> Result<RgbImage> {
    let (h, w, c) = array.dim();
    if c != 3 {
        bail!("expected 3-channel image, got {c} channels");
    }

    let mut rgb = RgbImage::new(w as u32, h as u32);
    for (y, x) in (0..h).flat_map(|y| (0..w).map(move |x| (y, x))) {
        rgb.put_pixel(
            x as u32,
            y as u32,
            image::Rgb([array[[y, x, 0]], array[[y, x, 1]], array[[y, x, 2]]]),
        );
    }
    Ok(rgb)
}

fn output_path(output_dir: &Path, input: &Path) -> Result<PathBuf> {
    let name = input
        .file_name()
        .with_context(|| format!("input has no file name: {}", input.display()))?;
    Ok(output_dir.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_array_round_trip() {
        let mut rgb = RgbImage::new(3, 2);
        for (i, pixel) in rgb.pixels_mut().enumerate() {
            *pixel = image::Rgb([i as u8, (i * 10) as u8, (i * 20) as u8]);
        }

        let array = rgb_to_array(&rgb);
        assert_eq!(array.dim(), (2, 3, 3));
        let back = array_to_rgb(array.view()).unwrap();
        assert_eq!(back, rgb);
    }

    #[test]
    fn test_array_to_rgb_rejects_wrong_channel_count() {
        let array = Array3::<u8>::zeros((2, 2, 4));
        assert!(array_to_rgb(array.view()).is_err());
    }

    #[test]
    fn test_degrade_rejects_bad_factor() {
        let rgb = RgbImage::new(8, 8);
        assert!(degrade(&rgb, 1).is_err());
        assert!(degrade(&rgb, 16).is_err());
    }

    #[test]
    fn test_degrade_preserves_dimensions() {
        let rgb = RgbImage::new(9, 7);
        let degraded = degrade(&rgb, 3).unwrap();
        assert_eq!(degraded.dimensions(), (9, 7));
    }

    #[test]
    fn test_output_path_uses_input_file_name() {
        let out = output_path(Path::new("out"), Path::new("a/b/photo.png")).unwrap();
        assert_eq!(out, PathBuf::from("out/photo.png"));
    }

    #[test]
    fn test_cli_parses_overrides() {
        let cli = Cli::parse_from([
            "srtile",
            "in.png",
            "--model",
            "m.onnx",
            "--stride-x",
            "7",
            "--degrade",
            "3",
            "-vv",
        ]);
        assert_eq!(cli.inputs, vec![PathBuf::from("in.png")]);
        assert_eq!(cli.model, Some(PathBuf::from("m.onnx")));
        assert_eq!(cli.stride_x, Some(7));
        assert_eq!(cli.stride_y, None);
        assert_eq!(cli.degrade, Some(3));
        assert_eq!(cli.verbose, 2);
    }
}
