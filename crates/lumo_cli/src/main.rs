//! lumo - render a Cornell box with the path tracer and save it as an image.
//!
//! Usage:
//!   lumo [--spp N] [--width W] [--height H] [--rr Q] [--seed S] [--out PATH]

mod cornell;

use anyhow::{bail, Context, Result};
use lumo_math::Vec3;
use lumo_renderer::{render, Camera, RenderConfig, Scene, DEFAULT_GAMMA};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

const USAGE: &str = "\
Usage: lumo [options]

Options:
  --spp N       samples per pixel (default 16)
  --width W     image width in pixels (default 256)
  --height H    image height in pixels (default 256)
  --rr Q        russian roulette survival probability in [0, 1] (default 0.8)
  --seed S      random seed (default 0)
  --out PATH    output image, format from the extension (default cornell.png)
  -h, --help    print this help";

/// Options collected from the command line.
#[derive(Debug, Clone, PartialEq)]
struct Options {
    spp: u32,
    width: u32,
    height: u32,
    russian_roulette: f32,
    seed: u64,
    out: PathBuf,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            spp: 16,
            width: 256,
            height: 256,
            russian_roulette: 0.8,
            seed: 0,
            out: PathBuf::from("cornell.png"),
        }
    }
}

/// Parse flags; `Ok(None)` means help was requested.
fn parse_args<I>(args: I) -> Result<Option<Options>>
where
    I: IntoIterator<Item = String>,
{
    let mut options = Options::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let mut value = || {
            args.next()
                .with_context(|| format!("missing value for {arg}"))
        };
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--spp" => options.spp = parse_value("--spp", &value()?)?,
            "--width" => options.width = parse_value("--width", &value()?)?,
            "--height" => options.height = parse_value("--height", &value()?)?,
            "--rr" => options.russian_roulette = parse_value("--rr", &value()?)?,
            "--seed" => options.seed = parse_value("--seed", &value()?)?,
            "--out" => options.out = PathBuf::from(value()?),
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(Some(options))
}

fn parse_value<T>(flag: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse()
        .with_context(|| format!("invalid value '{raw}' for {flag}"))
}

fn run(options: &Options) -> Result<()> {
    let config = RenderConfig {
        samples_per_pixel: options.spp,
        russian_roulette: options.russian_roulette,
        ..Default::default()
    };

    let start = Instant::now();
    let mut scene = Scene::new(config).context("invalid render settings")?;
    cornell::populate(&mut scene).context("failed to build the Cornell box")?;
    scene.build_bvh();
    log::info!("Scene built in {:?}", start.elapsed());

    let (look_from, look_at, fov) = cornell::CAMERA;
    let mut camera = Camera::new()
        .with_resolution(options.width, options.height)
        .with_position(look_from, look_at, Vec3::Y)
        .with_fov(fov);
    camera.initialize();

    let mut rng = StdRng::seed_from_u64(options.seed);
    let framebuffer = render(&scene, &camera, &mut rng).context("render failed")?;

    let image = image::RgbImage::from_raw(
        framebuffer.width,
        framebuffer.height,
        framebuffer.to_rgb8(DEFAULT_GAMMA),
    )
    .context("framebuffer size does not match the image")?;
    image
        .save(&options.out)
        .with_context(|| format!("failed to write {}", options.out.display()))?;

    log::info!("Saved {}", options.out.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let Some(options) = parse_args(env::args().skip(1))? else {
        println!("{USAGE}");
        return Ok(());
    };
    run(&options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let options = parse_args(args(&[])).unwrap().unwrap();
        assert_eq!(options, Options::default());
    }

    #[test]
    fn test_all_flags() {
        let options = parse_args(args(&[
            "--spp", "64", "--width", "320", "--height", "240", "--rr", "0.5", "--seed", "9",
            "--out", "box.ppm",
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(options.spp, 64);
        assert_eq!((options.width, options.height), (320, 240));
        assert_eq!(options.russian_roulette, 0.5);
        assert_eq!(options.seed, 9);
        assert_eq!(options.out, PathBuf::from("box.ppm"));
    }

    #[test]
    fn test_help() {
        assert!(parse_args(args(&["--help"])).unwrap().is_none());
    }

    #[test]
    fn test_bad_input() {
        assert!(parse_args(args(&["--spp"])).is_err());
        assert!(parse_args(args(&["--spp", "many"])).is_err());
        assert!(parse_args(args(&["--frobnicate"])).is_err());
    }
}
