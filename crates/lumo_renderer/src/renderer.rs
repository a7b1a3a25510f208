//! Image rendering on top of the scene integrator.
//!
//! Implements:
//! - Multi-sample pixel estimation
//! - Linear framebuffer with gamma-mapped 8-bit output

use crate::{Camera, Color, ConfigError, Scene};
use rand::RngCore;
use std::time::Instant;
use thiserror::Error;

/// Gamma exponent applied by [`Framebuffer::to_rgb8`] in the default output path.
pub const DEFAULT_GAMMA: f32 = 0.6;

/// Errors that prevent a render from starting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("invalid render configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("scene BVH has not been built")]
    SceneNotBuilt,
}

/// Clamp a value to [0, 1] range.
#[inline]
fn clamp_01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Convert a linear color to 8-bit RGB: clamp, raise to `gamma`, scale to 255.
pub fn color_to_rgb8(color: Color, gamma: f32) -> [u8; 3] {
    let encode = |c: f32| (255.0 * clamp_01(c).powf(gamma)) as u8;
    [encode(color.x), encode(color.y), encode(color.z)]
}

/// Linear radiance image, row-major from the top-left pixel.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl Framebuffer {
    /// Create a new framebuffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Convert to packed RGB bytes (for saving).
    pub fn to_rgb8(&self, gamma: f32) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for color in &self.pixels {
            bytes.extend_from_slice(&color_to_rgb8(*color, gamma));
        }
        bytes
    }
}

/// Render the scene through `camera`.
///
/// Every pixel averages `samples_per_pixel` estimates of
/// [`Scene::cast_ray`]. Single-threaded; all randomness comes from `rng`.
pub fn render(
    scene: &Scene,
    camera: &Camera,
    rng: &mut dyn RngCore,
) -> Result<Framebuffer, RenderError> {
    let config = scene.config();
    config.validate()?;
    if camera.image_width == 0 || camera.image_height == 0 {
        return Err(ConfigError::EmptyImage {
            width: camera.image_width,
            height: camera.image_height,
        }
        .into());
    }
    if !scene.is_built() {
        return Err(RenderError::SceneNotBuilt);
    }
    if scene.emissive_area() <= 0.0 {
        log::warn!("Scene has no emissive area; image will only show background");
    }

    log::info!(
        "Rendering {}x{} at {} spp (russian roulette {})",
        camera.image_width,
        camera.image_height,
        config.samples_per_pixel,
        config.russian_roulette
    );
    let start = Instant::now();

    let mut image = Framebuffer::new(camera.image_width, camera.image_height);
    let scale = 1.0 / config.samples_per_pixel as f32;
    for y in 0..camera.image_height {
        for x in 0..camera.image_width {
            let mut pixel_color = Color::ZERO;
            for _ in 0..config.samples_per_pixel {
                let ray = camera.primary_ray(x, y, rng);
                pixel_color += scene.cast_ray(&ray, 0, rng);
            }
            image.set(x, y, pixel_color * scale);
        }
        log::debug!("Row {}/{} done", y + 1, camera.image_height);
    }

    log::info!("Render finished in {:.2?}", start.elapsed());
    Ok(image)
}
