//! Render and integrator configuration.

use crate::{Color, SplitMethod, MAX_PRIMS_IN_NODE_LIMIT};
use thiserror::Error;

/// Errors for configuration values the integrator cannot work with.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("samples per pixel must be at least 1")]
    ZeroSamples,

    #[error("russian roulette probability {0} is outside [0, 1]")]
    RussianRoulette(f32),

    #[error("shadow epsilon {0} must be positive and finite")]
    ShadowEpsilon(f32),

    #[error("max primitives per node must be between 1 and 255, got {0}")]
    PrimsInNode(usize),

    #[error("image resolution {width}x{height} has no pixels")]
    EmptyImage { width: u32, height: u32 },
}

/// What a ray returns when it directly hits an emissive surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EmissionMode {
    /// A fixed value regardless of the emitter.
    Constant(Color),
    /// The emitted radiance of the surface that was hit.
    Surface,
}

impl Default for EmissionMode {
    fn default() -> Self {
        EmissionMode::Constant(Color::ONE)
    }
}

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Number of `cast_ray` estimates averaged per pixel
    pub samples_per_pixel: u32,
    /// Probability of continuing a path at each bounce
    pub russian_roulette: f32,
    /// A shadow ray counts as unoccluded when its nearest hit lies this close
    /// to the sampled light point
    pub shadow_epsilon: f32,
    /// Radiance returned by rays that escape the scene
    pub background: Color,
    /// Radiance returned for direct hits on emitters
    pub emission_mode: EmissionMode,
    /// Optional hard cap on recursion depth; `None` leaves termination to
    /// Russian Roulette alone
    pub max_depth: Option<u32>,
    /// Leaf size knob of the BVH (clamped to 255)
    pub max_prims_in_node: usize,
    /// BVH partitioning strategy
    pub split_method: SplitMethod,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 16,
            russian_roulette: 0.8,
            shadow_epsilon: 0.01,
            background: Color::ZERO,
            emission_mode: EmissionMode::default(),
            max_depth: None,
            max_prims_in_node: 1,
            split_method: SplitMethod::Naive,
        }
    }
}

impl RenderConfig {
    /// Check every tunable for a usable value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.samples_per_pixel == 0 {
            return Err(ConfigError::ZeroSamples);
        }
        if !(0.0..=1.0).contains(&self.russian_roulette) {
            return Err(ConfigError::RussianRoulette(self.russian_roulette));
        }
        if !self.shadow_epsilon.is_finite() || self.shadow_epsilon <= 0.0 {
            return Err(ConfigError::ShadowEpsilon(self.shadow_epsilon));
        }
        if self.max_prims_in_node == 0 || self.max_prims_in_node > MAX_PRIMS_IN_NODE_LIMIT {
            return Err(ConfigError::PrimsInNode(self.max_prims_in_node));
        }
        Ok(())
    }
}
