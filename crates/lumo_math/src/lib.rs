// Re-export glam for convenience
pub use glam::*;

// Lumo math types
mod bounds;
mod ray;
pub use bounds::Bounds3;
pub use ray::Ray;
