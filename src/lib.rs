/*
 * Boid Flocking Simulation - Module Definitions
 *
 * This file defines the module structure of the flocking core. The core owns
 * no window, renderer or UI: a driver hands it the flock and a frame delta, and
 * reads back positions and model matrices afterwards.
 */

// Re-export key components for easier access
pub use boid::{spawn_flock, Boid};
pub use boundary::BoundaryPolicy;
pub use debug::DebugInfo;
pub use error::{ConfigError, ParamsError};
pub use params::SimulationParams;
pub use physics::{compute_steering, instance_transforms, FlockSimulator, SteeringForces};
pub use spatial_grid::SpatialGrid;

// Vector types used throughout the public API
pub use glam::{Mat4, Vec3};

// Define modules
pub mod boid;
pub mod boundary;
pub mod debug;
pub mod error;
pub mod params;
pub mod physics;
pub mod spatial_grid;

// Fixed timestep used by the headless driver (60 Hz)
pub const DEFAULT_TIME_STEP: f32 = 1.0 / 60.0;
