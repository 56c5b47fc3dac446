//! Configuration and parameters
//!
//! Numerical constants and update-method settings.

pub mod constants;
pub mod update_params;

pub use constants::*;
pub use update_params::*;
