pub mod common;
pub mod definite_integral;
pub mod falling_sphere;
pub mod harmonic_oscillator;
pub mod projectile;
pub mod root_search;
pub mod terminal_velocity;
