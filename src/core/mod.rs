pub mod error;
pub mod error_metrics;
pub mod euler;
pub mod file_io;
pub mod numeric;
pub mod ode_solvers;
pub mod quadrature;
pub mod root_finding;
pub mod stopwatch;
