//! Orbit transfer solvers

mod hohmann;

pub use hohmann::{compute_hohmann_transfer, HohmannResult, TargetOrbit, TransferBurn};
