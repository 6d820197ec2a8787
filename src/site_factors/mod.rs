//! Site amplification factors module
//!
//! Maps a site descriptor triple (Vs30 surface stiffness, z1000 sediment
//! depth, PGA motion intensity) to amplification and phase-shift spectra by
//! bracketing the query inside a fixed irregular 3D lookup grid and
//! interpolating trilinearly, one value per frequency.

pub mod engine;
pub mod grid;
pub mod types;

pub use engine::*;
pub use grid::*;
pub use types::*;
