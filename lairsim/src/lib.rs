//! Scenario loading, permutation search and presentation for the lair
//! simulation. The binary in `main.rs` is a thin argument layer over
//! these modules.

pub mod loader;
pub mod render;
pub mod search;
pub mod split;
