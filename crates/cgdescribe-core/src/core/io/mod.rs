//! Provides input functionality for RNA structure file formats.
//!
//! This module contains readers for the coarse-grained text format (with optional 3D
//! coordinates) and for dot-bracket secondary structures. Both implement the trait-based
//! [`traits::RnaFile`] interface; [`loader`] picks the right reader for a path.

pub mod cg;
pub mod dotbracket;
pub mod loader;
pub mod traits;
