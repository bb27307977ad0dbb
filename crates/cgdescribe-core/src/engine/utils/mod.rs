//! Utility functions for the engine module.

pub mod ordinal;
