//! Feature extraction tasks.
//!
//! Each task turns one structure into feature rows: [`whole_structure`] produces a single
//! row of counts, loop statistics, shape metrics and the requested distances and angles;
//! [`ml_segments`] produces one row per multiloop segment.

pub mod ml_segments;
pub mod whole_structure;
