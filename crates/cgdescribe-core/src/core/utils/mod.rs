//! Numerical helpers shared by the models.

pub mod geometry;
