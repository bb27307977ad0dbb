//! # Core Module
//!
//! This module provides the building blocks for describing coarse-grained RNA structures.
//!
//! ## Overview
//!
//! The core module holds the stateless parts of the library: the structure model, the
//! file readers, loop topology and the geometric routines used to measure a structure.
//! Nothing in here knows about feature tables or output formats.
//!
//! ## Architecture
//!
//! - **Structure Representation** ([`models`]) - Element graph, 3D data and the structure handle
//! - **File I/O** ([`io`]) - Coarse-grained and dot-bracket readers
//! - **Loop Analysis** ([`topology`]) - Multiloop discovery and classification
//! - **Geometry** ([`utils`]) - Vector math and shape descriptors

pub mod io;
pub mod models;
pub mod topology;
pub mod utils;
