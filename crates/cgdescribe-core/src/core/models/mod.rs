//! # Core Models Module
//!
//! This module contains the data structures used to represent coarse-grained RNA
//! structures.
//!
//! ## Overview
//!
//! A structure is split into secondary-structure elements: stems (`s`), interior loops
//! (`i`), multiloop segments (`m`), hairpins (`h`) and the unpaired 5' (`f`) and 3' (`t`)
//! ends. The element graph records which nucleotides each element covers and which stems
//! bound each loop; optional 3D data places stems and virtual residues in space.
//!
//! ## Key Components
//!
//! - [`ids`] - Element kinds and identifiers such as `s0` or `m2`
//! - [`graph`] - The validated element graph and its builder
//! - [`decomposition`] - Construction of the element graph from a base-pair table
//! - [`coords`] - 3D coordinates, twists and virtual residues
//! - [`rna`] - The structure handle combining graph and geometry
//!
//! ## Usage
//!
//! ```ignore
//! use cgdescribe::core::models::rna::{CoarseGrainRna, RogMethod};
//!
//! let rna = CoarseGrainRna::new("1GID_A", graph).with_coords(coords);
//! let rog = rna.radius_of_gyration(RogMethod::Fast)?;
//! ```

pub mod coords;
pub mod decomposition;
pub mod graph;
pub mod ids;
pub mod rna;
