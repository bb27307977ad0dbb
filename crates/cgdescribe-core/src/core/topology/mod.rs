//! # Topology Module
//!
//! Loop-level analysis of the element graph.
//!
//! ## Overview
//!
//! Multiloops are found by walking from junction segment to junction segment around the
//! stems that bound them. Each loop is then described by its openness (whether it runs
//! into a chain end) and by whether any of its segments closes a pseudoknot, which is
//! detected through the segment's angle type.
//!
//! ## Key Components
//!
//! - [`multiloop`] - Multiloop discovery, description and angle types
//!
//! ## Usage
//!
//! ```ignore
//! use cgdescribe::core::topology::multiloop::{describe_multiloop, find_mlonly_multiloops};
//!
//! for ml in find_mlonly_multiloops(rna.graph())? {
//!     let description = describe_multiloop(rna.graph(), &ml)?;
//! }
//! ```

pub mod multiloop;
