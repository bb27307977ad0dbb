//! # cgdescribe Core Library
//!
//! Descriptive statistics for coarse-grained RNA 3D structures: element counts, multiloop
//! classification, shape metrics and user-selected distances and angles, collected into a
//! table.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture with a clear separation of concerns.
//!
//! - **[`core`]: The Foundation.** Stateless structure models (`CoarseGrainRna`, the element
//!   graph), file readers, multiloop topology and geometric routines.
//!
//! - **[`engine`]: The Logic Core.** Configuration, feature rows, the whole-structure and
//!   per-segment extraction tasks, and the result table with its CSV and text output.
//!
//! - **[`workflows`]: The Public API.** Runs the engine over a batch of loaded structures,
//!   reporting progress and wrapping per-structure failures with their context.

pub mod core;
pub mod engine;
pub mod workflows;
