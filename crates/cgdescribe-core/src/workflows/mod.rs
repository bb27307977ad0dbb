//! # Workflows Module
//!
//! High-level entry points that run the engine over a batch of structures.
//!
//! ## Overview
//!
//! A workflow takes already-loaded structures and a configuration, drives the extraction
//! tasks in input order, reports progress and returns the accumulated result table.
//! Reading inputs and writing outputs stay with the caller.
//!
//! ## Architecture
//!
//! - **Describe Workflow** ([`describe`]) - Whole-structure or per-segment description of every input

pub mod describe;
