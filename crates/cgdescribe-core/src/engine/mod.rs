//! # Engine Module
//!
//! This module turns loaded structures into a table of features.
//!
//! ## Overview
//!
//! The engine owns everything between a parsed structure and its serialized row: what to
//! compute, how failures are classified, how rows are accumulated and how the finished
//! table is written. It never reads input files itself.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Extraction mode, distance/angle pairs and descriptor scope
//! - **Feature Rows** ([`features`]) - Typed cell values and ordered rows
//! - **Extraction Tasks** ([`tasks`]) - Whole-structure and per-segment extractors
//! - **Result Table** ([`table`]) - Schema-checked accumulation, column filtering, CSV and text output
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Engine-specific error types
//!
//! ## Failure Policy
//!
//! A single distance or angle that cannot be computed becomes `NaN` and a warning. Any
//! other failure aborts the structure, and with it the run.

pub mod config;
pub mod error;
pub mod features;
pub mod progress;
pub mod table;
pub mod tasks;
pub mod utils;
