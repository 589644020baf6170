//! Test harness for baseplate layouts.
//!
//! Scripts layouts against the mock kernel, verifies them with oracles and
//! prints text reports.
//!
//! # Key Components
//!
//! - [`LayoutBuilder`]: Fluent API for building layouts with named beams
//! - [`oracle`]: Verification functions returning pass/fail verdicts
//! - [`report`]: Structured text layout descriptions
//! - [`helpers`]: Error type, tracing setup, part shortcuts
//! - [`assertions`]: Assertion helpers with diagnostics

pub mod assertions;
pub mod helpers;
pub mod oracle;
pub mod report;
pub mod workflow;

pub use helpers::{init_tracing, HarnessError};
pub use oracle::OracleVerdict;
pub use report::LayoutReport;
pub use workflow::LayoutBuilder;
