//! # svm-driver: batch exploration driver for symbolic execution
//!
//! **`svm-driver`** drives a symbolic exploration engine over a whole program image.
//! The engine knows how to analyze *one* method; the driver decides *which* methods to
//! analyze, isolates their failures from each other, memoizes the results and renders
//! each result into a stable textual report suitable for golden-output comparisons.
//!
//! ## Key Features
//!
//! - **Engine-agnostic**: the engine is anything implementing [`Explorer`][crate::engine::Explorer].
//! - **Reflection-agnostic**: program images are anything implementing
//!   [`ProgramImage`][crate::image::ProgramImage]; an in-memory [`Image`][crate::image::Image] is included.
//! - **Fault isolation**: a failure while exploring one method never stops a run.
//! - **Audit trail**: methods attempted without producing a summary stay visible in the report.
//! - **Stable reports**: engine-internal closure annotations are stripped from heap dumps.
//!
//! ## Basic Usage
//!
//! ```rust,ignore
//! use svm_driver::config::DriverConfig;
//! use svm_driver::driver::Svm;
//! use svm_driver::selector::IgnoreList;
//!
//! let mut svm = Svm::new(engine, DriverConfig::default());
//! svm.configure_solver(solver);
//!
//! // Explore every public method of the image, skipping types named `*Tests*`:
//! let report = svm.run(&image, &IgnoreList::new(["Tests"]))?;
//! for (method, text) in report.iter() {
//!     println!("{}: {}", method, text.unwrap_or("null"));
//! }
//!
//! // Or explore a single method, letting engine failures surface:
//! let text = svm.explore_one(&method)?;
//! ```
//!
//! ## Core Components
//!
//! - **[`driver`]**: the [`Svm`][crate::driver::Svm] driver, runs and single-method exploration.
//! - **[`selector`]**: which methods of an image get explored.
//! - **[`store`]**: memoization of summaries, with pending slots for incomplete invocations.
//! - **[`format`]**: rendering of summaries into reports.
//! - **[`engine`]**: the contract an exploration engine must fulfil.

pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod format;
pub mod image;
pub mod selector;
pub mod store;
