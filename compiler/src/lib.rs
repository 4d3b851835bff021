//! Provides for the compilation of a regular expression into it's
//! corresponding runtime program.
//!
//! # Example
//!
//! ```rust
//! // Compilation of a pattern into a runnable program is accomplished by a
//! // single function exposed in the `regexp_compiler` crate.
//! use regexp_compiler::compile;
//!
//! // Evaluating a given input against a program is accomplished via a single
//! // exposed function in the `regexp_runtime` crate.
//! use regexp_runtime::run;
//!
//! // Matches are exposed as `SaveGroupSlots`
//! use regexp_runtime::SaveGroupSlot;
//!
//! let program = compile("(ll)").expect("failed to compile");
//! let input = "hello\nworld";
//!
//! let captures = run(&program, input).expect("well-formed program");
//!
//! assert_eq!(
//!     // Slot 0 spans the whole match while slot 1 holds the first group. A
//!     // start of 2 and an end of 4 signifies the match covers index 2 and 3
//!     // of the input, or `ll`.
//!     Some([SaveGroupSlot::complete(2, 4), SaveGroupSlot::complete(2, 4)]),
//!     captures.map(|c| [c.slot(0), c.slot(1)])
//! )
//! ```
//!
//! For repeated use, a [`Regex`] holds a compiled program alongside the
//! search operations.

pub mod compiler;
pub mod emitter;
mod optimizer;
mod regex;

pub use compiler::{compile, CompileError};
pub use regex::Regex;
