//! Core pipeline orchestration and domain logic for notesite.
//!
//! This crate ties together source scanning, filename classification,
//! document conversion, and site writing into the end-to-end `build_site`
//! workflow.

pub mod assembler;
pub mod classifier;
pub mod pipeline;
pub mod scanner;
pub mod toc;
