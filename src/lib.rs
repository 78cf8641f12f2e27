//! This library crate contains all the necessities to run a Patchline instance.
//!
//! Submodules have been introduced to split responsibilities. Each module has a specific focus
//! and they together form a chain of dependencies from the low-level [`library`], over the Patchline
//! [`domain`] specific structures, through the executable [`harness`], up to the high-level
//! [`modules`](module) and the contained ingestion pipeline.

#![deny(missing_docs)]

pub mod constants;
pub mod domain;
pub mod harness;
pub mod library;
pub mod module;
