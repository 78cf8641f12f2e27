//! Partitioned record stream primitives
//!
//! Processing stages exchange data through partitioned, append-only record
//! streams. Records within one partition retain their order while partitions
//! themselves may be consumed concurrently. Members of a consumer group share
//! the partitions of a stream between them and individually acknowledge the
//! records they have processed so a restarted member can resume where its
//! predecessor stopped.
//!
//! This module defines the transport-agnostic traits and data structures.
//! Concrete transports and test doubles live in the [`implementation`]
//! submodule.

mod error;
mod factory;

pub mod implementation;
pub mod publisher;
pub mod record;
pub mod source;

pub use error::CauseChain;
pub use factory::CommunicationFactory;
