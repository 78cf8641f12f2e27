//! Domain structures and event definitions

pub mod archive;
pub mod event;
pub mod update;
