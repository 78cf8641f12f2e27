//! Building blocks tying modules, services and the process lifecycle together

mod heart;
mod module;
mod service;

pub use heart::{DeathReason, Heart, HeartStone};
pub use module::{Module, ModuleRunner, ModuleTerminationReason};
pub use service::{Service, ServiceRunner};
