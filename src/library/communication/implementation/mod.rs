//! Implementations of the communication traits

pub mod json;
pub mod kafka;

#[cfg(test)]
pub mod mock;
