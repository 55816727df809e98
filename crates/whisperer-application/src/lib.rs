//! Orchestration layer: turns a user question into a final,
//! policy-compliant output, hiding the grounding retry loop from the
//! caller.

pub mod prompt;
pub mod response_controller;

#[cfg(test)]
mod response_controller_test;

pub use response_controller::{ControllerConfig, FinalOutput, ResponseController};
