//! Grounding domain module.
//!
//! Quantifies how well a generated answer is supported by the context it
//! was supposed to be grounded in, independent of fluency.
//!
//! # Module Structure
//!
//! - `claim`: atomic claim extraction and token overlap (`ClaimCheck`)
//! - `scorer`: the scorer itself (`GroundingScorer`, `GroundingConfig`,
//!   `GroundingReport`)

mod claim;
mod scorer;

// Re-export public API
pub use claim::ClaimCheck;
pub use scorer::{GroundingConfig, GroundingReport, GroundingScorer};
