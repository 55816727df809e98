pub mod error;
pub mod grounding;
pub mod model_client;
pub mod session;
pub mod settings;
pub mod turn;

// Re-export common error type
pub use error::WhispererError;
pub use model_client::ModelClient;
pub use settings::GenerationSettings;
pub use turn::{Attempt, Turn, TurnOutcome, Verdict};
