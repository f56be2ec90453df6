pub mod config;
pub mod error;
pub mod generator;
pub mod state;

pub use config::{ClientConfig, PollConfig};
pub use error::GenError;
pub use generator::Generator;
pub use generator::backend::{GenerationApi, HttpGenerationApi};
pub use state::{ClientState, JobHandle};
