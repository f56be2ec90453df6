mod job;
mod request;
pub mod schemas;

pub use job::{JobStatus, ResultImage};
pub use request::{GenerationRequest, DEFAULT_PROVIDER};
