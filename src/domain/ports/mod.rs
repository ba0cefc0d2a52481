//! Ports: the async trait boundaries adapters implement.

pub mod backend;
pub mod decision;
pub mod store;

pub use backend::{AgentBackend, BackendFactory, InvocationRequest};
pub use decision::DecisionSource;
pub use store::ArtifactStore;
