//! Ready-made collaborator implementations.
//!
//! [`HttpToolInvoker`] talks to a knowledge-base HTTP API; the in-memory
//! collaborators in [`memory`] are for tests and embedding without a
//! backend. Each can be replaced via the [`crate::engine::EngineBuilder`].

pub mod kb_client;
pub mod memory;

pub use kb_client::HttpToolInvoker;
pub use memory::{CannedToolInvoker, RecordingCheckpointSink, ScriptedDelegator};
