//! HTTP access to the agent backend: chat, agent, detection, OCR and workspaces.

pub mod backend;
pub mod error;
pub mod http;
pub mod wire;

pub use backend::Backend;
pub use error::BackendError;
pub use http::HttpBackend;
