//! Remote generation client
//!
//! Wraps the HTTP integration point of the image-synthesis service.

pub mod client;
mod error;
mod http;
mod types;

pub use client::GenerationClient;
pub use error::ClientError;
pub use http::HttpGenerationClient;
pub use types::{
    GenerationRequest, GenerationResponse, HealthStatus, MemoryInfo, ModelInfo, PlanList, RemoteParameters,
    RemotePlan, ServiceErrorBody,
};
