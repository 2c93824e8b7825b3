//! GenerationClient trait definition

use async_trait::async_trait;

use super::{ClientError, GenerationRequest, GenerationResponse, PlanList};

/// Stateless client for the remote image-synthesis service
///
/// Each call is independent. Defaults for optional generation settings are
/// resolved by the caller before the request is built.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate a single floor plan image from a prompt
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ClientError>;

    /// List the floor plans the service knows about, newest first
    async fn list_plans(&self) -> Result<PlanList, ClientError>;
}
