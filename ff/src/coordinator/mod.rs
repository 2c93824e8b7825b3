//! Generation and persistence coordination
//!
//! [`Coordinator`] owns the session state, talks to a
//! [`GenerationClient`](crate::remote::GenerationClient) and mirrors the
//! floor-plan collection into a [`PlanStore`](crate::store::PlanStore).

mod backfill;
mod config;
mod engine;
mod error;
mod state;

pub use backfill::{carry_local_names, parse_timestamp, plan_from_response, plans_from_listing, room_count_for};
pub use config::{
    CoordinatorConfig, DEFAULT_MAX_PROMPT_CHARS, DEFAULT_PLACEHOLDER_IMAGE_URL, DevelopmentFallbackPolicy,
    PLACEHOLDER_GENERATION_TIME,
};
pub use engine::Coordinator;
pub use error::CoordinatorError;
pub use state::{GenerationPhase, LoadPhase, SessionSnapshot, SessionState};
