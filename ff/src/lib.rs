//! FloorForge - floor plan generation client core
//!
//! Sends text descriptions to a remote image-synthesis service, keeps the
//! resulting floor plans in a local durable store, and falls back to that
//! store when the service is unreachable.
//!
//! - [`remote`] - HTTP client for the generation service
//! - [`rooms`] - room counts extracted from prompts
//! - [`store`] - key-value persistence of the plan collection
//! - [`coordinator`] - session state, generation and persistence

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod remote;
pub mod rooms;
pub mod store;

pub use config::Config;
pub use coordinator::{Coordinator, CoordinatorConfig, CoordinatorError, DevelopmentFallbackPolicy};
pub use domain::{FloorPlan, GenerationOptions, GenerationParameters, RoomInfo, RoomType};
pub use remote::{ClientError, GenerationClient, HttpGenerationClient};
pub use rooms::extract_room_info;
pub use store::{FileStore, KeyValueStore, MemoryStore, PlanStore, StoreError};
