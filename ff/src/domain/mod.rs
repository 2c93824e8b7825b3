//! Domain types for FloorForge
//!
//! - [`FloorPlan`] - a generated plan, the unit of persistence
//! - [`RoomType`] / [`RoomInfo`] - room counts derived from a prompt

mod plan;
mod room;

pub use plan::{
    DEFAULT_GUIDANCE_SCALE, DEFAULT_INFERENCE_STEPS, FloorPlan, GenerationOptions, GenerationParameters,
    UNTITLED_PLAN_NAME, generate_plan_id,
};
pub use room::{RoomInfo, RoomType};
