//! Building floor plans from service payloads
//!
//! The service may leave out any field except the image locator. Missing
//! fields are filled from the request that was sent, or from neutral
//! defaults for listed plans.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, warn};

use crate::domain::{DEFAULT_GUIDANCE_SCALE, DEFAULT_INFERENCE_STEPS, FloorPlan, GenerationParameters, generate_plan_id};
use crate::remote::{GenerationRequest, GenerationResponse, PlanList, RemotePlan};
use crate::rooms::extract_room_info;

/// Timestamp layout used in the service's metadata files
const METADATA_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Parse an RFC 3339 or metadata-style timestamp as UTC
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, METADATA_TIMESTAMP_FORMAT)
        .ok()
        .map(|ts| ts.and_utc())
}

/// Total room count mentioned in `prompt`, `None` when nothing is mentioned
pub fn room_count_for(prompt: &str) -> Option<u32> {
    let info = extract_room_info(prompt);
    (!info.is_empty()).then(|| info.total())
}

/// Plan for a successful generation
///
/// The request supplies anything the response left out, so the stored
/// parameters always describe what was asked for.
pub fn plan_from_response(request: &GenerationRequest, response: GenerationResponse) -> FloorPlan {
    debug!(id = ?response.id, "plan_from_response: called");
    let params = response.parameters.unwrap_or_default();
    let prompt = response
        .prompt
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| request.prompt.clone());

    FloorPlan {
        id: response.id.filter(|id| !id.is_empty()).unwrap_or_else(generate_plan_id),
        room_count: room_count_for(&prompt),
        prompt,
        image_url: response.image_url,
        name: None,
        created_at: response
            .created_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now),
        parameters: GenerationParameters {
            num_inference_steps: params.num_inference_steps.unwrap_or(request.num_inference_steps),
            guidance_scale: params.guidance_scale.unwrap_or(request.guidance_scale),
            seed: params.seed.unwrap_or(request.seed),
        },
        generation_time: response.generation_time.unwrap_or_default(),
    }
}

/// Plans for a listing, in listing order
///
/// Entries without an image are dropped. Entries without an id take the
/// image file stem.
pub fn plans_from_listing(list: PlanList) -> Vec<FloorPlan> {
    debug!(count = list.floor_plans.len(), "plans_from_listing: called");
    list.floor_plans.into_iter().filter_map(plan_from_remote).collect()
}

fn plan_from_remote(remote: RemotePlan) -> Option<FloorPlan> {
    let params = remote.resolved_parameters();
    let Some(image_url) = remote.image_url.filter(|u| !u.trim().is_empty()) else {
        warn!(id = ?remote.id, "Listed floor plan has no image, skipping");
        return None;
    };

    let id = match remote.id.filter(|id| !id.is_empty()) {
        Some(id) => id,
        None => image_stem(&image_url).unwrap_or_else(generate_plan_id),
    };
    let prompt = remote.prompt.unwrap_or_default();

    Some(FloorPlan {
        id,
        room_count: room_count_for(&prompt),
        prompt,
        image_url,
        name: remote.name.filter(|n| !n.trim().is_empty()),
        created_at: remote
            .created_at
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now),
        parameters: GenerationParameters {
            num_inference_steps: params.num_inference_steps.unwrap_or(DEFAULT_INFERENCE_STEPS),
            guidance_scale: params.guidance_scale.unwrap_or(DEFAULT_GUIDANCE_SCALE),
            seed: params.seed.unwrap_or(0),
        },
        generation_time: remote.generation_time.unwrap_or_default(),
    })
}

/// Give adopted plans the local name of the same id when the service has none
///
/// The service never stores names, so a listing would otherwise drop every
/// rename made on this machine. The first local entry for an id wins.
pub fn carry_local_names(adopted: &mut [FloorPlan], local: &[FloorPlan]) {
    let names: HashMap<&str, &str> = local
        .iter()
        .rev()
        .filter_map(|p| p.name.as_deref().map(|name| (p.id.as_str(), name)))
        .collect();

    for plan in adopted.iter_mut().filter(|p| p.name.is_none()) {
        if let Some(name) = names.get(plan.id.as_str()) {
            debug!(id = %plan.id, %name, "carry_local_names: keeping local name");
            plan.name = Some((*name).to_string());
        }
    }
}

/// File stem of the last path segment, ignoring any query string
fn image_stem(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let file = path.rsplit('/').next()?;
    let stem = file.split_once('.').map_or(file, |(stem, _)| stem);
    (!stem.is_empty() && !url.starts_with("data:")).then(|| stem.to_string())
}
