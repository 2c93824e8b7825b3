//! Generation and persistence coordinator
//!
//! Owns the session's floor-plan collection. Every mutation is applied in
//! memory first and then mirrored to the durable store; a failed mirror is
//! recorded but never undoes the mutation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::backfill::{carry_local_names, plan_from_response, plans_from_listing, room_count_for};
use super::{
    CoordinatorConfig, CoordinatorError, DevelopmentFallbackPolicy, GenerationPhase, LoadPhase,
    PLACEHOLDER_GENERATION_TIME, SessionSnapshot, SessionState,
};
use crate::domain::{FloorPlan, GenerationOptions, GenerationParameters};
use crate::remote::{GenerationClient, GenerationRequest};
use crate::store::PlanStore;

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the `Generating` phase for one generation
///
/// Whatever happens to the owning future, dropping the guard leaves the
/// phase terminal. The phase is `Failed` unless `resolve` said otherwise.
struct GenerationGuard<'a> {
    state: &'a Mutex<SessionState>,
    outcome: GenerationPhase,
}

impl<'a> GenerationGuard<'a> {
    fn begin(state: &'a Mutex<SessionState>) -> Result<Self, CoordinatorError> {
        let mut session = lock(state);
        if session.generation == GenerationPhase::Generating {
            return Err(CoordinatorError::Busy);
        }
        session.generation = GenerationPhase::Generating;
        session.last_error = None;

        Ok(Self {
            state,
            outcome: GenerationPhase::Failed,
        })
    }

    fn resolve(&mut self, outcome: GenerationPhase) {
        self.outcome = outcome;
    }
}

impl Drop for GenerationGuard<'_> {
    fn drop(&mut self) {
        let mut session = lock(self.state);
        if session.generation == GenerationPhase::Generating {
            if self.outcome == GenerationPhase::Failed && session.last_error.is_none() {
                warn!("Generation abandoned before it completed");
            }
            session.generation = self.outcome;
        }
    }
}

/// Coordinates the generation client, the durable store and session state
///
/// Methods take `&self`; the state lock is never held across an await, so a
/// coordinator can be shared behind an `Arc`. Store writes are serialized by
/// `write_lock`, and each one copies the collection only once it holds it.
pub struct Coordinator {
    client: Arc<dyn GenerationClient>,
    store: PlanStore,
    config: CoordinatorConfig,
    state: Mutex<SessionState>,
    write_lock: tokio::sync::Mutex<()>,
}

impl Coordinator {
    pub fn new(client: Arc<dyn GenerationClient>, store: PlanStore, config: CoordinatorConfig) -> Self {
        debug!(key = %config.store_key, fallback = %config.development_fallback, "Coordinator::new: called");
        Self {
            client,
            store,
            config,
            state: Mutex::new(SessionState::default()),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.state)
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Load the collection, preferring the service over the local copy
    ///
    /// A non-empty listing replaces the session and is mirrored; local names
    /// are kept for listed ids the service has no name for. An empty listing
    /// falls back to the local copy quietly; a failed listing falls back to
    /// it and leaves an advisory error.
    pub async fn initialize(&self) {
        debug!("Coordinator::initialize: called");
        self.state().load = LoadPhase::Loading;

        match self.client.list_plans().await {
            Ok(list) => {
                let mut plans = plans_from_listing(list);
                if plans.is_empty() {
                    debug!("Coordinator::initialize: service has no plans, reading local copy");
                    let stored = self.store.load(&self.config.store_key).await;
                    info!(count = stored.len(), "Loaded floor plans from local storage");

                    let mut state = self.state();
                    state.replace_plans(stored);
                    state.last_error = None;
                    state.load = LoadPhase::Loaded;
                } else {
                    info!(count = plans.len(), "Adopted floor plans from the generation service");
                    let mut local = self.plans();
                    local.extend(self.store.load(&self.config.store_key).await);
                    carry_local_names(&mut plans, &local);
                    {
                        let mut state = self.state();
                        state.replace_plans(plans);
                        state.last_error = None;
                        state.load = LoadPhase::Loaded;
                    }
                    self.mirror().await;
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to list floor plans, using local copy");
                let stored = self.store.load(&self.config.store_key).await;

                let mut state = self.state();
                state.replace_plans(stored);
                state.last_error = Some(e.into());
                state.load = LoadPhase::LoadFailed;
            }
        }
    }

    /// Generate a plan from `prompt`
    ///
    /// Returns the new plan, or a placeholder when the service fails and the
    /// placeholder fallback is configured. Otherwise returns `None` and the
    /// reason is available from [`Coordinator::last_error`].
    pub async fn generate(&self, prompt: &str, options: GenerationOptions) -> Option<FloorPlan> {
        debug!(prompt_len = prompt.len(), ?options, "Coordinator::generate: called");

        let request = match self.build_request(prompt, &options) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Coordinator::generate: rejected");
                self.state().last_error = Some(e);
                return None;
            }
        };

        let mut guard = match GenerationGuard::begin(&self.state) {
            Ok(guard) => guard,
            Err(e) => {
                warn!("Generation requested while another is in flight");
                self.state().last_error = Some(e);
                return None;
            }
        };

        let plan = match self.client.generate(&request).await {
            Ok(response) => {
                let plan = plan_from_response(&request, response);
                info!(id = %plan.id, seed = plan.parameters.seed, "Generated floor plan");
                self.adopt_generated(plan.clone());
                // A call rejected while this one ran may have left Busy behind
                self.state().last_error = None;
                guard.resolve(GenerationPhase::Settled);
                plan
            }
            Err(e) => {
                warn!(error = %e, "Floor plan generation failed");
                self.state().last_error = Some(e.into());

                if self.config.development_fallback != DevelopmentFallbackPolicy::Placeholder {
                    return None;
                }

                let plan = self.placeholder_plan(&request);
                warn!(id = %plan.id, "Using placeholder floor plan");
                self.adopt_generated(plan.clone());
                plan
            }
        };

        self.mirror().await;
        drop(guard);
        Some(plan)
    }

    /// Replace the name of an existing plan
    ///
    /// Only `name` is taken from `plan`; every other field of the stored
    /// entry is kept. Unknown ids return `None` without an advisory error.
    pub async fn save(&self, plan: &FloorPlan) -> Option<FloorPlan> {
        debug!(id = %plan.id, "Coordinator::save: called");
        let name = plan.name.clone().filter(|n| !n.trim().is_empty());

        let Some(saved) = self.state().rename(&plan.id, name) else {
            warn!(id = %plan.id, "Save requested for unknown floor plan");
            return None;
        };

        self.mirror().await;
        Some(saved)
    }

    /// Rename the plan with `id`
    pub async fn rename(&self, id: &str, name: impl Into<String>) -> Option<FloorPlan> {
        let mut plan = self.find(id)?;
        plan.name = Some(name.into());
        self.save(&plan).await
    }

    /// Delete the plan with `id`, returning whether anything was removed
    pub async fn delete(&self, id: &str) -> bool {
        debug!(%id, "Coordinator::delete: called");
        if !self.state().remove(id) {
            debug!(%id, "Coordinator::delete: no such plan");
            return false;
        }

        info!(%id, "Deleted floor plan");
        self.mirror().await;
        true
    }

    pub fn select_current(&self, plan: Option<FloorPlan>) {
        debug!(id = ?plan.as_ref().map(|p| &p.id), "Coordinator::select_current: called");
        self.state().current = plan;
    }

    /// Return a terminal generation phase to `Idle` and clear the advisory error
    pub fn acknowledge(&self) {
        let mut state = self.state();
        if state.generation.is_terminal() {
            state.generation = GenerationPhase::Idle;
        }
        state.last_error = None;
    }

    pub fn find(&self, id: &str) -> Option<FloorPlan> {
        self.state().find(id).cloned()
    }

    /// Plans, most recent first
    pub fn plans(&self) -> Vec<FloorPlan> {
        self.state().plans.clone()
    }

    pub fn current_plan(&self) -> Option<FloorPlan> {
        self.state().current.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().load == LoadPhase::Loading
    }

    pub fn is_generating(&self) -> bool {
        self.state().generation == GenerationPhase::Generating
    }

    pub fn last_error(&self) -> Option<CoordinatorError> {
        self.state().last_error.clone()
    }

    pub fn generation_phase(&self) -> GenerationPhase {
        self.state().generation
    }

    pub fn load_phase(&self) -> LoadPhase {
        self.state().load
    }

    /// Whether the most recent mirror write failed
    pub fn is_durability_degraded(&self) -> bool {
        self.state().durability_error.is_some()
    }

    pub fn durability_error(&self) -> Option<CoordinatorError> {
        self.state().durability_error.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state().snapshot()
    }

    fn build_request(&self, prompt: &str, options: &GenerationOptions) -> Result<GenerationRequest, CoordinatorError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(CoordinatorError::Validation("Prompt must not be empty".to_string()));
        }

        let chars = prompt.chars().count();
        if chars > self.config.max_prompt_chars {
            return Err(CoordinatorError::Validation(format!(
                "Prompt is {chars} characters, the limit is {}",
                self.config.max_prompt_chars
            )));
        }

        let num_inference_steps = options
            .num_inference_steps
            .unwrap_or(self.config.default_inference_steps);
        if num_inference_steps == 0 {
            return Err(CoordinatorError::Validation(
                "Inference steps must be positive".to_string(),
            ));
        }

        let guidance_scale = options.guidance_scale.unwrap_or(self.config.default_guidance_scale);
        if !guidance_scale.is_finite() || guidance_scale <= 0.0 {
            return Err(CoordinatorError::Validation(format!(
                "Guidance scale must be a positive number, got {guidance_scale}"
            )));
        }

        Ok(GenerationRequest {
            prompt: prompt.to_string(),
            num_inference_steps,
            guidance_scale,
            seed: options.seed.unwrap_or_else(|| u64::from(rand::random::<u32>())),
        })
    }

    fn placeholder_plan(&self, request: &GenerationRequest) -> FloorPlan {
        let mut plan = FloorPlan::new(
            request.prompt.clone(),
            self.config.placeholder_image_url.clone(),
            GenerationParameters {
                num_inference_steps: request.num_inference_steps,
                guidance_scale: request.guidance_scale,
                seed: request.seed,
            },
        );
        plan.generation_time = PLACEHOLDER_GENERATION_TIME;
        plan.room_count = room_count_for(&plan.prompt);
        plan
    }

    fn adopt_generated(&self, plan: FloorPlan) {
        let mut state = self.state();
        state.current = Some(plan.clone());
        state.insert_front(plan);
    }

    /// Write the whole collection to the durable store
    async fn mirror(&self) {
        let _write = self.write_lock.lock().await;
        let plans = self.plans();
        debug!(count = plans.len(), "Coordinator::mirror: called");

        let result = self.store.store(&self.config.store_key, &plans).await;
        let mut state = self.state();
        match result {
            Ok(()) => {
                if state.durability_error.take().is_some() {
                    info!("Local storage recovered");
                }
            }
            Err(e) => {
                warn!(error = %e, count = plans.len(), "Failed to persist floor plans");
                state.durability_error = Some(e.into());
            }
        }
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("config", &self.config)
            .field("state", &*self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::client::mock::{MockGenerationClient, response};
    use crate::remote::{ClientError, PlanList, RemotePlan};
    use crate::store::mock::{FlakyStore, GatedStore};
    use crate::store::{DEFAULT_PLANS_KEY, KeyValueStore, MemoryStore};
    use std::time::Duration;
    use tokio::sync::Notify;

    struct Fixture {
        client: Arc<MockGenerationClient>,
        backend: Arc<FlakyStore>,
        coordinator: Arc<Coordinator>,
    }

    fn fixture_with(client: MockGenerationClient, config: CoordinatorConfig) -> Fixture {
        let client = Arc::new(client);
        let backend = Arc::new(FlakyStore::new());
        let coordinator = Arc::new(Coordinator::new(
            client.clone(),
            PlanStore::new(backend.clone()),
            config,
        ));
        Fixture {
            client,
            backend,
            coordinator,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MockGenerationClient::new(), CoordinatorConfig::default())
    }

    fn stored_plans(backend: &FlakyStore) -> Vec<FloorPlan> {
        backend
            .inner()
            .get(DEFAULT_PLANS_KEY)
            .map(|json| serde_json::from_str(&json).unwrap())
            .unwrap_or_default()
    }

    fn listed(id: &str) -> RemotePlan {
        RemotePlan {
            id: Some(id.to_string()),
            prompt: Some(format!("listed {id}")),
            image_url: Some(format!("http://localhost:5000/api/floor-plans/images/{id}.png")),
            created_at: Some("2025-02-01T00:00:00Z".to_string()),
            ..Default::default()
        }
    }

    fn local_plan(id: &str) -> FloorPlan {
        let mut plan = FloorPlan::new(format!("local {id}"), format!("{id}.png"), GenerationParameters::with_seed(9));
        plan.id = id.to_string();
        plan
    }

    async fn seed_store(backend: &FlakyStore, plans: &[FloorPlan]) {
        backend
            .store(DEFAULT_PLANS_KEY, &serde_json::to_string(plans).unwrap())
            .await
            .unwrap();
    }

    async fn generated(f: &Fixture, id: &str) -> FloorPlan {
        f.client.push_generate(Ok(response(id, &format!("prompt {id}"))));
        f.coordinator
            .generate(&format!("prompt {id}"), GenerationOptions::default())
            .await
            .unwrap()
    }

    // initialize

    #[tokio::test]
    async fn test_initialize_adopts_service_listing() {
        let f = fixture();
        f.client.push_list(Ok(PlanList {
            floor_plans: vec![listed("a"), listed("b"), listed("a")],
        }));
        seed_store(&f.backend, &[local_plan("old")]).await;

        f.coordinator.initialize().await;

        let ids: Vec<_> = f.coordinator.plans().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(f.coordinator.load_phase(), LoadPhase::Loaded);
        assert!(f.coordinator.last_error().is_none());

        // The listing replaces the local copy
        let stored: Vec<_> = stored_plans(&f.backend).into_iter().map(|p| p.id).collect();
        assert_eq!(stored, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_initialize_empty_listing_reads_store_quietly() {
        let f = fixture();
        f.client.push_list(Ok(PlanList::default()));
        seed_store(&f.backend, &[local_plan("x"), local_plan("y")]).await;
        let writes_before = f.backend.inner().write_count();

        f.coordinator.initialize().await;

        assert_eq!(f.coordinator.plans().len(), 2);
        assert_eq!(f.coordinator.load_phase(), LoadPhase::Loaded);
        assert!(f.coordinator.last_error().is_none());
        assert_eq!(f.backend.inner().write_count(), writes_before);
    }

    #[tokio::test]
    async fn test_initialize_failure_falls_back_to_store() {
        let f = fixture();
        f.client.push_list(Err(ClientError::Timeout(Duration::from_secs(1))));
        seed_store(&f.backend, &[local_plan("x"), local_plan("y")]).await;

        f.coordinator.initialize().await;

        let ids: Vec<_> = f.coordinator.plans().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["x", "y"]);
        assert_eq!(f.coordinator.load_phase(), LoadPhase::LoadFailed);
        assert!(matches!(f.coordinator.last_error(), Some(CoordinatorError::Transport(_))));
        assert!(!f.coordinator.is_loading());
    }

    #[tokio::test]
    async fn test_initialize_failure_with_unreadable_store_is_empty() {
        let f = fixture();
        f.client.push_list(Err(ClientError::Remote {
            status: 500,
            message: None,
        }));
        f.backend.fail_reads(true);

        f.coordinator.initialize().await;

        assert!(f.coordinator.plans().is_empty());
        assert_eq!(
            f.coordinator.last_error().map(|e| e.to_string()).as_deref(),
            Some("Generation service returned HTTP 500")
        );
    }

    // generate

    #[tokio::test]
    async fn test_initialize_keeps_local_names() {
        let f = fixture();
        let mut named = local_plan("a");
        named.name = Some("Cottage".to_string());
        seed_store(&f.backend, &[named]).await;
        f.client.push_list(Ok(PlanList {
            floor_plans: vec![listed("a"), listed("b")],
        }));

        f.coordinator.initialize().await;

        assert_eq!(f.coordinator.find("a").unwrap().name.as_deref(), Some("Cottage"));
        assert!(f.coordinator.find("b").unwrap().name.is_none());
        // The listing's own fields still win
        assert_eq!(f.coordinator.find("a").unwrap().prompt, "listed a");
        assert_eq!(stored_plans(&f.backend)[0].name.as_deref(), Some("Cottage"));
    }

    #[tokio::test]
    async fn test_generate_empty_prompt_is_rejected_without_network() {
        let f = fixture();

        assert!(f.coordinator.generate("", GenerationOptions::default()).await.is_none());
        assert!(matches!(f.coordinator.last_error(), Some(CoordinatorError::Validation(_))));

        assert!(f.coordinator.generate("   ", GenerationOptions::default()).await.is_none());
        assert!(matches!(f.coordinator.last_error(), Some(CoordinatorError::Validation(_))));

        assert_eq!(f.client.generate_calls(), 0);
        assert_eq!(f.coordinator.generation_phase(), GenerationPhase::Idle);
    }

    #[tokio::test]
    async fn test_generate_rejects_bad_options() {
        let f = fixture();
        let long = "a".repeat(501);

        assert!(f.coordinator.generate(&long, GenerationOptions::default()).await.is_none());
        assert!(
            f.coordinator
                .generate("a house", GenerationOptions::default().with_steps(0))
                .await
                .is_none()
        );
        assert!(
            f.coordinator
                .generate("a house", GenerationOptions::default().with_guidance(0.0))
                .await
                .is_none()
        );
        assert!(
            f.coordinator
                .generate("a house", GenerationOptions::default().with_guidance(f64::NAN))
                .await
                .is_none()
        );

        assert_eq!(f.client.generate_calls(), 0);
    }

    #[tokio::test]
    async fn test_generate_success() {
        let f = fixture();
        f.client.push_generate(Ok(response("p1", "A house with 3 bedrooms and two bathrooms")));

        let plan = f
            .coordinator
            .generate(
                "A house with 3 bedrooms and two bathrooms",
                GenerationOptions::default().with_seed(42),
            )
            .await
            .unwrap();

        assert_eq!(plan.id, "p1");
        assert_eq!(plan.room_count, Some(5));
        assert_eq!(plan.parameters.seed, 42);
        assert_eq!(plan.parameters.num_inference_steps, 50);
        assert_eq!(plan.generation_time, 12.5);

        assert_eq!(f.coordinator.plans()[0].id, "p1");
        assert_eq!(f.coordinator.current_plan().unwrap().id, "p1");
        assert_eq!(f.coordinator.generation_phase(), GenerationPhase::Settled);
        assert!(!f.coordinator.is_generating());
        assert!(f.coordinator.last_error().is_none());

        assert!(stored_plans(&f.backend).iter().any(|p| p.id == "p1"));

        let request = f.client.last_request().unwrap();
        assert_eq!(request.seed, 42);
        assert_eq!(request.guidance_scale, 7.5);
    }

    #[tokio::test]
    async fn test_generate_draws_seed_and_persists_it() {
        let f = fixture();
        let mut bare = response("p1", "a cabin");
        bare.parameters = None;
        f.client.push_generate(Ok(bare));

        let plan = f.coordinator.generate("a cabin", GenerationOptions::default()).await.unwrap();

        let sent = f.client.last_request().unwrap();
        assert_eq!(plan.parameters.seed, sent.seed);
        assert_eq!(stored_plans(&f.backend)[0].parameters.seed, sent.seed);
    }

    #[tokio::test]
    async fn test_generate_prepends_and_replaces_same_id() {
        let f = fixture();
        generated(&f, "a").await;
        generated(&f, "b").await;
        generated(&f, "a").await;

        let ids: Vec<_> = f.coordinator.plans().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_generate_failure_without_fallback() {
        let f = fixture();
        f.client.push_generate(Err(ClientError::Remote {
            status: 400,
            message: Some("Invalid prompt: must be a non-empty string".to_string()),
        }));

        assert!(f.coordinator.generate("a house", GenerationOptions::default()).await.is_none());

        assert!(f.coordinator.plans().is_empty());
        assert_eq!(f.coordinator.generation_phase(), GenerationPhase::Failed);
        assert!(!f.coordinator.is_generating());
        assert_eq!(
            f.coordinator.last_error().unwrap().to_string(),
            "Invalid prompt: must be a non-empty string"
        );
        assert_eq!(f.backend.inner().write_count(), 0);
    }

    #[tokio::test]
    async fn test_generate_failure_with_placeholder_fallback() {
        let f = fixture_with(
            MockGenerationClient::new(),
            CoordinatorConfig::default().with_fallback(DevelopmentFallbackPolicy::Placeholder),
        );
        f.client
            .push_generate(Err(ClientError::Timeout(Duration::from_secs(300))));

        let plan = f
            .coordinator
            .generate("a 2 bedroom flat", GenerationOptions::default().with_seed(7))
            .await
            .unwrap();

        assert_eq!(plan.image_url, f.coordinator.config().placeholder_image_url);
        assert_eq!(plan.generation_time, PLACEHOLDER_GENERATION_TIME);
        assert_eq!(plan.parameters.seed, 7);
        assert_eq!(plan.room_count, Some(2));

        assert_eq!(f.coordinator.current_plan().unwrap().id, plan.id);
        assert_eq!(stored_plans(&f.backend)[0].id, plan.id);
        assert_eq!(f.coordinator.generation_phase(), GenerationPhase::Failed);
        assert!(matches!(f.coordinator.last_error(), Some(CoordinatorError::Transport(_))));
    }

    #[tokio::test]
    async fn test_overlapping_generate_is_busy() {
        let gate = Arc::new(Notify::new());
        let f = fixture_with(MockGenerationClient::new().with_gate(gate.clone()), CoordinatorConfig::default());
        f.client.push_generate(Ok(response("slow", "first")));

        let first = f.coordinator.generate("first", GenerationOptions::default());
        let second = async {
            tokio::task::yield_now().await;
            let result = f.coordinator.generate("second", GenerationOptions::default()).await;
            let busy = f.coordinator.last_error();
            gate.notify_one();
            (result, busy)
        };

        let (first, (second, busy)) = tokio::join!(first, second);

        assert_eq!(first.unwrap().id, "slow");
        assert!(second.is_none());
        assert_eq!(busy, Some(CoordinatorError::Busy));
        assert_eq!(f.client.generate_calls(), 1);
        assert_eq!(f.coordinator.plans().len(), 1);

        // The settled generation does not report the other call's rejection
        assert_eq!(f.coordinator.generation_phase(), GenerationPhase::Settled);
        assert!(f.coordinator.last_error().is_none());
    }

    #[tokio::test]
    async fn test_dropped_generate_releases_flag() {
        let gate = Arc::new(Notify::new());
        let f = fixture_with(MockGenerationClient::new().with_gate(gate), CoordinatorConfig::default());
        f.client.push_generate(Ok(response("never", "x")));

        let result = tokio::time::timeout(
            Duration::from_millis(20),
            f.coordinator.generate("a house", GenerationOptions::default()),
        )
        .await;

        assert!(result.is_err());
        assert!(!f.coordinator.is_generating());
        assert_eq!(f.coordinator.generation_phase(), GenerationPhase::Failed);
        assert!(f.coordinator.plans().is_empty());
    }

    #[tokio::test]
    async fn test_acknowledge_returns_to_idle() {
        let f = fixture();
        f.client.push_generate(Err(ClientError::Decode("bad body".to_string())));
        f.coordinator.generate("a house", GenerationOptions::default()).await;
        assert_eq!(f.coordinator.generation_phase(), GenerationPhase::Failed);

        f.coordinator.acknowledge();

        assert_eq!(f.coordinator.generation_phase(), GenerationPhase::Idle);
        assert!(f.coordinator.last_error().is_none());
    }

    #[tokio::test]
    async fn test_next_generate_clears_previous_error() {
        let f = fixture();
        f.client.push_generate(Err(ClientError::Decode("bad body".to_string())));
        f.coordinator.generate("a house", GenerationOptions::default()).await;
        assert!(f.coordinator.last_error().is_some());

        generated(&f, "ok").await;
        assert!(f.coordinator.last_error().is_none());
        assert_eq!(f.coordinator.generation_phase(), GenerationPhase::Settled);
    }

    // save / rename / delete

    #[tokio::test]
    async fn test_save_replaces_only_name() {
        let f = fixture();
        let original = generated(&f, "a").await;

        let mut edited = original.clone();
        edited.name = Some("Beach house".to_string());
        edited.prompt = "tampered".to_string();
        edited.parameters.seed = 1;

        let saved = f.coordinator.save(&edited).await.unwrap();

        assert_eq!(saved.display_name(), "Beach house");
        assert_eq!(saved.prompt, original.prompt);
        assert_eq!(saved.parameters, original.parameters);
        assert_eq!(saved.created_at, original.created_at);
        assert_eq!(f.coordinator.current_plan().unwrap().name.as_deref(), Some("Beach house"));
        assert_eq!(stored_plans(&f.backend)[0].name.as_deref(), Some("Beach house"));
    }

    #[tokio::test]
    async fn test_save_unknown_is_silent() {
        let f = fixture();
        generated(&f, "a").await;
        let writes_before = f.backend.inner().write_count();

        let result = f.coordinator.save(&local_plan("ghost")).await;

        assert!(result.is_none());
        assert_eq!(f.coordinator.plans().len(), 1);
        assert_eq!(f.coordinator.current_plan().unwrap().id, "a");
        assert!(f.coordinator.last_error().is_none());
        assert_eq!(f.backend.inner().write_count(), writes_before);
    }

    #[tokio::test]
    async fn test_rename() {
        let f = fixture();
        generated(&f, "a").await;
        generated(&f, "b").await;

        let renamed = f.coordinator.rename("a", "Cottage").await.unwrap();
        assert_eq!(renamed.name.as_deref(), Some("Cottage"));
        assert_eq!(f.coordinator.find("a").unwrap().name.as_deref(), Some("Cottage"));
        // current is "b" and is untouched
        assert!(f.coordinator.current_plan().unwrap().name.is_none());

        assert!(f.coordinator.rename("zzz", "x").await.is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let f = fixture();
        generated(&f, "a").await;
        generated(&f, "b").await;

        assert!(f.coordinator.delete("b").await);
        assert!(f.coordinator.current_plan().is_none());
        let ids: Vec<_> = f.coordinator.plans().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["a"]);
        assert_eq!(stored_plans(&f.backend).len(), 1);

        let writes_before = f.backend.inner().write_count();
        assert!(!f.coordinator.delete("b").await);
        assert_eq!(f.backend.inner().write_count(), writes_before);
    }

    #[tokio::test]
    async fn test_delete_keeps_other_current() {
        let f = fixture();
        let a = generated(&f, "a").await;
        generated(&f, "b").await;
        f.coordinator.select_current(Some(a));

        assert!(f.coordinator.delete("b").await);
        assert_eq!(f.coordinator.current_plan().unwrap().id, "a");
    }

    // durability

    #[tokio::test]
    async fn test_failed_mirror_keeps_mutation() {
        let f = fixture();
        f.backend.fail_writes(true);

        let plan = generated(&f, "a").await;

        assert_eq!(f.coordinator.plans()[0].id, plan.id);
        assert!(f.coordinator.is_durability_degraded());
        assert!(matches!(f.coordinator.durability_error(), Some(CoordinatorError::Durability(_))));
        assert!(f.coordinator.last_error().is_none());
        assert_eq!(f.backend.failed_writes(), 1);

        f.backend.fail_writes(false);
        assert!(f.coordinator.delete("a").await);
        assert!(!f.coordinator.is_durability_degraded());
    }

    #[tokio::test]
    async fn test_store_writes_land_in_mutation_order() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(GatedStore::new(gate.clone()));
        let client = Arc::new(MockGenerationClient::new());
        client.push_generate(Ok(response("a", "a house")));
        let coordinator = Coordinator::new(client, PlanStore::new(backend.clone()), CoordinatorConfig::default());

        // The generate's write is held at the gate while the delete runs
        let generating = coordinator.generate("a house", GenerationOptions::default());
        let deleting = async {
            while coordinator.find("a").is_none() {
                tokio::task::yield_now().await;
            }
            let (deleted, ()) = tokio::join!(coordinator.delete("a"), async {
                tokio::task::yield_now().await;
                gate.notify_one();
            });
            deleted
        };

        let (generated, deleted) = tokio::join!(generating, deleting);

        assert_eq!(generated.unwrap().id, "a");
        assert!(deleted);
        assert!(coordinator.plans().is_empty());
        let stored: Vec<FloorPlan> = serde_json::from_str(&backend.inner().get(DEFAULT_PLANS_KEY).unwrap()).unwrap();
        assert!(stored.is_empty());
        assert_eq!(backend.inner().write_count(), 2);
    }

    #[tokio::test]
    async fn test_snapshot() {
        let f = fixture();
        generated(&f, "a").await;

        let snapshot = f.coordinator.snapshot();
        assert_eq!(snapshot.plans.len(), 1);
        assert_eq!(snapshot.current.unwrap().id, "a");
        assert_eq!(snapshot.generation, GenerationPhase::Settled);
        assert_eq!(snapshot.load, LoadPhase::Idle);
        assert!(!snapshot.durability_degraded);
    }

    #[tokio::test]
    async fn test_shared_across_tasks() {
        let f = fixture_with(MockGenerationClient::new(), CoordinatorConfig::default());
        f.client.push_generate(Ok(response("t", "a house")));

        let coordinator = f.coordinator.clone();
        let handle = tokio::spawn(async move {
            coordinator.generate("a house", GenerationOptions::default()).await
        });

        assert_eq!(handle.await.unwrap().unwrap().id, "t");
        assert_eq!(f.coordinator.plans().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_backend() {
        let client = Arc::new(MockGenerationClient::new());
        client.push_generate(Ok(response("m", "a house")));
        let backend = Arc::new(MemoryStore::new());
        let coordinator = Coordinator::new(client, PlanStore::new(backend.clone()), CoordinatorConfig::default());

        coordinator.generate("a house", GenerationOptions::default()).await.unwrap();
        assert!(backend.get(DEFAULT_PLANS_KEY).unwrap().contains("\"id\":\"m\""));
    }
}
