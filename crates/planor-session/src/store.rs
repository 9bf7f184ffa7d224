use crate::reduce::{reduce, GenerationFold};
use parking_lot::Mutex;
use planor_client::api::generate_path;
use planor_client::{RequestClient, StreamCallbacks, StreamHandle, StreamTransport};
use planor_core::{
    ChatMessage, ChatSession, ChatStatus, ChatUpdate, NewChatSession, NewPlan, NewRepository,
    Plan, PlanVersion, PlanorError, PlanorResult, Repository, StreamEvent, Transcription,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One in-flight generation for a plan.
///
/// The `id` is the single-flight token: callbacks captured for a
/// generation mutate state only while their id is still the plan's
/// active one, so events from an overtaken stream are dropped.
struct Generation {
    id: Uuid,
    /// The assistant message being grown in place.
    message_id: Uuid,
    fold: GenerationFold,
}

#[derive(Default)]
struct Inner {
    repositories: Vec<Repository>,
    plans: HashMap<String, Plan>,
    versions: HashMap<String, Vec<PlanVersion>>,
    messages: HashMap<String, Vec<ChatMessage>>,
    chat_sessions: HashMap<String, ChatSession>,
    generations: HashMap<String, Generation>,
}

impl Inner {
    /// Latest plan version content by timestamp, normalized to text.
    fn latest_version_text(&self, plan_id: &str) -> Option<String> {
        self.versions
            .get(plan_id)
            .and_then(|versions| versions.iter().max_by_key(|v| v.created_at))
            .map(PlanVersion::content_text)
    }

    /// Folds one non-terminal event into visible state, guarded against
    /// stale callbacks.
    fn apply_event(&mut self, plan_id: &str, gen_id: Uuid, event: &StreamEvent) {
        let Some(generation) = self.generations.get_mut(plan_id) else {
            debug!(%plan_id, "Dropping event for finished generation");
            return;
        };
        if generation.id != gen_id {
            debug!(%plan_id, "Dropping event from overtaken generation");
            return;
        }

        generation.fold = reduce(std::mem::take(&mut generation.fold), event);

        match event {
            StreamEvent::Chunk { .. } => {
                let content = generation.fold.buffer.clone();
                let message_id = generation.message_id;
                let messages = self.messages.entry(plan_id.to_string()).or_default();
                match messages.iter_mut().find(|m| m.id == message_id) {
                    Some(existing) => existing.content = content,
                    None => {
                        let mut message = ChatMessage::assistant(content);
                        message.id = message_id;
                        messages.push(message);
                    }
                }
            }
            StreamEvent::NameUpdate { name } => {
                // Display name only; versions are untouched.
                if let Some(plan) = self.plans.get_mut(plan_id) {
                    plan.name = name.clone();
                } else {
                    debug!(%plan_id, "Name update for plan not in store");
                }
            }
            _ => {}
        }
    }

    /// Clears the in-flight slot after a successful terminal event.
    fn finish_ok(&mut self, plan_id: &str, gen_id: Uuid) {
        if !self.owns_generation(plan_id, gen_id) {
            return;
        }
        self.generations.remove(plan_id);
        info!(%plan_id, "Generation complete");
    }

    /// Clears the in-flight slot after a failed terminal event and
    /// appends a distinct failure message. The partial assistant
    /// message, if any, is preserved untouched.
    fn finish_err(&mut self, plan_id: &str, gen_id: Uuid, err: &PlanorError) {
        if !self.owns_generation(plan_id, gen_id) {
            return;
        }
        self.generations.remove(plan_id);
        self.messages
            .entry(plan_id.to_string())
            .or_default()
            .push(ChatMessage::assistant(format!(
                "Plan generation failed: {err}"
            )));
        warn!(%plan_id, error = %err, "Generation failed");
    }

    fn owns_generation(&self, plan_id: &str, gen_id: Uuid) -> bool {
        matches!(self.generations.get(plan_id), Some(g) if g.id == gen_id)
    }
}

/// The canonical client-side state container.
///
/// Holds repositories, plans, chat transcripts and plan versions, and
/// reconciles both streaming events and ordinary CRUD responses into a
/// consistent view. All mutation happens under one internal lock;
/// stream callbacks hold a handle to the same state.
pub struct SessionStore {
    client: Arc<RequestClient>,
    inner: Arc<Mutex<Inner>>,
}

impl SessionStore {
    /// Creates a store backed by `client`.
    pub fn new(client: Arc<RequestClient>) -> Self {
        Self {
            client,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    // --- Accessors ---

    /// Repositories last fetched from the backend.
    pub fn repositories(&self) -> Vec<Repository> {
        self.inner.lock().repositories.clone()
    }

    /// One plan, if the store has seen it.
    pub fn plan(&self, plan_id: &str) -> Option<Plan> {
        self.inner.lock().plans.get(plan_id).cloned()
    }

    /// The conversation transcript for a plan, in chronological order.
    pub fn messages(&self, plan_id: &str) -> Vec<ChatMessage> {
        self.inner
            .lock()
            .messages
            .get(plan_id)
            .cloned()
            .unwrap_or_default()
    }

    /// The current plan version: the maximum version number seen.
    pub fn current_version(&self, plan_id: &str) -> Option<PlanVersion> {
        self.inner
            .lock()
            .versions
            .get(plan_id)
            .and_then(|versions| versions.iter().max_by_key(|v| v.version))
            .cloned()
    }

    /// Whether a generation is in flight for the plan.
    pub fn is_loading(&self, plan_id: &str) -> bool {
        self.inner.lock().generations.contains_key(plan_id)
    }

    // --- CRUD reconciliation ---

    /// Fetches repositories and adopts the result.
    pub async fn refresh_repositories(&self) -> PlanorResult<Vec<Repository>> {
        let repositories = self.client.list_repositories().await?;
        self.inner.lock().repositories = repositories.clone();
        Ok(repositories)
    }

    /// Registers a repository and adds it to the store.
    pub async fn add_repository(&self, repo: &NewRepository) -> PlanorResult<Repository> {
        let created = self.client.create_repository(repo).await?;
        self.inner.lock().repositories.push(created.clone());
        Ok(created)
    }

    /// Fetches a repository's plans and adopts them.
    pub async fn refresh_plans(&self, repo_id: &str) -> PlanorResult<Vec<Plan>> {
        let plans = self.client.list_plans(repo_id).await?;
        let mut inner = self.inner.lock();
        for plan in &plans {
            inner.plans.insert(plan.id.clone(), plan.clone());
        }
        Ok(plans)
    }

    /// Creates a plan and adds it to the store.
    pub async fn add_plan(&self, repo_id: &str, plan: &NewPlan) -> PlanorResult<Plan> {
        let created = self.client.create_plan(repo_id, plan).await?;
        self.inner
            .lock()
            .plans
            .insert(created.id.clone(), created.clone());
        Ok(created)
    }

    /// Fetches a plan's versions and adopts them. Version numbers are
    /// backend-fabricated and non-decreasing; the store never invents
    /// one.
    pub async fn refresh_plan_versions(&self, plan_id: &str) -> PlanorResult<Vec<PlanVersion>> {
        let versions = self.client.list_plan_versions(plan_id).await?;
        self.inner
            .lock()
            .versions
            .insert(plan_id.to_string(), versions.clone());
        Ok(versions)
    }

    /// Fetches the plan's chat session and seeds the local transcript
    /// from the durable copy when the local one is still empty.
    pub async fn load_chat(&self, plan_id: &str) -> PlanorResult<ChatSession> {
        let session = self.client.get_chat(plan_id).await?;
        let mut inner = self.inner.lock();
        let local = inner.messages.entry(plan_id.to_string()).or_default();
        if local.is_empty() {
            *local = session.messages.clone();
        }
        inner
            .chat_sessions
            .insert(plan_id.to_string(), session.clone());
        Ok(session)
    }

    /// Transcribes an encoded audio buffer. Pure pass-through; audio
    /// capture and encoding live outside this crate.
    pub async fn transcribe(
        &self,
        audio: &[u8],
        prompt: Option<&str>,
    ) -> PlanorResult<Transcription> {
        self.client.transcribe(audio, prompt).await
    }

    /// Sends a plain chat message (no generation).
    ///
    /// The message appears locally at once; persistence follows through
    /// the chat CRUD. On success the backend-returned session is
    /// adopted as canonical — an id swap, not a duplicate append. On
    /// failure the optimistic message is kept: user input is never
    /// silently discarded.
    pub async fn send_message(
        &self,
        plan_id: &str,
        content: impl Into<String>,
    ) -> PlanorResult<ChatSession> {
        let message = ChatMessage::user(content);
        let (existing_chat, transcript) = {
            let mut inner = self.inner.lock();
            let messages = inner.messages.entry(plan_id.to_string()).or_default();
            messages.push(message);
            let transcript = messages.clone();
            let existing = inner.chat_sessions.get(plan_id).map(|s| s.id.clone());
            (existing, transcript)
        };

        let result = match existing_chat {
            Some(chat_id) => {
                self.client
                    .update_chat(
                        &chat_id,
                        &ChatUpdate {
                            messages: Some(transcript),
                            status: None,
                        },
                    )
                    .await
            }
            None => {
                self.client
                    .create_chat(
                        plan_id,
                        &NewChatSession {
                            messages: transcript,
                            status: ChatStatus::Active,
                        },
                    )
                    .await
            }
        };

        match result {
            Ok(session) => {
                self.inner
                    .lock()
                    .chat_sessions
                    .insert(plan_id.to_string(), session.clone());
                Ok(session)
            }
            Err(e) => {
                warn!(%plan_id, error = %e, "Chat persist failed; optimistic message kept");
                Err(e)
            }
        }
    }

    // --- Generation ---

    /// Starts a streaming generation for a plan.
    ///
    /// Appends the user message optimistically, snapshots the current
    /// plan artifact and transcript as context, and opens the stream.
    /// At most one generation per plan may be in flight: a second call
    /// while one is active is rejected and leaves state untouched.
    ///
    /// The returned handle cancels the stream; the store's loading flag
    /// clears when a terminal event (including abort) is dispatched.
    pub fn generate_plan(
        &self,
        plan_id: &str,
        user_message: impl Into<String>,
    ) -> PlanorResult<StreamHandle> {
        let user_message = user_message.into();
        let gen_id = Uuid::new_v4();

        // Claim the in-flight slot and snapshot context in one lock.
        let (artifact, transcript) = {
            let mut inner = self.inner.lock();
            if inner.generations.contains_key(plan_id) {
                return Err(PlanorError::Session(format!(
                    "generation already in progress for plan {plan_id}"
                )));
            }
            inner
                .messages
                .entry(plan_id.to_string())
                .or_default()
                .push(ChatMessage::user(user_message.clone()));

            let artifact = inner.latest_version_text(plan_id);
            let transcript = inner
                .messages
                .get(plan_id)
                .cloned()
                .unwrap_or_default();
            inner.generations.insert(
                plan_id.to_string(),
                Generation {
                    id: gen_id,
                    message_id: Uuid::new_v4(),
                    fold: GenerationFold::default(),
                },
            );
            (artifact, transcript)
        };

        info!(%plan_id, "Starting plan generation");
        let body = serde_json::json!({
            "user_message": user_message,
            "plan_artifact": artifact,
            "chat_messages": transcript,
        });

        let on_message = {
            let inner = Arc::clone(&self.inner);
            let plan_id = plan_id.to_string();
            move |event: StreamEvent| {
                inner.lock().apply_event(&plan_id, gen_id, &event);
            }
        };
        let on_error = {
            let inner = Arc::clone(&self.inner);
            let plan_id = plan_id.to_string();
            move |err: PlanorError| {
                inner.lock().finish_err(&plan_id, gen_id, &err);
            }
        };
        let on_complete = {
            let inner = Arc::clone(&self.inner);
            let plan_id = plan_id.to_string();
            move || {
                inner.lock().finish_ok(&plan_id, gen_id);
            }
        };

        Ok(StreamTransport::open(
            Arc::clone(&self.client),
            generate_path(plan_id),
            body,
            StreamCallbacks::new(on_message, on_error, on_complete),
        ))
    }
}
