use crate::config::TimeoutTier;
use crate::request::RequestClient;
use base64::Engine;
use planor_core::{
    ChatSession, ChatUpdate, NewChatSession, NewPlan, NewPlanVersion, NewRepository, Plan,
    PlanUpdate, PlanVersion, PlanorResult, Repository, RepositoryUpdate, Transcription,
};

/// The streaming generation endpoint for a plan.
pub fn generate_path(plan_id: &str) -> String {
    format!("/api/business/plans/{plan_id}/generate")
}

impl RequestClient {
    // --- Repositories ---

    /// Lists all registered repositories.
    pub async fn list_repositories(&self) -> PlanorResult<Vec<Repository>> {
        self.get_json("/api/repositories", TimeoutTier::Default).await
    }

    /// Registers a repository.
    pub async fn create_repository(&self, repo: &NewRepository) -> PlanorResult<Repository> {
        self.post_json("/api/repositories", repo, TimeoutTier::Default)
            .await
    }

    /// Fetches one repository.
    pub async fn get_repository(&self, repo_id: &str) -> PlanorResult<Repository> {
        self.get_json(&format!("/api/repositories/{repo_id}"), TimeoutTier::Default)
            .await
    }

    /// Applies a partial update to a repository.
    pub async fn update_repository(
        &self,
        repo_id: &str,
        patch: &RepositoryUpdate,
    ) -> PlanorResult<Repository> {
        self.put_json(
            &format!("/api/repositories/{repo_id}"),
            patch,
            TimeoutTier::Default,
        )
        .await
    }

    /// Removes a repository.
    pub async fn delete_repository(&self, repo_id: &str) -> PlanorResult<()> {
        self.delete(&format!("/api/repositories/{repo_id}"), TimeoutTier::Default)
            .await
    }

    // --- Plans ---

    /// Lists the plans of a repository.
    pub async fn list_plans(&self, repo_id: &str) -> PlanorResult<Vec<Plan>> {
        self.get_json(
            &format!("/api/repositories/{repo_id}/plans"),
            TimeoutTier::Default,
        )
        .await
    }

    /// Creates a plan under a repository.
    pub async fn create_plan(&self, repo_id: &str, plan: &NewPlan) -> PlanorResult<Plan> {
        self.post_json(
            &format!("/api/repositories/{repo_id}/plans"),
            plan,
            TimeoutTier::Long,
        )
        .await
    }

    /// Fetches one plan.
    pub async fn get_plan(&self, plan_id: &str) -> PlanorResult<Plan> {
        self.get_json(&format!("/api/plans/{plan_id}"), TimeoutTier::Default)
            .await
    }

    /// Applies a partial update to a plan.
    pub async fn update_plan(&self, plan_id: &str, patch: &PlanUpdate) -> PlanorResult<Plan> {
        self.put_json(&format!("/api/plans/{plan_id}"), patch, TimeoutTier::Default)
            .await
    }

    /// Removes a plan.
    pub async fn delete_plan(&self, plan_id: &str) -> PlanorResult<()> {
        self.delete(&format!("/api/plans/{plan_id}"), TimeoutTier::Default)
            .await
    }

    // --- Plan versions ---

    /// Lists the recorded versions of a plan.
    pub async fn list_plan_versions(&self, plan_id: &str) -> PlanorResult<Vec<PlanVersion>> {
        self.get_json(
            &format!("/api/plans/{plan_id}/plan_versions"),
            TimeoutTier::Default,
        )
        .await
    }

    /// Records a plan version. Long tier: the backend may diff and
    /// index the content before answering.
    pub async fn create_plan_version(
        &self,
        plan_id: &str,
        version: &NewPlanVersion,
    ) -> PlanorResult<PlanVersion> {
        self.post_json(
            &format!("/api/plans/{plan_id}/plan_versions"),
            version,
            TimeoutTier::Long,
        )
        .await
    }

    /// Fetches one plan version.
    pub async fn get_plan_version(&self, version_id: &str) -> PlanorResult<PlanVersion> {
        self.get_json(
            &format!("/api/plan_versions/{version_id}"),
            TimeoutTier::Default,
        )
        .await
    }

    /// Removes a plan version.
    pub async fn delete_plan_version(&self, version_id: &str) -> PlanorResult<()> {
        self.delete(
            &format!("/api/plan_versions/{version_id}"),
            TimeoutTier::Default,
        )
        .await
    }

    // --- Chat sessions ---

    /// Fetches the chat session attached to a plan.
    pub async fn get_chat(&self, plan_id: &str) -> PlanorResult<ChatSession> {
        self.get_json(&format!("/api/plans/{plan_id}/chat"), TimeoutTier::Default)
            .await
    }

    /// Creates the chat session for a plan.
    pub async fn create_chat(
        &self,
        plan_id: &str,
        session: &NewChatSession,
    ) -> PlanorResult<ChatSession> {
        self.post_json(
            &format!("/api/plans/{plan_id}/chat"),
            session,
            TimeoutTier::Default,
        )
        .await
    }

    /// Applies a partial update to a chat session.
    pub async fn update_chat(
        &self,
        chat_id: &str,
        patch: &ChatUpdate,
    ) -> PlanorResult<ChatSession> {
        self.put_json(&format!("/api/chat/{chat_id}"), patch, TimeoutTier::Default)
            .await
    }

    // --- Transcription ---

    /// Transcribes an encoded audio buffer.
    ///
    /// The buffer is shipped base64-encoded; capture and encoding are
    /// the caller's concern.
    pub async fn transcribe(
        &self,
        audio: &[u8],
        prompt: Option<&str>,
    ) -> PlanorResult<Transcription> {
        let body = serde_json::json!({
            "audio_b64": base64::engine::general_purpose::STANDARD.encode(audio),
            "prompt": prompt,
        });
        self.post_json("/api/transcribe", &body, TimeoutTier::Long)
            .await
    }
}
