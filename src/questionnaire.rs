//! Per-user questionnaire sessions.
//!
//! A session pairs the answers with the step controller. Sessions live in an
//! explicit registry with idle expiry; each one sits behind its own mutex so a
//! user's edits apply one at a time.

use crate::errors::AppError;
use crate::form_state::FormUpdate;
use crate::models::{ErrorState, FormState};
use crate::step_controller::{AdvanceOutcome, BackSignal, Step, StepController, TOTAL_STEPS};
use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Client-facing view of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionnaireSnapshot {
    pub step: Step,
    pub total_steps: u8,
    pub progress: f64,
    pub title: &'static str,
    pub form: FormState,
    pub errors: ErrorState,
}

#[derive(Debug, Clone)]
pub struct QuestionnaireSession {
    seed: FormState,
    form: FormState,
    controller: StepController,
}

impl QuestionnaireSession {
    /// Starts at step 1 with `seed` (blank apart from known identity fields).
    pub fn new(seed: FormState) -> Self {
        Self {
            form: seed.clone(),
            seed,
            controller: StepController::new(),
        }
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn step(&self) -> Step {
        self.controller.step()
    }

    pub fn errors(&self) -> &ErrorState {
        self.controller.errors()
    }

    /// Email the session was seeded with, if any.
    pub fn authenticated_email(&self) -> Option<&str> {
        Some(self.seed.email.as_str()).filter(|e| !e.is_empty())
    }

    pub fn apply(&mut self, update: FormUpdate) {
        self.form = self.form.apply(update);
    }

    pub fn advance(&mut self) -> AdvanceOutcome {
        self.controller.advance(&self.form)
    }

    pub fn retreat(&mut self) -> Step {
        self.controller.retreat()
    }

    pub fn back_signal(&mut self) -> BackSignal {
        self.controller.back_signal()
    }

    /// Back to the seeded blank record on step 1.
    pub fn reset(&mut self) {
        self.form = self.seed.clone();
        self.controller.reset();
    }

    /// Applies the result of loading the stored record. A found record
    /// overwrites every local edit and clears the errors raised against the
    /// old values; a missing record or a failed load resets the session, and
    /// the failure is passed on.
    pub fn resume(&mut self, fetched: Result<Option<FormState>, AppError>) -> Result<bool, AppError> {
        match fetched {
            Ok(Some(form)) => {
                self.form = form;
                self.controller.clear_errors();
                Ok(true)
            }
            Ok(None) => {
                self.reset();
                Ok(false)
            }
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    pub fn snapshot(&self) -> QuestionnaireSnapshot {
        let step = self.step();
        QuestionnaireSnapshot {
            step,
            total_steps: TOTAL_STEPS,
            progress: step.progress(),
            title: step.title(),
            form: self.form.clone(),
            errors: self.errors().clone(),
        }
    }
}

pub type SharedQuestionnaire = Arc<Mutex<QuestionnaireSession>>;

/// Active questionnaire sessions keyed by user id.
#[derive(Clone)]
pub struct QuestionnaireRegistry {
    sessions: Cache<Uuid, SharedQuestionnaire>,
}

impl QuestionnaireRegistry {
    pub fn new(idle: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(idle)
                .build(),
        }
    }

    /// Starts a fresh session, replacing any previous one for the user.
    pub async fn create(&self, user_id: Uuid, seed: FormState) -> SharedQuestionnaire {
        let session = Arc::new(Mutex::new(QuestionnaireSession::new(seed)));
        self.sessions.insert(user_id, session.clone()).await;
        tracing::info!("Questionnaire session started for user {}", user_id);
        session
    }

    pub async fn lookup(&self, user_id: Uuid) -> Option<SharedQuestionnaire> {
        self.sessions.get(&user_id).await
    }

    /// Like [`lookup`](Self::lookup), but a missing session is an error.
    pub async fn require(&self, user_id: Uuid) -> Result<SharedQuestionnaire, AppError> {
        self.lookup(user_id).await.ok_or_else(|| {
            AppError::NotFound(format!("Questionário não iniciado para o usuário {}", user_id))
        })
    }

    pub async fn evict(&self, user_id: Uuid) {
        self.sessions.invalidate(&user_id).await;
        tracing::debug!("Questionnaire session evicted for user {}", user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form_state::FieldUpdate;

    #[test]
    fn test_reset_returns_to_seed() {
        let mut session = QuestionnaireSession::new(FormState::seeded(Some("ana@example.com"), None));
        session.apply(FormUpdate::Field(FieldUpdate::FullName("Ana".to_string())));
        session.advance();
        session.reset();

        assert_eq!(session.form().email, "ana@example.com");
        assert_eq!(session.form().full_name, "");
        assert_eq!(session.step(), Step::FIRST);
        assert!(session.errors().is_clear());
    }

    #[test]
    fn test_resume_overwrites_local_edits() {
        let mut session = QuestionnaireSession::new(FormState::default());
        session.apply(FormUpdate::Field(FieldUpdate::Phone("local".to_string())));

        let stored = FormState {
            full_name: "Ana".to_string(),
            ..FormState::default()
        };
        assert!(session.resume(Ok(Some(stored))).unwrap());
        assert_eq!(session.form().full_name, "Ana");
        assert_eq!(session.form().phone, "");
    }

    #[test]
    fn test_resume_drops_errors_from_replaced_values() {
        let mut session = QuestionnaireSession::new(FormState::default());
        assert_eq!(session.advance(), AdvanceOutcome::Blocked);
        assert!(!session.errors().full_name.is_empty());

        let stored = FormState {
            full_name: "Ana".to_string(),
            ..FormState::default()
        };
        assert!(session.resume(Ok(Some(stored))).unwrap());
        assert!(session.errors().is_clear());
        assert_eq!(session.step(), Step::FIRST);
    }

    #[test]
    fn test_failed_resume_resets_and_reports() {
        let mut session = QuestionnaireSession::new(FormState::default());
        session.apply(FormUpdate::Field(FieldUpdate::Phone("local".to_string())));

        let err = session
            .resume(Err(AppError::ServiceUnavailable("down".to_string())))
            .unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
        assert_eq!(session.form(), &FormState::default());

        session.apply(FormUpdate::Field(FieldUpdate::Phone("again".to_string())));
        assert!(!session.resume(Ok(None)).unwrap());
        assert_eq!(session.form().phone, "");
    }

    #[test]
    fn test_snapshot_shape() {
        let session = QuestionnaireSession::new(FormState::default());
        let value = serde_json::to_value(session.snapshot()).unwrap();

        assert_eq!(value["step"], 1);
        assert_eq!(value["total_steps"], 6);
        assert_eq!(value["title"], "Informações Pessoais");
        assert!(value["form"].get("fullName").is_some());
    }

    #[tokio::test]
    async fn test_registry_create_lookup_evict() {
        let registry = QuestionnaireRegistry::new(Duration::from_secs(60));
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(registry.lookup(user).await.is_none());
        registry.create(user, FormState::default()).await;
        registry.create(other, FormState::default()).await;

        {
            let session = registry.require(user).await.unwrap();
            session
                .lock()
                .await
                .apply(FormUpdate::Field(FieldUpdate::FullName("Ana".to_string())));
        }
        let other_session = registry.require(other).await.unwrap();
        assert_eq!(other_session.lock().await.form().full_name, "");

        registry.evict(user).await;
        assert!(matches!(
            registry.require(user).await,
            Err(AppError::NotFound(_))
        ));
    }
}
