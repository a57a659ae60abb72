use crate::chat::{ChatAssistant, ChatExchange};
use crate::chat_session::{AssistantProfile, ChatSessionRegistry};
use crate::errors::AppError;
use crate::form_state::FormUpdate;
use crate::models::{Allocation, ChatMessage, FormState, RiskTolerance};
use crate::persistence::ProfileStorage;
use crate::questionnaire::{QuestionnaireRegistry, QuestionnaireSnapshot};
use crate::services::{AllocationRequest, DiversificationService};
use crate::step_controller::{AdvanceOutcome, BackSignal};
use crate::summary::{parse_brl_amount, ProfileSummary};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub const GREETING: &str = "Olá! Sou seu assistente financeiro. Como posso te ajudar hoje?";

/// Shared application state injected into handlers.
pub struct AppState {
    /// Stored questionnaire records.
    pub storage: ProfileStorage,
    /// In-progress questionnaires.
    pub questionnaires: QuestionnaireRegistry,
    /// Live assistant sessions.
    pub chats: ChatSessionRegistry,
    pub assistant: ChatAssistant,
    pub diversification: DiversificationService,
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-investor-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

// ============ Questionnaire ============

#[derive(Debug, Deserialize)]
pub struct StartQuestionnaireRequest {
    pub user_id: Uuid,
    /// Authenticated email, used to seed the form.
    pub email: Option<String>,
    pub document_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    pub outcome: AdvanceOutcome,
    pub questionnaire: QuestionnaireSnapshot,
}

#[derive(Debug, Serialize)]
pub struct BackResponse {
    pub signal: BackSignal,
    pub questionnaire: QuestionnaireSnapshot,
}

#[derive(Debug, Serialize)]
pub struct LoadResponse {
    pub found: bool,
    pub questionnaire: QuestionnaireSnapshot,
}

/// POST /api/v1/questionnaire
///
/// Starts (or restarts) the user's questionnaire on step 1.
pub async fn start_questionnaire(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartQuestionnaireRequest>,
) -> (StatusCode, Json<QuestionnaireSnapshot>) {
    let seed = FormState::seeded(request.email.as_deref(), request.document_id.as_deref());
    let session = state.questionnaires.create(request.user_id, seed).await;
    let snapshot = session.lock().await.snapshot();
    (StatusCode::CREATED, Json(snapshot))
}

/// GET /api/v1/questionnaire/:user_id
pub async fn get_questionnaire(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<QuestionnaireSnapshot>, AppError> {
    let session = state.questionnaires.require(user_id).await?;
    let snapshot = session.lock().await.snapshot();
    Ok(Json(snapshot))
}

/// PATCH /api/v1/questionnaire/:user_id/fields
pub async fn update_questionnaire_field(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(update): Json<FormUpdate>,
) -> Result<Json<QuestionnaireSnapshot>, AppError> {
    let session = state.questionnaires.require(user_id).await?;
    let mut session = session.lock().await;
    session.apply(update);
    Ok(Json(session.snapshot()))
}

/// POST /api/v1/questionnaire/:user_id/advance
///
/// A blocked advance is a normal outcome: the snapshot carries the field errors.
pub async fn advance_questionnaire(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<AdvanceResponse>, AppError> {
    let session = state.questionnaires.require(user_id).await?;
    let mut session = session.lock().await;
    let outcome = session.advance();
    Ok(Json(AdvanceResponse {
        outcome,
        questionnaire: session.snapshot(),
    }))
}

/// POST /api/v1/questionnaire/:user_id/retreat
pub async fn retreat_questionnaire(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<QuestionnaireSnapshot>, AppError> {
    let session = state.questionnaires.require(user_id).await?;
    let mut session = session.lock().await;
    session.retreat();
    Ok(Json(session.snapshot()))
}

/// POST /api/v1/questionnaire/:user_id/back
///
/// Platform back navigation. `signal: "default"` tells the app to leave the
/// questionnaire itself.
pub async fn back_questionnaire(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<BackResponse>, AppError> {
    let session = state.questionnaires.require(user_id).await?;
    let mut session = session.lock().await;
    let signal = session.back_signal();
    Ok(Json(BackResponse {
        signal,
        questionnaire: session.snapshot(),
    }))
}

/// POST /api/v1/questionnaire/:user_id/save
pub async fn save_questionnaire(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<QuestionnaireSnapshot>, AppError> {
    let session = state.questionnaires.require(user_id).await?;
    let session = session.lock().await;
    state
        .storage
        .upsert(user_id, session.authenticated_email(), session.form())
        .await?;
    Ok(Json(session.snapshot()))
}

/// POST /api/v1/questionnaire/:user_id/load
///
/// Resumes from the stored record, discarding local edits. Nothing stored, or
/// a failed load, leaves a blank questionnaire.
pub async fn load_questionnaire(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<LoadResponse>, AppError> {
    let session = state.questionnaires.require(user_id).await?;
    let mut session = session.lock().await;
    let fetched = state.storage.fetch(user_id).await;
    let found = session.resume(fetched)?;
    Ok(Json(LoadResponse {
        found,
        questionnaire: session.snapshot(),
    }))
}

/// POST /api/v1/questionnaire/:user_id/reset
pub async fn reset_questionnaire(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<QuestionnaireSnapshot>, AppError> {
    let session = state.questionnaires.require(user_id).await?;
    let mut session = session.lock().await;
    session.reset();
    Ok(Json(session.snapshot()))
}

/// GET /api/v1/questionnaire/:user_id/summary
pub async fn questionnaire_summary(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ProfileSummary>, AppError> {
    let session = state.questionnaires.require(user_id).await?;
    let summary = ProfileSummary::from_form(session.lock().await.form());
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct DocumentAvailabilityParams {
    pub document_id: String,
    pub user_id: Uuid,
}

/// GET /api/v1/profiles/document-availability
pub async fn document_availability(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DocumentAvailabilityParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let available = state
        .storage
        .is_document_available(&params.document_id, params.user_id)
        .await?;
    Ok(Json(json!({ "available": available })))
}

/// The user's answers: the live questionnaire first, then the stored record.
async fn current_form(state: &AppState, user_id: Uuid) -> Result<Option<FormState>, AppError> {
    if let Some(session) = state.questionnaires.lookup(user_id).await {
        return Ok(Some(session.lock().await.form().clone()));
    }
    state.storage.fetch(user_id).await
}

// ============ Chat ============

#[derive(Debug, Deserialize)]
pub struct StartChatRequest {
    pub user_id: Uuid,
    pub initial_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartChatResponse {
    pub user_id: Uuid,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

/// POST /api/v1/chat/sessions
///
/// Opens the assistant session built from the user's profile, keeping the
/// live one when the profile is unchanged. An unreadable profile falls back
/// to defaults rather than blocking the chat.
pub async fn start_chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartChatRequest>,
) -> (StatusCode, Json<StartChatResponse>) {
    let form = match current_form(&state, request.user_id).await {
        Ok(form) => form.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("Profile unavailable for chat, using defaults: {}", e);
            FormState::default()
        }
    };
    let profile = AssistantProfile::from_form(&form);
    let session = state.chats.ensure(request.user_id, &profile).await;

    let mut messages = vec![ChatMessage::bot(GREETING)];
    if let Some(text) = request.initial_message.filter(|t| !t.trim().is_empty()) {
        messages.extend(state.assistant.send(&session, &text).await.messages);
    }

    (
        StatusCode::CREATED,
        Json(StartChatResponse {
            user_id: request.user_id,
            messages,
        }),
    )
}

/// POST /api/v1/chat/sessions/:user_id/messages
pub async fn send_chat_message(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<ChatExchange>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::BadRequest("Mensagem vazia".to_string()));
    }
    let session = state.chats.require(user_id).await?;
    Ok(Json(state.assistant.send(&session, &request.text).await))
}

/// DELETE /api/v1/chat/sessions/:user_id
pub async fn end_chat(State(state): State<Arc<AppState>>, Path(user_id): Path<Uuid>) -> StatusCode {
    state.chats.evict(user_id).await;
    StatusCode::NO_CONTENT
}

// ============ Diversification ============

/// Simulator request for a profile. Unanswered fields become a moderate
/// profile with nothing to invest.
pub fn allocation_request(form: &FormState) -> AllocationRequest {
    let risk = if form.risk_tolerance.is_set() {
        form.risk_tolerance
    } else {
        RiskTolerance::Moderate
    };
    AllocationRequest {
        risk_tolerance: risk.as_str().to_string(),
        investment_amount: parse_brl_amount(&form.investment_amount).unwrap_or(0.0),
        asset_interests: form
            .asset_interests
            .selected_keys()
            .into_iter()
            .map(str::to_string)
            .collect(),
    }
}

/// GET /api/v1/diversification/:user_id
pub async fn diversification(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Allocation>, AppError> {
    let form = current_form(&state, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Perfil de investidor não encontrado".to_string()))?;
    let allocation = state
        .diversification
        .fetch_allocation(&allocation_request(&form))
        .await?;
    Ok(Json(allocation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetInterests;

    #[test]
    fn test_allocation_request_defaults() {
        let request = allocation_request(&FormState::default());
        assert_eq!(request.risk_tolerance, "moderate");
        assert_eq!(request.investment_amount, 0.0);
        assert!(request.asset_interests.is_empty());
    }

    #[test]
    fn test_allocation_request_from_answers() {
        let form = FormState {
            risk_tolerance: RiskTolerance::Aggressive,
            investment_amount: "R$ 20.000,00".to_string(),
            asset_interests: AssetInterests {
                stocks: true,
                etfs: true,
                ..AssetInterests::default()
            },
            ..FormState::default()
        };
        let request = allocation_request(&form);
        assert_eq!(request.risk_tolerance, "aggressive");
        assert_eq!(request.investment_amount, 20000.0);
        assert_eq!(request.asset_interests, vec!["stocks", "etfs"]);
    }
}
