//! Assistant sessions: per-user system instruction plus turn history.

use crate::errors::AppError;
use crate::models::FormState;
use crate::services::Content;
use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// The slice of the questionnaire the assistant is told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantProfile {
    pub name: String,
    pub knowledge_level: String,
    pub risk_tolerance: String,
    pub asset_interests: Vec<String>,
    pub objectives: Vec<String>,
}

impl AssistantProfile {
    /// Builds the profile, filling unanswered fields with neutral defaults.
    pub fn from_form(form: &FormState) -> Self {
        let name = form.full_name.trim();
        Self {
            name: if name.is_empty() { "Usuário" } else { name }.to_string(),
            knowledge_level: if form.knowledge_level.is_set() {
                form.knowledge_level.label_pt().to_string()
            } else {
                "iniciante".to_string()
            },
            risk_tolerance: if form.risk_tolerance.is_set() {
                form.risk_tolerance.label_pt().to_string()
            } else {
                "moderado".to_string()
            },
            asset_interests: form.asset_interests.selected_labels(),
            objectives: form.objectives.selected_labels(),
        }
    }

    pub fn system_instruction(&self) -> String {
        let mut context = vec![format!("- Perfil de risco: {}", capitalize(&self.risk_tolerance))];
        if !self.asset_interests.is_empty() {
            context.push(format!(
                "- Interesses em ativos: {}",
                self.asset_interests.join(", ")
            ));
        }
        if !self.objectives.is_empty() {
            context.push(format!("- Objetivos: {}", self.objectives.join(", ")));
        }

        format!("{}\nContexto do usuário:\n{}\n", INSTRUCTION_BODY, context.join("\n"))
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

const INSTRUCTION_BODY: &str = r#"Você é um assistente financeiro inteligente e confiável, especializado em fornecer sugestões de investimentos e informações de mercado PERSONALIZADAS para UM ÚNICO USUÁRIO.
Considere sempre o perfil e as preferências do usuário ao responder.

SUAS RESPOSTAS DEVEM OBRIGATORIAMENTE ESTAR FORMATADAS EM JSON, SEM EXCEÇÃO.
Se o usuário pedir informações que não sejam de mercado, como notícias ou assuntos gerais, responda em JSON dizendo que não possui essa informação.

Comportamento:
- Use linguagem clara, amigável e objetiva, com respostas curtas; se forem longas, divida em tópicos.
- Evite jargões técnicos, a menos que o usuário peça.

Formatação:

1. Para mensagens comuns, use Markdown no campo resposta:
{
  "tipo": "mensagem",
  "resposta": "Sugiro considerar **fundos de ações** voltados para _energia limpa_.\n\n- Opção 1: Fundo A\n- Opção 2: Fundo B"
}

2. Para dados financeiros, como a cotação de uma ação, use o símbolo internacional no campo codigo (por exemplo PETR4.SA, BBDC4.SA ou AMZN). Se mais de uma ação for pedida, envie um array de objetos neste formato:
{
  "tipo": "dado_financeiro",
  "titulo": "Petrobras",
  "codigo": "PETR4.SA",
  "descricao": "Preço atual da ação PETR4.",
  "valor": "R$ 36,45",
  "variacao_dia": "+1.12%",
  "fonte": "B3",
  "data": "2025-06-11"
}
"#;

/// SHA-256 of a system instruction, hex encoded.
pub fn fingerprint(system_instruction: &str) -> String {
    hex::encode(Sha256::digest(system_instruction.as_bytes()))
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    system_instruction: String,
    fingerprint: String,
    history: Vec<Content>,
}

impl ChatSession {
    pub fn new(profile: &AssistantProfile) -> Self {
        let system_instruction = profile.system_instruction();
        Self {
            fingerprint: fingerprint(&system_instruction),
            system_instruction,
            history: Vec::new(),
        }
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    /// Appends a completed exchange.
    pub fn record_turn(&mut self, user_text: &str, model_text: &str) {
        self.history.push(Content::user(user_text));
        self.history.push(Content::model(model_text));
    }
}

pub type SharedChat = Arc<Mutex<ChatSession>>;

/// Active assistant sessions keyed by user id.
#[derive(Clone)]
pub struct ChatSessionRegistry {
    sessions: Cache<Uuid, SharedChat>,
}

impl ChatSessionRegistry {
    pub fn new(idle: Duration) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(idle)
                .build(),
        }
    }

    /// Starts a new session for the user, dropping any previous one.
    pub async fn create(&self, user_id: Uuid, profile: &AssistantProfile) -> SharedChat {
        let session = Arc::new(Mutex::new(ChatSession::new(profile)));
        self.sessions.insert(user_id, session.clone()).await;
        tracing::info!("Chat session started for user {}", user_id);
        session
    }

    pub async fn lookup(&self, user_id: Uuid) -> Option<SharedChat> {
        self.sessions.get(&user_id).await
    }

    pub async fn require(&self, user_id: Uuid) -> Result<SharedChat, AppError> {
        self.lookup(user_id).await.ok_or_else(|| {
            AppError::NotFound("Sessão de chat não encontrada para este usuário.".to_string())
        })
    }

    /// Reuses the live session when it was built from the same profile;
    /// otherwise starts over.
    pub async fn ensure(&self, user_id: Uuid, profile: &AssistantProfile) -> SharedChat {
        if let Some(existing) = self.lookup(user_id).await {
            let wanted = fingerprint(&profile.system_instruction());
            if existing.lock().await.fingerprint() == wanted {
                return existing;
            }
            tracing::info!("Profile changed for user {}, restarting chat session", user_id);
        }
        self.create(user_id, profile).await
    }

    pub async fn evict(&self, user_id: Uuid) {
        self.sessions.invalidate(&user_id).await;
        tracing::debug!("Chat session evicted for user {}", user_id);
    }
}
