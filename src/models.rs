use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ============ Questionnaire Models ============

/// Reads a field that may be `null` in stored records as its default value.
///
/// Records written by older app versions carry `null` for fields the user never
/// touched; everything downstream assumes presence.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Investor knowledge level (suitability, step 3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeLevel {
    #[default]
    #[serde(rename = "")]
    Unset,
    Beginner,
    Intermediate,
    Advanced,
}

impl KnowledgeLevel {
    pub fn is_set(self) -> bool {
        self != Self::Unset
    }

    pub fn label_pt(self) -> &'static str {
        match self {
            Self::Beginner => "Iniciante",
            Self::Intermediate => "Intermediário",
            Self::Advanced => "Avançado",
            Self::Unset => NOT_INFORMED,
        }
    }
}

/// Risk tolerance (suitability, step 3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    #[default]
    #[serde(rename = "")]
    Unset,
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskTolerance {
    pub fn is_set(self) -> bool {
        self != Self::Unset
    }

    /// Wire token, as sent to external services.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
            Self::Unset => "",
        }
    }

    pub fn label_pt(self) -> &'static str {
        match self {
            Self::Conservative => "Conservador",
            Self::Moderate => "Moderado",
            Self::Aggressive => "Agressivo",
            Self::Unset => NOT_INFORMED,
        }
    }
}

/// Investment horizon (suitability, step 3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentHorizon {
    #[default]
    #[serde(rename = "")]
    Unset,
    Short,
    Medium,
    Long,
}

impl InvestmentHorizon {
    pub fn is_set(self) -> bool {
        self != Self::Unset
    }

    pub fn label_pt(self) -> &'static str {
        match self {
            Self::Short => "Curto prazo (até 2 anos)",
            Self::Medium => "Médio prazo (2 a 5 anos)",
            Self::Long => "Longo prazo (mais de 5 anos)",
            Self::Unset => NOT_INFORMED,
        }
    }
}

/// Liquidity preference (step 4).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiquidityPreference {
    #[default]
    #[serde(rename = "")]
    Unset,
    High,
    Medium,
    Low,
}

impl LiquidityPreference {
    pub fn is_set(self) -> bool {
        self != Self::Unset
    }

    pub fn label_pt(self) -> &'static str {
        match self {
            Self::High => "Alta",
            Self::Medium => "Média",
            Self::Low => "Baixa",
            Self::Unset => NOT_INFORMED,
        }
    }
}

pub const NOT_INFORMED: &str = "Não informado";

/// Planned monthly contribution (step 2).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonthlyContribution {
    #[serde(deserialize_with = "null_as_default")]
    pub has_contribution: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub amount: String,
}

/// Investment objectives (step 3). `other` requires `other_text`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Objectives {
    #[serde(deserialize_with = "null_as_default")]
    pub emergency_reserve: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub retirement: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub real_estate: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub short_term_profit: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub other: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub other_text: String,
}

impl Objectives {
    pub fn any_selected(&self) -> bool {
        self.emergency_reserve
            || self.retirement
            || self.real_estate
            || self.short_term_profit
            || self.other
    }

    /// Plain-language labels of the selected objectives, in form order.
    pub fn selected_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = [
            (self.emergency_reserve, "Reserva de emergência"),
            (self.retirement, "Aposentadoria"),
            (self.real_estate, "Compra de imóvel"),
            (self.short_term_profit, "Lucro no curto prazo"),
        ]
        .into_iter()
        .filter(|(selected, _)| *selected)
        .map(|(_, label)| label.to_string())
        .collect();

        if self.other {
            labels.push(other_label(&self.other_text));
        }
        labels
    }
}

/// Asset classes of interest (step 4). `other` requires `other_text`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetInterests {
    #[serde(deserialize_with = "null_as_default")]
    pub fixed_income: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub stocks: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub real_estate_funds: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub multi_market_funds: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub crypto: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub etfs: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub other: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub other_text: String,
}

impl AssetInterests {
    pub fn any_selected(&self) -> bool {
        self.fixed_income
            || self.stocks
            || self.real_estate_funds
            || self.multi_market_funds
            || self.crypto
            || self.etfs
            || self.other
    }

    /// Plain-language labels of the selected asset classes, in form order.
    pub fn selected_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = [
            (self.fixed_income, "Renda Fixa"),
            (self.stocks, "Ações"),
            (self.real_estate_funds, "Fundos Imobiliários"),
            (self.multi_market_funds, "Fundos Multimercado"),
            (self.crypto, "Criptoativos"),
            (self.etfs, "ETFs"),
        ]
        .into_iter()
        .filter(|(selected, _)| *selected)
        .map(|(_, label)| label.to_string())
        .collect();

        if self.other {
            labels.push(other_label(&self.other_text));
        }
        labels
    }

    /// Wire keys of the selected asset classes (camelCase, as stored).
    pub fn selected_keys(&self) -> Vec<&'static str> {
        [
            (self.fixed_income, "fixedIncome"),
            (self.stocks, "stocks"),
            (self.real_estate_funds, "realEstateFunds"),
            (self.multi_market_funds, "multiMarketFunds"),
            (self.crypto, "crypto"),
            (self.etfs, "etfs"),
            (self.other, "other"),
        ]
        .into_iter()
        .filter(|(selected, _)| *selected)
        .map(|(_, key)| key)
        .collect()
    }
}

fn other_label(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        "Outro".to_string()
    } else {
        text.to_string()
    }
}

/// One user's questionnaire answers.
///
/// Persisted as a single opaque JSON record (`dados`). Every field defaults when
/// missing or `null`, so a partially stored record always loads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormState {
    // Personal information
    #[serde(deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    /// CPF
    #[serde(deserialize_with = "null_as_default")]
    pub document_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub birth_date: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,

    // Financial profile
    #[serde(deserialize_with = "null_as_default")]
    pub monthly_income: String,
    #[serde(deserialize_with = "null_as_default")]
    pub total_assets: String,
    #[serde(deserialize_with = "null_as_default")]
    pub investment_amount: String,
    #[serde(deserialize_with = "null_as_default")]
    pub monthly_contribution: MonthlyContribution,

    // Investor profile (suitability)
    #[serde(deserialize_with = "null_as_default")]
    pub knowledge_level: KnowledgeLevel,
    #[serde(deserialize_with = "null_as_default")]
    pub risk_tolerance: RiskTolerance,
    #[serde(deserialize_with = "null_as_default")]
    pub objectives: Objectives,
    #[serde(deserialize_with = "null_as_default")]
    pub investment_horizon: InvestmentHorizon,

    // Personal preferences
    #[serde(deserialize_with = "null_as_default")]
    pub liquidity_preference: LiquidityPreference,
    #[serde(deserialize_with = "null_as_default")]
    pub esg_interest: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub previous_investment_experience: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub asset_interests: AssetInterests,

    // Terms and consents
    #[serde(deserialize_with = "null_as_default")]
    pub terms_accepted: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub data_use_consent: bool,
}

impl FormState {
    /// Blank record pre-filled with identity data already known for the user
    /// (e.g. the authenticated email).
    pub fn seeded(email: Option<&str>, document_id: Option<&str>) -> Self {
        Self {
            email: email.unwrap_or_default().to_string(),
            document_id: document_id.unwrap_or_default().to_string(),
            ..Self::default()
        }
    }
}

/// Per-field validation messages. An empty string means no error.
///
/// Field names follow the questionnaire screen, which shows each message under
/// its input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ErrorState {
    pub full_name: String,
    pub email: String,
    pub document_id: String,
    pub birth_date: String,
    pub phone: String,
    pub monthly_income: String,
    pub total_assets: String,
    pub investment_amount: String,
    pub monthly_contribution_amount: String,
    pub knowledge_level: String,
    pub risk_tolerance: String,
    pub objectives: String,
    pub investment_horizon: String,
    pub other_objective: String,
    pub liquidity_preference: String,
    pub asset_interests: String,
    pub other_asset: String,
    pub terms: String,
}

/// Names of the slots in [`ErrorState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorField {
    FullName,
    Email,
    DocumentId,
    BirthDate,
    Phone,
    MonthlyIncome,
    TotalAssets,
    InvestmentAmount,
    MonthlyContributionAmount,
    KnowledgeLevel,
    RiskTolerance,
    Objectives,
    InvestmentHorizon,
    OtherObjective,
    LiquidityPreference,
    AssetInterests,
    OtherAsset,
    Terms,
}

impl ErrorState {
    pub fn slot_mut(&mut self, field: ErrorField) -> &mut String {
        match field {
            ErrorField::FullName => &mut self.full_name,
            ErrorField::Email => &mut self.email,
            ErrorField::DocumentId => &mut self.document_id,
            ErrorField::BirthDate => &mut self.birth_date,
            ErrorField::Phone => &mut self.phone,
            ErrorField::MonthlyIncome => &mut self.monthly_income,
            ErrorField::TotalAssets => &mut self.total_assets,
            ErrorField::InvestmentAmount => &mut self.investment_amount,
            ErrorField::MonthlyContributionAmount => &mut self.monthly_contribution_amount,
            ErrorField::KnowledgeLevel => &mut self.knowledge_level,
            ErrorField::RiskTolerance => &mut self.risk_tolerance,
            ErrorField::Objectives => &mut self.objectives,
            ErrorField::InvestmentHorizon => &mut self.investment_horizon,
            ErrorField::OtherObjective => &mut self.other_objective,
            ErrorField::LiquidityPreference => &mut self.liquidity_preference,
            ErrorField::AssetInterests => &mut self.asset_interests,
            ErrorField::OtherAsset => &mut self.other_asset,
            ErrorField::Terms => &mut self.terms,
        }
    }

    pub fn is_clear(&self) -> bool {
        self == &Self::default()
    }
}

// ============ Chat Models ============

/// Who produced a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// A market quote card, as produced by the assistant and completed by the
/// quote enrichment pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialCard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub titulo: Option<String>,
    /// Ticker used for quote and history lookups.
    pub codigo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descricao: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variacao_dia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fonte: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Raw history service payload (candles or error indicator), for charts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub historico: Option<Value>,
}

/// One normalized assistant payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tipo")]
pub enum AssistantReply {
    #[serde(rename = "mensagem")]
    Message { resposta: String },
    #[serde(rename = "dado_financeiro")]
    FinancialData(FinancialCard),
}

impl AssistantReply {
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message {
            resposta: text.into(),
        }
    }
}

/// A message in the chat transcript. Transient: never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tipo")]
pub enum ChatMessage {
    #[serde(rename = "mensagem")]
    Text { sender: Sender, text: String },
    #[serde(rename = "dado_financeiro")]
    FinancialData {
        sender: Sender,
        #[serde(flatten)]
        card: FinancialCard,
    },
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::Text {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::Text {
            sender: Sender::Bot,
            text: text.into(),
        }
    }
}

impl From<AssistantReply> for ChatMessage {
    fn from(reply: AssistantReply) -> Self {
        match reply {
            AssistantReply::Message { resposta } => ChatMessage::bot(resposta),
            AssistantReply::FinancialData(card) => ChatMessage::FinancialData {
                sender: Sender::Bot,
                card,
            },
        }
    }
}

// ============ Diversification Models ============

/// Allocation returned by the external diversification API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub total: f64,
    #[serde(default)]
    pub categories: Vec<AllocationCategory>,
    #[serde(default)]
    pub recent: Vec<AllocationEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationCategory {
    pub name: String,
    pub value: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
}
