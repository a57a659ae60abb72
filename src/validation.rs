/// Per-step questionnaire validators.
///
/// Pure functions over a [`FormState`] snapshot: they never touch the record and
/// never fail, they only report which error slots to fill for the step.
use crate::models::{ErrorField, ErrorState, FormState};
use crate::step_controller::Step;

pub const MSG_FULL_NAME: &str = "O nome completo é obrigatório";
pub const MSG_EMAIL: &str = "O e-mail é obrigatório";
pub const MSG_DOCUMENT_ID: &str = "O CPF é obrigatório";
pub const MSG_BIRTH_DATE: &str = "A data de nascimento é obrigatória";
pub const MSG_MONTHLY_INCOME: &str = "A renda mensal é obrigatória";
pub const MSG_TOTAL_ASSETS: &str = "O patrimônio total é obrigatório";
pub const MSG_INVESTMENT_AMOUNT: &str = "O valor disponível para investir é obrigatório";
pub const MSG_CONTRIBUTION_AMOUNT: &str = "O valor do aporte mensal é obrigatório";
pub const MSG_KNOWLEDGE_LEVEL: &str = "Selecione seu nível de conhecimento";
pub const MSG_RISK_TOLERANCE: &str = "Selecione sua tolerância ao risco";
pub const MSG_OBJECTIVES: &str = "Selecione pelo menos um objetivo";
pub const MSG_OTHER_OBJECTIVE: &str = "Descreva seu outro objetivo";
pub const MSG_INVESTMENT_HORIZON: &str = "Selecione seu horizonte de investimento";
pub const MSG_LIQUIDITY: &str = "Selecione sua preferência por liquidez";
pub const MSG_ASSET_INTERESTS: &str = "Selecione pelo menos um tipo de ativo";
pub const MSG_OTHER_ASSET: &str = "Especifique o outro tipo de ativo";
pub const MSG_TERMS: &str = "É necessário aceitar os termos e consentimentos para continuar";

/// Outcome of validating one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepValidation {
    pub is_valid: bool,
    /// Only the failing slots; every other slot of the step is implicitly clear.
    pub errors: Vec<(ErrorField, &'static str)>,
}

impl StepValidation {
    fn from_errors(errors: Vec<(ErrorField, &'static str)>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn message_for(&self, field: ErrorField) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, msg)| *msg)
    }
}

/// Error slots owned by a step. Re-validating a step clears exactly these.
pub fn error_fields(step: Step) -> &'static [ErrorField] {
    match step.number() {
        1 => &[
            ErrorField::FullName,
            ErrorField::Email,
            ErrorField::DocumentId,
            ErrorField::BirthDate,
            ErrorField::Phone,
        ],
        2 => &[
            ErrorField::MonthlyIncome,
            ErrorField::TotalAssets,
            ErrorField::InvestmentAmount,
            ErrorField::MonthlyContributionAmount,
        ],
        3 => &[
            ErrorField::KnowledgeLevel,
            ErrorField::RiskTolerance,
            ErrorField::Objectives,
            ErrorField::InvestmentHorizon,
            ErrorField::OtherObjective,
        ],
        4 => &[
            ErrorField::LiquidityPreference,
            ErrorField::AssetInterests,
            ErrorField::OtherAsset,
        ],
        5 => &[ErrorField::Terms],
        _ => &[],
    }
}

/// Runs the validator for `step`. The summary step has no requirements.
pub fn validate_step(step: Step, form: &FormState) -> StepValidation {
    let errors = match step.number() {
        1 => personal_info_errors(form),
        2 => financial_profile_errors(form),
        3 => investor_profile_errors(form),
        4 => preferences_errors(form),
        5 => consent_errors(form),
        _ => Vec::new(),
    };
    StepValidation::from_errors(errors)
}

/// Writes a validation outcome into `state`: the step's slots are cleared, then
/// the failing ones are filled. Slots of other steps are left untouched.
pub fn apply_to_error_state(state: &mut ErrorState, step: Step, validation: &StepValidation) {
    for field in error_fields(step) {
        state.slot_mut(*field).clear();
    }
    for (field, message) in &validation.errors {
        *state.slot_mut(*field) = (*message).to_string();
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn personal_info_errors(form: &FormState) -> Vec<(ErrorField, &'static str)> {
    let mut errors = Vec::new();
    if is_blank(&form.full_name) {
        errors.push((ErrorField::FullName, MSG_FULL_NAME));
    }
    if is_blank(&form.email) {
        errors.push((ErrorField::Email, MSG_EMAIL));
    }
    if is_blank(&form.document_id) {
        errors.push((ErrorField::DocumentId, MSG_DOCUMENT_ID));
    }
    if is_blank(&form.birth_date) {
        errors.push((ErrorField::BirthDate, MSG_BIRTH_DATE));
    }
    // phone is optional
    errors
}

fn financial_profile_errors(form: &FormState) -> Vec<(ErrorField, &'static str)> {
    let mut errors = Vec::new();
    if is_blank(&form.monthly_income) {
        errors.push((ErrorField::MonthlyIncome, MSG_MONTHLY_INCOME));
    }
    if is_blank(&form.total_assets) {
        errors.push((ErrorField::TotalAssets, MSG_TOTAL_ASSETS));
    }
    if is_blank(&form.investment_amount) {
        errors.push((ErrorField::InvestmentAmount, MSG_INVESTMENT_AMOUNT));
    }
    if form.monthly_contribution.has_contribution && is_blank(&form.monthly_contribution.amount)
    {
        errors.push((ErrorField::MonthlyContributionAmount, MSG_CONTRIBUTION_AMOUNT));
    }
    errors
}

fn investor_profile_errors(form: &FormState) -> Vec<(ErrorField, &'static str)> {
    let mut errors = Vec::new();
    if !form.knowledge_level.is_set() {
        errors.push((ErrorField::KnowledgeLevel, MSG_KNOWLEDGE_LEVEL));
    }
    if !form.risk_tolerance.is_set() {
        errors.push((ErrorField::RiskTolerance, MSG_RISK_TOLERANCE));
    }
    if !form.objectives.any_selected() {
        errors.push((ErrorField::Objectives, MSG_OBJECTIVES));
    }
    if form.objectives.other && is_blank(&form.objectives.other_text) {
        errors.push((ErrorField::OtherObjective, MSG_OTHER_OBJECTIVE));
    }
    if !form.investment_horizon.is_set() {
        errors.push((ErrorField::InvestmentHorizon, MSG_INVESTMENT_HORIZON));
    }
    errors
}

fn preferences_errors(form: &FormState) -> Vec<(ErrorField, &'static str)> {
    let mut errors = Vec::new();
    if !form.liquidity_preference.is_set() {
        errors.push((ErrorField::LiquidityPreference, MSG_LIQUIDITY));
    }
    if !form.asset_interests.any_selected() {
        errors.push((ErrorField::AssetInterests, MSG_ASSET_INTERESTS));
    }
    if form.asset_interests.other && is_blank(&form.asset_interests.other_text) {
        errors.push((ErrorField::OtherAsset, MSG_OTHER_ASSET));
    }
    errors
}

fn consent_errors(form: &FormState) -> Vec<(ErrorField, &'static str)> {
    if form.terms_accepted && form.data_use_consent {
        Vec::new()
    } else {
        vec![(ErrorField::Terms, MSG_TERMS)]
    }
}
