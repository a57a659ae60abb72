//! Questionnaire record updates.
//!
//! The record is only ever changed through the closed set of operations below:
//! one wholesale replacement per top-level field and one keyed update per nested
//! group. Every operation returns a fresh [`FormState`]; the caller swaps it in.

use crate::models::{
    AssetInterests, FormState, InvestmentHorizon, KnowledgeLevel, LiquidityPreference,
    MonthlyContribution, Objectives, RiskTolerance,
};
use serde::{Deserialize, Serialize};

/// Replaces one top-level field wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum FieldUpdate {
    FullName(String),
    Email(String),
    DocumentId(String),
    BirthDate(String),
    Phone(String),
    MonthlyIncome(String),
    TotalAssets(String),
    InvestmentAmount(String),
    MonthlyContribution(MonthlyContribution),
    KnowledgeLevel(KnowledgeLevel),
    RiskTolerance(RiskTolerance),
    Objectives(Objectives),
    InvestmentHorizon(InvestmentHorizon),
    LiquidityPreference(LiquidityPreference),
    EsgInterest(bool),
    PreviousInvestmentExperience(bool),
    AssetInterests(AssetInterests),
    TermsAccepted(bool),
    DataUseConsent(bool),
}

/// Sets one key of the `monthlyContribution` group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum MonthlyContributionUpdate {
    HasContribution(bool),
    Amount(String),
}

/// Sets one key of the `objectives` group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum ObjectivesUpdate {
    EmergencyReserve(bool),
    Retirement(bool),
    RealEstate(bool),
    ShortTermProfit(bool),
    Other(bool),
    OtherText(String),
}

/// Sets one key of the `assetInterests` group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum AssetInterestsUpdate {
    FixedIncome(bool),
    Stocks(bool),
    RealEstateFunds(bool),
    MultiMarketFunds(bool),
    Crypto(bool),
    Etfs(bool),
    Other(bool),
    OtherText(String),
}

/// Any single questionnaire edit, as received from the client.
///
/// Wire shape: `{"group": "objectives", "update": {"field": "retirement", "value": true}}`;
/// top-level fields use the `"root"` group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "group", content = "update", rename_all = "camelCase")]
pub enum FormUpdate {
    #[serde(rename = "root")]
    Field(FieldUpdate),
    MonthlyContribution(MonthlyContributionUpdate),
    Objectives(ObjectivesUpdate),
    AssetInterests(AssetInterestsUpdate),
}

impl FormState {
    /// `updateField`: a copy of the record with one top-level field replaced.
    pub fn update_field(&self, update: FieldUpdate) -> FormState {
        let mut next = self.clone();
        match update {
            FieldUpdate::FullName(v) => next.full_name = v,
            FieldUpdate::Email(v) => next.email = v,
            FieldUpdate::DocumentId(v) => next.document_id = v,
            FieldUpdate::BirthDate(v) => next.birth_date = v,
            FieldUpdate::Phone(v) => next.phone = v,
            FieldUpdate::MonthlyIncome(v) => next.monthly_income = v,
            FieldUpdate::TotalAssets(v) => next.total_assets = v,
            FieldUpdate::InvestmentAmount(v) => next.investment_amount = v,
            FieldUpdate::MonthlyContribution(v) => next.monthly_contribution = v,
            FieldUpdate::KnowledgeLevel(v) => next.knowledge_level = v,
            FieldUpdate::RiskTolerance(v) => next.risk_tolerance = v,
            FieldUpdate::Objectives(v) => next.objectives = v,
            FieldUpdate::InvestmentHorizon(v) => next.investment_horizon = v,
            FieldUpdate::LiquidityPreference(v) => next.liquidity_preference = v,
            FieldUpdate::EsgInterest(v) => next.esg_interest = v,
            FieldUpdate::PreviousInvestmentExperience(v) => next.previous_investment_experience = v,
            FieldUpdate::AssetInterests(v) => next.asset_interests = v,
            FieldUpdate::TermsAccepted(v) => next.terms_accepted = v,
            FieldUpdate::DataUseConsent(v) => next.data_use_consent = v,
        }
        next
    }

    /// Sets one key of `monthlyContribution`, keeping its sibling.
    pub fn update_monthly_contribution(&self, update: MonthlyContributionUpdate) -> FormState {
        let mut next = self.clone();
        let group = &mut next.monthly_contribution;
        match update {
            MonthlyContributionUpdate::HasContribution(v) => group.has_contribution = v,
            MonthlyContributionUpdate::Amount(v) => group.amount = v,
        }
        next
    }

    /// Sets one key of `objectives`, keeping its siblings.
    pub fn update_objectives(&self, update: ObjectivesUpdate) -> FormState {
        let mut next = self.clone();
        let group = &mut next.objectives;
        match update {
            ObjectivesUpdate::EmergencyReserve(v) => group.emergency_reserve = v,
            ObjectivesUpdate::Retirement(v) => group.retirement = v,
            ObjectivesUpdate::RealEstate(v) => group.real_estate = v,
            ObjectivesUpdate::ShortTermProfit(v) => group.short_term_profit = v,
            ObjectivesUpdate::Other(v) => group.other = v,
            ObjectivesUpdate::OtherText(v) => group.other_text = v,
        }
        next
    }

    /// Sets one key of `assetInterests`, keeping its siblings.
    pub fn update_asset_interests(&self, update: AssetInterestsUpdate) -> FormState {
        let mut next = self.clone();
        let group = &mut next.asset_interests;
        match update {
            AssetInterestsUpdate::FixedIncome(v) => group.fixed_income = v,
            AssetInterestsUpdate::Stocks(v) => group.stocks = v,
            AssetInterestsUpdate::RealEstateFunds(v) => group.real_estate_funds = v,
            AssetInterestsUpdate::MultiMarketFunds(v) => group.multi_market_funds = v,
            AssetInterestsUpdate::Crypto(v) => group.crypto = v,
            AssetInterestsUpdate::Etfs(v) => group.etfs = v,
            AssetInterestsUpdate::Other(v) => group.other = v,
            AssetInterestsUpdate::OtherText(v) => group.other_text = v,
        }
        next
    }

    /// Dispatches a client edit to the matching typed operation.
    pub fn apply(&self, update: FormUpdate) -> FormState {
        match update {
            FormUpdate::Field(u) => self.update_field(u),
            FormUpdate::MonthlyContribution(u) => self.update_monthly_contribution(u),
            FormUpdate::Objectives(u) => self.update_objectives(u),
            FormUpdate::AssetInterests(u) => self.update_asset_interests(u),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_updates_keep_siblings() {
        let form = FormState::default()
            .update_objectives(ObjectivesUpdate::Retirement(true))
            .update_objectives(ObjectivesUpdate::EmergencyReserve(true));

        assert!(form.objectives.retirement);
        assert!(form.objectives.emergency_reserve);
        assert!(!form.objectives.real_estate);
    }

    #[test]
    fn test_update_returns_fresh_record() {
        let original = FormState::default();
        let updated = original.update_field(FieldUpdate::FullName("Ana Souza".to_string()));

        assert_eq!(original.full_name, "");
        assert_eq!(updated.full_name, "Ana Souza");
        assert_ne!(original, updated);
    }

    #[test]
    fn test_wholesale_group_replacement() {
        let form = FormState::default()
            .update_asset_interests(AssetInterestsUpdate::Crypto(true))
            .update_field(FieldUpdate::AssetInterests(AssetInterests {
                stocks: true,
                ..AssetInterests::default()
            }));

        assert!(form.asset_interests.stocks);
        assert!(!form.asset_interests.crypto);
    }

    #[test]
    fn test_contribution_amount_keeps_flag() {
        let form = FormState::default()
            .update_monthly_contribution(MonthlyContributionUpdate::HasContribution(true))
            .update_monthly_contribution(MonthlyContributionUpdate::Amount("500".to_string()));

        assert!(form.monthly_contribution.has_contribution);
        assert_eq!(form.monthly_contribution.amount, "500");
    }

    #[test]
    fn test_form_update_wire_format() {
        let nested: FormUpdate = serde_json::from_value(json!({
            "group": "objectives",
            "update": { "field": "retirement", "value": true }
        }))
        .unwrap();
        assert_eq!(nested, FormUpdate::Objectives(ObjectivesUpdate::Retirement(true)));

        let root: FormUpdate = serde_json::from_value(json!({
            "group": "root",
            "update": { "field": "riskTolerance", "value": "aggressive" }
        }))
        .unwrap();
        assert_eq!(
            root,
            FormUpdate::Field(FieldUpdate::RiskTolerance(RiskTolerance::Aggressive))
        );

        let form = FormState::default().apply(root);
        assert_eq!(form.risk_tolerance, RiskTolerance::Aggressive);
    }

    #[test]
    fn test_group_field_pairing_is_closed() {
        let bogus = serde_json::from_value::<FormUpdate>(json!({
            "group": "objectives",
            "update": { "field": "crypto", "value": true }
        }));
        assert!(bogus.is_err());
    }
}
