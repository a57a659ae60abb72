//! Read-only profile summary shown on the confirmation step.

use crate::models::{FormState, NOT_INFORMED};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalSection {
    pub full_name: String,
    pub email: String,
    pub document_id: String,
    pub birth_date: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSection {
    pub monthly_income: String,
    pub total_assets: String,
    pub investment_amount: String,
    pub monthly_contribution: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestorSection {
    pub knowledge_level: &'static str,
    pub risk_tolerance: &'static str,
    pub objectives: Vec<String>,
    pub investment_horizon: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesSection {
    pub liquidity_preference: &'static str,
    pub esg_interest: &'static str,
    pub previous_investment_experience: &'static str,
    pub asset_interests: Vec<String>,
}

/// Every answer rendered as a Portuguese display string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub personal: PersonalSection,
    pub financial: FinancialSection,
    pub investor: InvestorSection,
    pub preferences: PreferencesSection,
}

impl ProfileSummary {
    pub fn from_form(form: &FormState) -> Self {
        Self {
            personal: PersonalSection {
                full_name: or_not_informed(&form.full_name),
                email: or_not_informed(&form.email),
                document_id: or_not_informed(&form.document_id),
                birth_date: or_not_informed(&form.birth_date),
                phone: or_not_informed(&form.phone),
            },
            financial: FinancialSection {
                monthly_income: format_currency_field(&form.monthly_income),
                total_assets: format_currency_field(&form.total_assets),
                investment_amount: format_currency_field(&form.investment_amount),
                monthly_contribution: if form.monthly_contribution.has_contribution {
                    format_currency_field(&form.monthly_contribution.amount)
                } else {
                    "Não pretende fazer aportes".to_string()
                },
            },
            investor: InvestorSection {
                knowledge_level: form.knowledge_level.label_pt(),
                risk_tolerance: form.risk_tolerance.label_pt(),
                objectives: form.objectives.selected_labels(),
                investment_horizon: form.investment_horizon.label_pt(),
            },
            preferences: PreferencesSection {
                liquidity_preference: form.liquidity_preference.label_pt(),
                esg_interest: yes_no(form.esg_interest),
                previous_investment_experience: yes_no(form.previous_investment_experience),
                asset_interests: form.asset_interests.selected_labels(),
            },
        }
    }
}

fn or_not_informed(value: &str) -> String {
    if value.trim().is_empty() {
        NOT_INFORMED.to_string()
    } else {
        value.to_string()
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Sim"
    } else {
        "Não"
    }
}

/// Parses an amount typed in Brazilian or plain notation:
/// `"R$ 1.234,56"`, `"1234,56"`, `"1234.56"`.
pub fn parse_brl_amount(raw: &str) -> Option<f64> {
    let text = raw.trim().trim_start_matches("R$").trim();
    if text.is_empty() {
        return None;
    }
    let normalized = if text.contains(',') {
        text.replace('.', "").replace(',', ".")
    } else {
        text.to_string()
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Formats as Brazilian currency: `R$ 1.234,56`.
pub fn format_brl(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}R$ {},{:02}", sign, grouped, cents % 100)
}

pub fn format_currency_field(raw: &str) -> String {
    parse_brl_amount(raw)
        .map(format_brl)
        .unwrap_or_else(|| NOT_INFORMED.to_string())
}
