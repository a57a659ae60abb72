//! Questionnaire step state machine.
//!
//! Six ordered steps; the last one is the read-only summary, reachable only by
//! passing the consent step. Forward moves are gated by the step validator,
//! backward moves are not.

use crate::models::{ErrorState, FormState};
use crate::validation::{self, StepValidation};
use serde::{Deserialize, Serialize};

pub const TOTAL_STEPS: u8 = 6;

const STEP_TITLES: [&str; TOTAL_STEPS as usize] = [
    "Informações Pessoais",
    "Perfil Financeiro",
    "Perfil de Investidor",
    "Preferências de Investimento",
    "Termos e Consentimentos",
    "Resumo e Confirmação",
];

/// A step number, always within `1..=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Step(u8);

impl Step {
    pub const FIRST: Step = Step(1);
    pub const SUMMARY: Step = Step(TOTAL_STEPS);

    pub fn new(number: u8) -> Option<Step> {
        (1..=TOTAL_STEPS).contains(&number).then_some(Step(number))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn title(self) -> &'static str {
        STEP_TITLES[usize::from(self.0 - 1)]
    }

    /// Completion percentage shown in the progress bar.
    pub fn progress(self) -> f64 {
        f64::from(self.0) / f64::from(TOTAL_STEPS) * 100.0
    }

    pub fn is_summary(self) -> bool {
        self == Self::SUMMARY
    }

    fn next(self) -> Step {
        Step((self.0 + 1).min(TOTAL_STEPS))
    }

    fn previous(self) -> Step {
        Step(self.0.saturating_sub(1).max(1))
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::FIRST
    }
}

impl TryFrom<u8> for Step {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Step::new(value).ok_or_else(|| format!("step must be between 1 and {}", TOTAL_STEPS))
    }
}

impl From<Step> for u8 {
    fn from(step: Step) -> u8 {
        step.0
    }
}

/// Result of [`StepController::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceOutcome {
    Advanced,
    /// Validation failed; the error slots of the current step are populated.
    Blocked,
    /// Already on the summary step.
    AlreadyComplete,
}

/// Result of a platform back-navigation signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackSignal {
    /// The questionnaire moved one step back.
    Handled,
    /// Step 1: the platform should apply its default behavior (leave the flow).
    Default,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepController {
    step: Step,
    errors: ErrorState,
}

impl StepController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn errors(&self) -> &ErrorState {
        &self.errors
    }

    /// Validates the current step against `form` and moves forward on success.
    pub fn advance(&mut self, form: &FormState) -> AdvanceOutcome {
        if self.step.is_summary() {
            return AdvanceOutcome::AlreadyComplete;
        }

        let result = validation::validate_step(self.step, form);
        self.record(&result);

        if result.is_valid {
            let from = self.step;
            self.step = self.step.next();
            tracing::debug!("Questionnaire advanced {} -> {}", from.number(), self.step.number());
            AdvanceOutcome::Advanced
        } else {
            tracing::debug!(
                "Questionnaire step {} blocked by {} field error(s)",
                self.step.number(),
                result.errors.len()
            );
            AdvanceOutcome::Blocked
        }
    }

    /// Moves one step back without validating. No-op on step 1.
    pub fn retreat(&mut self) -> Step {
        self.step = self.step.previous();
        self.step
    }

    pub fn back_signal(&mut self) -> BackSignal {
        if self.step == Step::FIRST {
            BackSignal::Default
        } else {
            self.retreat();
            BackSignal::Handled
        }
    }

    /// Returns to step 1 with no errors.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Drops every error message while staying on the current step.
    pub fn clear_errors(&mut self) {
        self.errors = ErrorState::default();
    }

    fn record(&mut self, result: &StepValidation) {
        validation::apply_to_error_state(&mut self.errors, self.step, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::tests::complete_form;
    use crate::validation::MSG_TERMS;

    #[test]
    fn test_step_bounds() {
        assert_eq!(Step::new(0), None);
        assert_eq!(Step::new(7), None);
        assert_eq!(Step::new(6), Some(Step::SUMMARY));
        assert!(serde_json::from_str::<Step>("9").is_err());
    }

    #[test]
    fn test_titles_and_progress() {
        assert_eq!(Step::FIRST.title(), "Informações Pessoais");
        assert_eq!(Step::SUMMARY.title(), "Resumo e Confirmação");
        assert_eq!(Step::new(3).unwrap().progress(), 50.0);
        assert_eq!(Step::SUMMARY.progress(), 100.0);
    }

    #[test]
    fn test_blocked_advance_keeps_step() {
        let mut controller = StepController::new();
        let outcome = controller.advance(&FormState::default());

        assert_eq!(outcome, AdvanceOutcome::Blocked);
        assert_eq!(controller.step(), Step::FIRST);
        assert!(!controller.errors().full_name.is_empty());
    }

    #[test]
    fn test_walks_to_summary_and_stops() {
        let form = complete_form();
        let mut controller = StepController::new();

        for expected in 2..=6 {
            assert_eq!(controller.advance(&form), AdvanceOutcome::Advanced);
            assert_eq!(controller.step().number(), expected);
        }
        assert_eq!(controller.advance(&form), AdvanceOutcome::AlreadyComplete);
        assert_eq!(controller.step(), Step::SUMMARY);
        assert!(controller.errors().is_clear());
    }

    #[test]
    fn test_retreat_is_unguarded_and_floors_at_one() {
        let form = complete_form();
        let mut controller = StepController::new();
        controller.advance(&form);
        controller.advance(&form);

        assert_eq!(controller.retreat().number(), 2);
        assert_eq!(controller.retreat().number(), 1);
        assert_eq!(controller.retreat().number(), 1);
    }

    #[test]
    fn test_back_signal_defers_on_first_step() {
        let mut controller = StepController::new();
        assert_eq!(controller.back_signal(), BackSignal::Default);

        controller.advance(&complete_form());
        assert_eq!(controller.back_signal(), BackSignal::Handled);
        assert_eq!(controller.step(), Step::FIRST);
    }

    #[test]
    fn test_errors_of_other_steps_survive_revalidation() {
        let mut form = complete_form();
        let mut controller = StepController::new();
        for _ in 0..4 {
            controller.advance(&form);
        }
        form.terms_accepted = false;
        assert_eq!(controller.advance(&form), AdvanceOutcome::Blocked);
        assert_eq!(controller.errors().terms, MSG_TERMS);

        // Back on step 4, a passing re-validation leaves the consent error alone.
        controller.retreat();
        assert_eq!(controller.advance(&form), AdvanceOutcome::Advanced);
        assert_eq!(controller.errors().terms, MSG_TERMS);
    }
}
