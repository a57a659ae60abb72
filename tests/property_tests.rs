/// Property-based tests using proptest
/// Tests invariants that should hold for all inputs
use proptest::prelude::*;
use rust_investor_api::chat_normalizer::normalize;
use rust_investor_api::models::{FormState, RiskTolerance};
use rust_investor_api::quote_enrichment::derive_from_history;
use rust_investor_api::step_controller::{AdvanceOutcome, Step, StepController};
use rust_investor_api::summary::{format_brl, parse_brl_amount};
use rust_investor_api::validation::validate_step;

fn arb_form() -> impl Strategy<Value = FormState> {
    (
        "\\PC{0,12}",
        "[ a-z@.]{0,12}",
        "[0-9 .-]{0,14}",
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        prop_oneof![
            Just(RiskTolerance::Unset),
            Just(RiskTolerance::Conservative),
            Just(RiskTolerance::Moderate),
            Just(RiskTolerance::Aggressive),
        ],
    )
        .prop_map(
            |(name, email, document, contributes, other, terms, consent, risk)| {
                let mut form = FormState {
                    full_name: name,
                    email,
                    document_id: document,
                    terms_accepted: terms,
                    data_use_consent: consent,
                    risk_tolerance: risk,
                    ..FormState::default()
                };
                form.monthly_contribution.has_contribution = contributes;
                form.objectives.other = other;
                form
            },
        )
}

#[derive(Debug, Clone)]
enum Action {
    Advance,
    Retreat,
    Back,
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![Just(Action::Advance), Just(Action::Retreat), Just(Action::Back)]
}

// Property: validators are total and consistent
proptest! {
    #[test]
    fn validators_never_panic_and_agree_with_errors(form in arb_form(), n in 1u8..=6) {
        let step = Step::new(n).unwrap();
        let result = validate_step(step, &form);
        prop_assert_eq!(result.is_valid, result.errors.is_empty());
        for (_, message) in &result.errors {
            prop_assert!(!message.is_empty());
        }
    }
}

// Property: the step controller stays within bounds and moves by one
proptest! {
    #[test]
    fn controller_moves_one_step_at_a_time(
        form in arb_form(),
        actions in prop::collection::vec(arb_action(), 0..40)
    ) {
        let mut controller = StepController::new();
        for action in actions {
            let before = controller.step().number();
            match action {
                Action::Advance => {
                    let outcome = controller.advance(&form);
                    let after = controller.step().number();
                    match outcome {
                        AdvanceOutcome::Advanced => prop_assert_eq!(after, before + 1),
                        AdvanceOutcome::Blocked | AdvanceOutcome::AlreadyComplete => {
                            prop_assert_eq!(after, before)
                        }
                    }
                }
                Action::Retreat | Action::Back => {
                    match action {
                        Action::Retreat => { controller.retreat(); }
                        _ => { controller.back_signal(); }
                    }
                    let after = controller.step().number();
                    prop_assert_eq!(after, before.saturating_sub(1).max(1));
                }
            }
            let n = controller.step().number();
            prop_assert!((1..=6).contains(&n));
        }
    }
}

// Property: the normalizer always produces something to show
proptest! {
    #[test]
    fn normalizer_never_panics(raw in "\\PC*") {
        let replies = normalize(&raw);
        prop_assert!(!replies.is_empty());
    }

    #[test]
    fn normalizer_handles_json_like_noise(raw in "[{}\\[\\]\":,a-z0-9 `\n]{0,64}") {
        prop_assert!(!normalize(&raw).is_empty());
    }
}

// Property: history derivation only reports a change with two usable candles
proptest! {
    #[test]
    fn change_sign_follows_closes(prev in 0.01f64..10_000.0, last in 0.0f64..10_000.0) {
        let history = serde_json::json!([
            {"date": "2025-01-01", "close": prev},
            {"date": "2025-01-02", "close": last}
        ]);
        let derived = derive_from_history(&history);
        let change = derived.variacao_dia.unwrap();
        prop_assert_eq!(change.starts_with('+'), last >= prev);
        prop_assert!(change.ends_with('%'));
        prop_assert_eq!(derived.data.as_deref(), Some("02/01/2025"));
    }
}

// Property: currency formatting parses back to the same cents
proptest! {
    #[test]
    fn brl_format_round_trips(cents in 0u64..10_000_000_000) {
        let value = cents as f64 / 100.0;
        let parsed = parse_brl_amount(&format_brl(value)).unwrap();
        prop_assert_eq!((parsed * 100.0).round() as u64, cents);
    }
}
