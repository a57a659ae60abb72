//! Investor onboarding and financial chat API library.
//!
//! This library provides the questionnaire state machine with its per-step
//! validators, the assistant chat pipeline (response normalization and quote
//! enrichment), profile persistence and the external service clients used by
//! the HTTP server.
//!
//! # Modules
//!
//! - `api`: HTTP-facing components.
//! - `core`: Questionnaire and chat domain logic.
//! - `integrations`: External service clients and storage.
//! - `chat`: Chat turn orchestration.
//! - `chat_normalizer`: Assistant text to typed replies.
//! - `chat_session`: Assistant session registry and system instruction.
//! - `circuit_breaker`: Circuit breaker for storage calls.
//! - `config`: Configuration management.
//! - `db`: Database connection and schema.
//! - `errors`: Error handling types.
//! - `form_state`: Typed questionnaire updates.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models.
//! - `persistence`: Questionnaire record storage.
//! - `questionnaire`: Questionnaire sessions and registry.
//! - `quote_enrichment`: Financial card completion from market data.
//! - `services`: External service clients (Gemini, Alpha Vantage, history, diversification).
//! - `step_controller`: Questionnaire step state machine.
//! - `summary`: Confirmation-step profile summary.
//! - `validation`: Per-step field validators.

pub mod api;
pub mod core;
pub mod integrations;

pub mod chat;
pub mod chat_normalizer;
pub mod chat_session;
pub mod circuit_breaker;
pub mod config;
pub mod db;
pub mod errors;
pub mod form_state;
pub mod handlers;
pub mod models;
pub mod persistence;
pub mod questionnaire;
pub mod quote_enrichment;
pub mod services;
pub mod step_controller;
pub mod summary;
pub mod validation;
