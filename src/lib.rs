//! trackpick - rule-driven audio and subtitle track selection
//!
//! This library crate exposes the player-facing pieces for integration
//! testing: settings loading, the [`controller::SelectionController`] and the
//! serialized [`service::SelectionService`].

pub mod config;
pub mod controller;
pub mod player;
pub mod service;
