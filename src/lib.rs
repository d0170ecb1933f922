//! Core library surface for the health centre kiosk.
//!
//! The record store, query layer and admin gate are usable on their own; the
//! `ui` module wires them into the interactive terminal front end used by the
//! binary.
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod query;
pub mod ui;

pub use auth::{hash_password, AdminGate, GateState};
pub use config::Config;
pub use db::{Predicate, RecordStore};
pub use error::{KioskError, StoreError};
pub use models::{Column, FieldValue, HealthCentre};
pub use query::SearchKind;
pub use ui::{run_app, App};
