//! referral-core: session core of the employee referral desk.
//!
//! Layering, bottom up:
//!   rng / clock / names      deterministic inputs
//!   referral / user / stats  records and pure derivations
//!   generator                seeded mock data per email
//!   storage / snapshot       local key-value persistence
//!   state / router           store with subscriptions, hash routing
//!   submission / app         services and the per-session context

pub mod app;
pub mod campaign;
pub mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod generator;
pub mod names;
pub mod referral;
pub mod rng;
pub mod router;
pub mod snapshot;
pub mod state;
pub mod stats;
pub mod storage;
pub mod submission;
pub mod types;
pub mod user;
