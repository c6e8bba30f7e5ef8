//! triagent: a deterministic support-ticket triage engine with
//! human-in-the-loop admin review.
//!
//! The engine walks a fixed set of named steps (ingest, classify, resolve,
//! prepare, policy check, draft, review checkpoint, finalize) connected by
//! pure routing predicates, over a typed per-thread conversation state.
//! Reply-scenario turns suspend before the admin-review checkpoint and
//! resume when a review decision is injected; everything the resume needs
//! is in the persisted state snapshot.

pub mod classify;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod llm;
pub mod orders;
pub mod policy;
pub mod server;
pub mod state;
pub mod store;
pub mod templates;

pub use config::Config;
pub use engine::{Engine, ReviewDecision, StateView, TurnRequest};
pub use error::Error;
