//! Ticket-triage service for Oracle ERP incidents.
//!
//! Incidents are submitted over HTTP, classified (severity, category,
//! summary, suggested action) by a chat-completion call with a
//! deterministic rule-based fallback, persisted, and exposed through
//! list/detail/update endpoints.

pub mod api;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod models;
pub mod state;
