//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into view-level APIs.
//! - Keep UI layers decoupled from storage details.

pub mod calendar_service;
