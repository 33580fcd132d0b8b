//! Tracker Core - NBA Last Two Minute (L2M) report ingestion.
//!
//! This library provides:
//! - Normalization of raw per-game L2M JSON reports into call records
//! - AI-backed attribution of favored/penalized teams for incorrect calls
//! - Officials lookup via the NBA stats box score summary endpoint
//! - Run-scoped quota breaker that halts AI usage once quota is exhausted
//! - Idempotent per-game synchronization into the `calls` table
//! - Reading of locally cached raw reports saved by the fetch step

pub mod cache;
pub mod clients;
pub mod db;
pub mod models;
pub mod quota;
pub mod report;
