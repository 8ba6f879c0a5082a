//! HTTP server for single-elimination tournament brackets.
//!
//! Exposes the `tourney_bracket` operations over a small JSON API, with
//! environment-driven configuration, structured logging and Prometheus
//! metrics.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
