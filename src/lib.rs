//! Projection analyzer
//!
//! Ingests third-party player stat projections, enriches them with recent performance
//! summaries and scores each line with an over/under/skip recommendation.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
