//! PromptLens - session-scoped image upload and generative-AI analysis
//!
//! This library provides the stores, validators, analysis pipeline and HTTP
//! API behind the PromptLens server.

pub mod api;
pub mod config;
pub mod models;
pub mod provider;
pub mod repositories;
pub mod services;
