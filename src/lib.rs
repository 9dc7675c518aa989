//! Movie and TV discovery engine.
//!
//! Turns mood, language, keyword and date filters into TMDB discovery
//! requests, keeps filter state in shareable links, classifies free-text
//! search and builds a personalized feed from a user's library.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
