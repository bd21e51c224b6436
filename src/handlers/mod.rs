//! HTTP request handlers
//!
//! - `api` - Health check endpoint
//! - `cards` - Deck generation, card preview and input review

pub mod api;
pub mod cards;
