//! Content-based movie recommendations
//!
//! An offline [`index`] step turns a CSV catalog into TF-IDF features and a
//! dense cosine similarity matrix. At runtime the [`services::Recommender`]
//! ranks neighbours from that matrix, and the [`api`] layer serves the
//! results enriched with plot and poster data.

pub mod api;
pub mod config;
pub mod error;
pub mod index;
pub mod middleware;
pub mod models;
pub mod services;
