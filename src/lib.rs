//! # aquabot
//!
//! A customer-support chatbot for a water utility.
//!
//! Free-text questions are matched against a FAQ dataset with sentence
//! embeddings; two structured intents (consumption lookup, invoice lookup)
//! are answered by querying a local SQLite store seeded with customer
//! records.
//!
//! ## Architecture
//!
//! ```text
//! user text ─▶ intent router ─▶ { record store lookup │ FAQ matcher }
//!                  │                        │
//!            similarity matcher       formatted reply ─▶ transcript
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! aquabot seed                  # create and populate the database
//! aquabot ask "Combien dois-je payer ?" --account 654321
//! aquabot serve                 # start the chat server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`store`] | Consumption and invoice lookups |
//! | [`seed`] | Demo dataset seeding |
//! | [`faq`] | FAQ dataset loading and cached index |
//! | [`embedding`] | Embedding providers and vector math |
//! | [`matcher`] | Cosine-similarity argmax with threshold |
//! | [`intent`] | Intent routing over example sets |
//! | [`chat`] | Session state and interaction handling |
//! | [`server`] | HTTP server and embedded UI |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod chat;
pub mod config;
pub mod db;
pub mod embedding;
pub mod faq;
pub mod intent;
pub mod matcher;
pub mod migrate;
pub mod models;
pub mod seed;
pub mod server;
pub mod store;
