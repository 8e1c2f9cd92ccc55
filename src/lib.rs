//! # Vinculo
//!
//! Matchmaking between challenges posted by external participants and the
//! research capacities of university groups, usable both as a standalone
//! binary and as a library.
//!
//! Challenges and capacities carry free-form keywords. Each side is ranked
//! against the other by shared keyword count, and a bilateral match request
//! has to be accepted before the two parties can chat.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! vinculo = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::PathBuf;
//! use vinculo::server::{AppState, create_router};
//! use vinculo::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new(&PathBuf::from("./data/vinculo.db")).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store)));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `vinculo` binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod matching;
pub mod server;
pub mod store;
pub mod types;
