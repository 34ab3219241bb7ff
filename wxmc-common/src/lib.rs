//! # WXMC Common Library
//!
//! Shared code for the weather Markov-chain forecaster:
//! - Transition model engine (cleaning, estimation, N-step projection)
//! - Observation CSV reader and dataset summary
//! - Database schema, accounts, sessions and per-user model storage
//! - Configuration loading

pub mod api;
pub mod config;
pub mod dataset;
pub mod db;
pub mod error;
pub mod markov;

pub use error::{Error, Result};
pub use markov::{PredictionResult, TransitionModel};
