//! # chatmind
//!
//! Client library for the ChatMind backend: a chat page with switchable
//! models and a QA page that submits batches of questions (with optional
//! expected answers) and renders the scored results.
//!
//! - [`client`]: the [`client::Backend`] trait and its HTTP implementation
//! - [`chat`], [`models`], [`batch`]: page controllers
//! - [`cases`]: the editable test case list, pipe text and CSV import
//! - [`view`]: pure display structures; [`render`] turns them into text
//!
//! The backend does all scoring. This crate only forwards `expected_output`
//! and displays what comes back.

pub mod api;
pub mod batch;
pub mod cases;
pub mod chat;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod view;

pub use error::{ChatmindError, Result};
