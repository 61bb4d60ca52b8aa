//! # Engine Module
//!
//! Stateful machinery built on top of [`crate::core`]: assembling 3D monolayers
//! from pairs of sheets, recording and reading sheet histories, and the
//! configuration, error and progress types shared by the workflows.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Model files (geometry steps, effectors,
//!   parameters) and replay parameters
//! - **Assembly** ([`monolayer`], [`layout`]) - Stitching apical and basal sheets
//!   with lateral faces into cells, and the id blocks that layout produces
//! - **Histories** ([`history`]) - Time-stamped snapshots plus the edges removed
//!   between them
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - The aggregate [`error::EngineError`]

pub mod config;
pub mod error;
pub mod history;
pub mod layout;
pub mod monolayer;
pub mod progress;
