//! # Workflows Module
//!
//! Top-level entry points that tie [`crate::engine`] and [`crate::core`]
//! together into complete procedures.
//!
//! - **Evaluation** ([`evaluate`]) - Apply a model configuration to a mesh,
//!   refresh its geometry and report energy terms and the vertex gradient.
//! - **Replay** ([`replay`]) - Assemble a monolayer from the first frames of an
//!   apical and a basal sheet history and replay every recorded edge removal
//!   on it, recording one snapshot per frame.

pub mod evaluate;
pub mod replay;
