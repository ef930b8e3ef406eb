//! # BgTask Domain
//!
//! Domain types and models for the background task scheduler.
//!
//! This crate contains:
//! - Task descriptor types (`TaskInfo`, `TimingInfo`, `NetworkType`)
//! - The extras codec that narrows arbitrary payloads to the restricted,
//!   persistable value set (`TaskExtras`, `ExtraValue`)
//! - The wire payload handed to scheduling back-ends (`JobExtras`)
//!
//! ## Architecture
//! - No dependencies on other bgtask crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod extras;
pub mod task;
pub mod wire;

// Re-export commonly used items
pub use extras::{decode_extras, encode_extras, ConvertedExtras, ExtraValue, TaskExtras};
pub use task::{
    NetworkType, TaskId, TaskInfo, TaskInfoBuilder, TaskInfoError, TaskParameters, TimingInfo,
};
pub use wire::JobExtras;
