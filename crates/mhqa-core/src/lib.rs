//! mhqa-core
//!
//! Shared data model, error taxonomy and configuration for the multi-hop QA
//! trajectory pipeline. Engines live in the sibling crates and depend only on
//! what is exported here.

#![deny(unused_variables)]

pub mod config;
pub mod error;
pub mod traits;
pub mod trajectory;
pub mod types;
