//! mhqa-retrieval
//!
//! HTTP client for the sparse and dense retrieval services. Callers always get
//! a usable result list: any failure is replaced by a deterministic stub hit.

pub mod client;
pub mod stub;

pub use client::RetrievalClient;
pub use stub::stub_result;
