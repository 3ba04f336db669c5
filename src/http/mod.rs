//! HTTP client module
//!
//! A thin wrapper over `reqwest` that attaches the current bearer token to
//! every request and turns non-2xx responses into errors. There is no retry
//! loop: a failed data request is fatal for the run, and the destination's
//! merge-by-key semantics make a rerun safe.

mod client;

pub use client::{HttpClient, HttpClientConfig, RequestConfig};

#[cfg(test)]
mod tests;
