//! Integration-style tests for the insight gateway
//!
//! The prediction service is simulated with WireMock; the HTTP controller
//! is driven in-process through `tower::ServiceExt`.

pub mod error_tests;
pub mod fixtures;
