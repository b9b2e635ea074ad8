//! Integration tests for creditgate
//!
//! These tests drive real components together: the transcoder over raw
//! upstream bytes, the ledger over SQLite, and the HTTP surface over
//! wiremock upstreams.

pub mod config_tests;
pub mod ledger_tests;
pub mod proxy_tests;
pub mod transcoder_tests;
