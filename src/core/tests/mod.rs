//! Core module tests
//!
//! Contains test suites for the key model:
//! - Key parsing and display
//! - Combination parsing, equality and hashing
