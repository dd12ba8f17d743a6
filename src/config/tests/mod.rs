//! Config module tests
//!
//! - Document parsing, validation and round trips
//! - Provider loading, first-run bootstrap and saving
