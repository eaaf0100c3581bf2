//! Property-based tests for lyra-math
//!
//! This module checks the engine invariants: rows stay satisfied under the
//! seeds across projection, eliminated ids vanish, and maximize never
//! reports less than the seeded objective value.

mod mbo_properties;
