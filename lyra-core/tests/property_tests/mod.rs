//! Property-based tests for lyra-core
//!
//! This module contains property-based tests using proptest to verify
//! the projection invariants: model preservation, scope, and residue
//! safety.

mod projection_properties;
