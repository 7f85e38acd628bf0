//! Property-based tests for the roundbreaker dispatcher.
//!
//! Run with: cargo test --test property_tests
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold regardless of the specific sequence generated.

pub mod rounds;
