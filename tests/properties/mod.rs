//! Property-based tests and end-to-end scenarios


// Invariants checked over generated inputs
mod proptest_tests;
