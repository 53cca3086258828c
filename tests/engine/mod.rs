//! Integration tests for the constraint engine

// Tests for gating and derived-value constraints
mod constraint_tests;

// Tests for registration rules and cycle detection
mod registration_tests;
