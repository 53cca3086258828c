//! Integration tests for session-level services

// Tests for virtual mirrors and release
mod mirror_tests;
