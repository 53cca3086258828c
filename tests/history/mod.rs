//! Integration tests for undo/redo

// Tests for single commands and macros replayed through a session
mod undo_tests;
