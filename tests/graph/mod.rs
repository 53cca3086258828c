//! Integration tests for the identity graph

// Tests for nodes, edges and paths
mod identity_tests;

// Tests for synced graphs and pruning
mod synced_tests;
