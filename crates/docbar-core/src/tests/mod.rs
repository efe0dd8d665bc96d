//! Test module for docbar-core
//!
//! This module contains cross-module tests for:
//! - Result aggregation (arrival order, supersession, error slots, deadline)
//! - The search service loop against an in-memory daemon
//! - Requirements probing
//! - Configuration loading and defaults

mod fixtures;
