//! CLI infrastructure for the racetrack toolkit
//!
//! This module provides the command-line interface for training learners on
//! a track, inspecting track files and racing saved policies.

pub mod commands;
pub mod output;
