//! Test Module
//!
//! Cross-module tests for the EchoMind backend.
//!
//! ## Test Categories
//! - `brain_tests`: training and inference over real memories
//! - `database_tests`: key-value persistence of memory and chat log
//! - `supervisor_tests`: the learn/answer/think loop through the actor handle
//! - `integration_tests`: full workflow against a mocked advice service

pub mod database_tests;
pub mod supervisor_tests;
