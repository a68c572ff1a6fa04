//! # Brain Module
//!
//! The learning core of EchoMind: turns phrases into features, trains the
//! response classifier, picks a response and dresses it up.
//!
//! ## Components
//! - `encoder`: text → scalar feature policies
//! - `network`: dense ReLU/softmax classifier with Adam
//! - `trainer`: full retraining from memory
//! - `inference`: guarded argmax response selection
//! - `arithmetic`: two-operand integer expressions
//! - `crafter`: keyword rules applied to the selected response

pub mod arithmetic;
pub mod crafter;
pub mod encoder;
pub mod inference;
pub mod network;
pub mod trainer;

pub use crafter::craft;
pub use inference::{infer, Inference};
pub use trainer::{train, Model, TrainingOptions};
