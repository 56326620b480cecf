//! Virtual try-on workflow
//!
//! Takes a person photo and a clothing photo, sends both to a generative image
//! service and publishes the composited result (or a user-facing error) through
//! a small state machine a front end can drive.

pub mod ai;
pub mod config;
pub mod download;
pub mod encoder;
pub mod error;
pub mod mime;
pub mod prompts;
pub mod workflow;

pub use error::{Error, Result};
