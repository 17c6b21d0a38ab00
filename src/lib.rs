//! Finger-spelling trainer: hand-pose classification, gesture stabilisation
//! and text assembly behind a small polling HTTP API.

pub mod api;
pub mod capture;
pub mod config;
pub mod exercise;
pub mod gesture;
pub mod pipeline;
