//! HTTP handlers, one module per route group.

pub mod detections;
pub mod speed;
pub mod stats;
pub mod webhook;
