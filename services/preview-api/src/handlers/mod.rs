//! HTTP request handlers for the preview API.

pub mod bounds;
pub mod convert;
pub mod health;
pub mod upload;
