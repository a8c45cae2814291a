//! Campus parking prediction service.
//!
//! Wraps two pretrained models, an occupancy regressor and an enforcement
//! risk classifier, behind a feature-construction pipeline over read-only
//! historical tables, and serves predictions and parking recommendations
//! over HTTP.

pub mod api;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod model;
pub mod prediction;
pub mod state;
pub mod timefmt;
