#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Prediction and incident types for the crime risk application.
//!
//! These types mirror the two JSON endpoints the frontend talks to:
//! `POST /predict` ([`prediction`]) and `GET /heatmap_data`
//! ([`incident`]). Neither outlives a single request/render cycle.

pub mod incident;
pub mod prediction;

pub use incident::{BoundingBox, IncidentBatch, IncidentPoint, RiskTier};
pub use prediction::{
    Hour, Month, ParseFieldError, PredictionQuery, PredictionResponse, PredictionResult,
    RiskLevel, Weekday,
};
