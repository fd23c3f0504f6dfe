#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Render descriptions and controllers for the crime risk frontend.
//!
//! Two independent features live here:
//!
//! * [`prediction`]: the hour/day/month form and its risk banner.
//! * [`map`]: the clustered incident map with its legend.
//!
//! Neither touches a UI toolkit directly. Each turns backend responses
//! into plain render descriptions and hands them to a binding trait
//! ([`prediction::FormSurface`], [`map::MapSurface`]) implemented by the
//! host (a browser, or the terminal bindings in `crime_risk_cli`).

pub mod config;
pub mod html;
pub mod map;
pub mod prediction;

pub use config::{ConfigError, MapViewConfig};
pub use map::{IncidentMapView, MapRender, MapSurface, ViewState, plan_render};
pub use prediction::{FormSurface, PredictionForm, ResultBanner, SubmitOutcome};
