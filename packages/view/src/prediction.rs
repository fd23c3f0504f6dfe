//! Prediction form controller.
//!
//! A submit marks the trigger control busy, posts the selection, renders
//! exactly one banner and restores the control. Restoration happens in a
//! drop guard, so it also runs if the binding panics while rendering.
//!
//! Only one request is in flight per form. A submit that arrives while
//! another is pending is ignored and leaves the surface untouched.

use std::sync::atomic::{AtomicBool, Ordering};

use crime_risk_client::{ApiError, RiskApi};
use crime_risk_models::{PredictionQuery, PredictionResult};
use serde::Serialize;

use crate::html;

/// Label shown on the trigger control while a request is in flight.
pub const BUSY_LABEL: &str = "Predicting...";

/// Banner text used when an error carries no message.
pub const ERROR_FALLBACK: &str = "Error making prediction";

/// What the result panel should show after a submit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultBanner {
    /// A prediction was returned.
    Success {
        /// Lower-cased risk level, used as the style class suffix.
        severity_class: String,
        /// Server-provided summary.
        message: String,
        /// Fill width of the progress bar, `0..=100`.
        percent: f64,
        /// Progress bar text, e.g. `"73.0%"`.
        percent_label: String,
    },
    /// The request or the server failed.
    Error {
        /// Error text shown to the user.
        message: String,
    },
}

impl ResultBanner {
    /// Whether this is the error banner.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// HTML fragment for the result panel.
    #[must_use]
    pub fn to_html(&self) -> String {
        match self {
            Self::Success {
                severity_class,
                message,
                percent,
                percent_label,
            } => html::prediction_banner(severity_class, message, *percent, percent_label),
            Self::Error { message } => html::error_banner(message),
        }
    }
}

/// Builds the success banner for a prediction.
#[must_use]
pub fn render_prediction(result: &PredictionResult) -> ResultBanner {
    ResultBanner::Success {
        severity_class: result.risk_level.css_key(),
        message: result.message.clone(),
        percent: result.percent(),
        percent_label: result.percent_label(),
    }
}

/// Builds the error banner for a failed request.
///
/// Transport, status, application and parse failures all collapse to the
/// same banner showing the error's text.
#[must_use]
pub fn render_error(error: &ApiError) -> ResultBanner {
    let message = error.to_string();
    ResultBanner::Error {
        message: if message.trim().is_empty() {
            ERROR_FALLBACK.to_string()
        } else {
            message
        },
    }
}

/// Builds the banner for either outcome, logging failures.
#[must_use]
pub fn render_outcome(outcome: &Result<PredictionResult, ApiError>) -> ResultBanner {
    match outcome {
        Ok(result) => render_prediction(result),
        Err(e) => {
            log::error!("Prediction failed: {e}");
            render_error(e)
        }
    }
}

/// UI binding for the form's trigger control and result panel.
pub trait FormSurface {
    /// Current label of the trigger control.
    fn submit_label(&self) -> String;

    /// Disables the control and shows a busy indicator with `label`.
    fn set_busy(&mut self, label: &str);

    /// Re-enables the control and puts back `label`.
    fn restore(&mut self, label: &str);

    /// Replaces the result panel contents.
    fn show_result(&mut self, banner: &ResultBanner);
}

/// Result of [`PredictionForm::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The request completed and this banner was shown.
    Rendered(ResultBanner),
    /// Another submit was already in flight.
    Ignored,
}

/// Prediction form controller.
#[derive(Debug, Default)]
pub struct PredictionForm {
    in_flight: AtomicBool,
}

impl PredictionForm {
    /// Creates an idle form.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a submit is currently pending.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Submits `query` and renders the result onto `surface`.
    pub async fn submit<S, A>(
        &self,
        surface: &mut S,
        api: &A,
        query: PredictionQuery,
    ) -> SubmitOutcome
    where
        S: FormSurface + ?Sized,
        A: RiskApi + ?Sized,
    {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::warn!("Ignoring prediction submit while another is in flight");
            return SubmitOutcome::Ignored;
        }

        let guard = BusyGuard::engage(surface, &self.in_flight);

        log::info!(
            "Requesting prediction for hour={} day={} month={}",
            query.hour,
            query.day,
            query.month
        );
        let outcome = api.predict(&query).await;
        let banner = render_outcome(&outcome);
        guard.surface.show_result(&banner);

        SubmitOutcome::Rendered(banner)
    }
}

/// Holds the trigger control busy and the form claimed until dropped.
struct BusyGuard<'a, S: FormSurface + ?Sized> {
    surface: &'a mut S,
    original_label: String,
    in_flight: &'a AtomicBool,
}

impl<'a, S: FormSurface + ?Sized> BusyGuard<'a, S> {
    fn engage(surface: &'a mut S, in_flight: &'a AtomicBool) -> Self {
        let original_label = surface.submit_label();
        surface.set_busy(BUSY_LABEL);
        Self {
            surface,
            original_label,
            in_flight,
        }
    }
}

impl<S: FormSurface + ?Sized> Drop for BusyGuard<'_, S> {
    fn drop(&mut self) {
        self.surface.restore(&self.original_label);
        self.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use crime_risk_models::{Hour, Month, RiskLevel, Weekday};
    use serde_json::Value;
    use tokio::sync::Notify;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum FormEvent {
        Busy(String),
        Restore(String),
        Result(ResultBanner),
    }

    struct RecordingForm {
        label: String,
        disabled: bool,
        events: Vec<FormEvent>,
        panic_on_render: bool,
    }

    impl RecordingForm {
        fn new(label: &str) -> Self {
            Self {
                label: label.to_string(),
                disabled: false,
                events: Vec::new(),
                panic_on_render: false,
            }
        }
    }

    impl FormSurface for RecordingForm {
        fn submit_label(&self) -> String {
            self.label.clone()
        }

        fn set_busy(&mut self, label: &str) {
            self.label = label.to_string();
            self.disabled = true;
            self.events.push(FormEvent::Busy(label.to_string()));
        }

        fn restore(&mut self, label: &str) {
            self.label = label.to_string();
            self.disabled = false;
            self.events.push(FormEvent::Restore(label.to_string()));
        }

        fn show_result(&mut self, banner: &ResultBanner) {
            assert!(!self.panic_on_render, "render failed");
            self.events.push(FormEvent::Result(banner.clone()));
        }
    }

    /// A real `reqwest` failure raised before any bytes are sent.
    fn transport_error() -> ApiError {
        let err = reqwest::Client::new()
            .get("http://[::1")
            .build()
            .unwrap_err();
        ApiError::Http(err)
    }

    enum Reply {
        Ok(PredictionResult),
        Application(&'static str),
        Status(u16),
        Transport,
    }

    struct FakeApi {
        reply: Reply,
        gate: Option<Arc<Notify>>,
    }

    impl FakeApi {
        const fn new(reply: Reply) -> Self {
            Self { reply, gate: None }
        }
    }

    #[async_trait]
    impl RiskApi for FakeApi {
        async fn predict(&self, _query: &PredictionQuery) -> Result<PredictionResult, ApiError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match &self.reply {
                Reply::Ok(result) => Ok(result.clone()),
                Reply::Application(message) => Err(ApiError::Application {
                    message: (*message).to_string(),
                }),
                Reply::Status(status) => Err(ApiError::Status { status: *status }),
                Reply::Transport => Err(transport_error()),
            }
        }

        async fn heatmap_data(&self) -> Result<Value, ApiError> {
            Ok(Value::Array(Vec::new()))
        }
    }

    fn query() -> PredictionQuery {
        PredictionQuery {
            hour: Hour::new(22).unwrap(),
            day: Weekday::Saturday,
            month: Month::October,
        }
    }

    fn high_risk() -> PredictionResult {
        PredictionResult {
            prediction: 0.73,
            risk_level: RiskLevel("High".to_string()),
            message: "High risk detected".to_string(),
        }
    }

    #[test]
    fn success_banner_derives_class_and_width() {
        let ResultBanner::Success {
            severity_class,
            percent,
            percent_label,
            message,
        } = render_prediction(&high_risk())
        else {
            panic!("expected success banner");
        };
        assert_eq!(severity_class, "high");
        assert!((percent - 73.0).abs() < 1e-9);
        assert_eq!(percent_label, "73.0%");
        assert_eq!(message, "High risk detected");
    }

    #[test]
    fn empty_error_message_uses_fallback() {
        let banner = render_error(&ApiError::Application {
            message: String::new(),
        });
        assert_eq!(
            banner,
            ResultBanner::Error {
                message: ERROR_FALLBACK.to_string()
            }
        );
    }

    #[tokio::test]
    async fn submit_renders_success_and_restores() {
        let form = PredictionForm::new();
        let mut surface = RecordingForm::new("Predict Risk");
        let api = FakeApi::new(Reply::Ok(high_risk()));

        let outcome = form.submit(&mut surface, &api, query()).await;

        let SubmitOutcome::Rendered(banner) = outcome else {
            panic!("expected rendered outcome");
        };
        assert!(!banner.is_error());
        assert_eq!(
            surface.events,
            vec![
                FormEvent::Busy(BUSY_LABEL.to_string()),
                FormEvent::Result(banner),
                FormEvent::Restore("Predict Risk".to_string()),
            ]
        );
        assert!(!surface.disabled);
        assert!(!form.is_in_flight());
    }

    #[tokio::test]
    async fn application_error_shows_error_banner() {
        let form = PredictionForm::new();
        let mut surface = RecordingForm::new("Predict Risk");
        let api = FakeApi::new(Reply::Application("model unavailable"));

        let outcome = form.submit(&mut surface, &api, query()).await;

        assert_eq!(
            outcome,
            SubmitOutcome::Rendered(ResultBanner::Error {
                message: "model unavailable".to_string()
            })
        );
        assert_eq!(surface.label, "Predict Risk");
    }

    #[tokio::test]
    async fn network_failure_restores_control() {
        let form = PredictionForm::new();
        let mut surface = RecordingForm::new("Predict Risk");
        let api = FakeApi::new(Reply::Transport);

        let outcome = form.submit(&mut surface, &api, query()).await;

        let SubmitOutcome::Rendered(banner) = outcome else {
            panic!("expected rendered outcome");
        };
        assert!(banner.is_error());
        assert!(!form.is_in_flight());
        assert_eq!(surface.label, "Predict Risk");
        assert!(!surface.disabled);
        assert_eq!(
            surface.events.last(),
            Some(&FormEvent::Restore("Predict Risk".to_string()))
        );
    }

    #[tokio::test]
    async fn bad_status_shows_status_text() {
        let form = PredictionForm::new();
        let mut surface = RecordingForm::new("Predict Risk");
        let api = FakeApi::new(Reply::Status(503));

        let outcome = form.submit(&mut surface, &api, query()).await;

        let SubmitOutcome::Rendered(banner) = outcome else {
            panic!("expected rendered outcome");
        };
        assert_eq!(
            banner,
            ResultBanner::Error {
                message: "Network response was not ok (HTTP 503)".to_string()
            }
        );
        assert!(!surface.disabled);
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_ignored() {
        let gate = Arc::new(Notify::new());
        let api = FakeApi {
            reply: Reply::Ok(high_risk()),
            gate: Some(gate.clone()),
        };
        let form = PredictionForm::new();
        let mut first_surface = RecordingForm::new("Predict Risk");
        let mut second_surface = RecordingForm::new("Predict Risk");

        let (first, second) = tokio::join!(form.submit(&mut first_surface, &api, query()), async {
            let outcome = form.submit(&mut second_surface, &api, query()).await;
            gate.notify_one();
            outcome
        });

        assert!(matches!(first, SubmitOutcome::Rendered(_)));
        assert_eq!(second, SubmitOutcome::Ignored);
        assert!(second_surface.events.is_empty());
        assert!(!form.is_in_flight());
    }

    #[test]
    fn control_restored_when_rendering_panics() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let form = PredictionForm::new();
        let mut surface = RecordingForm::new("Predict Risk");
        surface.panic_on_render = true;
        let api = FakeApi::new(Reply::Ok(high_risk()));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            runtime.block_on(form.submit(&mut surface, &api, query()))
        }));

        assert!(result.is_err());
        assert_eq!(surface.label, "Predict Risk");
        assert!(!surface.disabled);
        assert!(!form.is_in_flight());
    }
}
