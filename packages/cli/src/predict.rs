//! Terminal binding for the prediction form.

use crime_risk_cli_utils::{MultiProgress, Spinner};
use crime_risk_view::ResultBanner;
use crime_risk_view::prediction::FormSurface;

/// Width of the text progress bar, in cells.
const BAR_WIDTH: usize = 30;

/// Label of the (virtual) submit control.
const SUBMIT_LABEL: &str = "Predict Risk";

/// Prints banners to stdout and shows a spinner while busy.
pub struct TerminalForm<'a> {
    multi: &'a MultiProgress,
    label: String,
    spinner: Option<Spinner>,
    html: bool,
}

impl<'a> TerminalForm<'a> {
    pub fn new(multi: &'a MultiProgress, html: bool) -> Self {
        Self {
            multi,
            label: SUBMIT_LABEL.to_string(),
            spinner: None,
            html,
        }
    }
}

impl FormSurface for TerminalForm<'_> {
    fn submit_label(&self) -> String {
        self.label.clone()
    }

    fn set_busy(&mut self, label: &str) {
        self.label = label.to_string();
        self.spinner = Some(Spinner::start(self.multi, label));
    }

    fn restore(&mut self, label: &str) {
        self.spinner = None;
        self.label = label.to_string();
    }

    fn show_result(&mut self, banner: &ResultBanner) {
        let output = if self.html {
            banner.to_html()
        } else {
            banner_text(banner)
        };
        self.multi.suspend(|| println!("{output}"));
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn banner_text(banner: &ResultBanner) -> String {
    match banner {
        ResultBanner::Success {
            severity_class,
            message,
            percent,
            percent_label,
        } => {
            let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
            let filled = filled.min(BAR_WIDTH);
            format!(
                "{message}\nRisk level: {severity_class}\n[{}{}] {percent_label}",
                "#".repeat(filled),
                "-".repeat(BAR_WIDTH - filled),
            )
        }
        ResultBanner::Error { message } => format!("Error: {message}"),
    }
}
