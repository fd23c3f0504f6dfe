//! HTML fragments for the render descriptions.
//!
//! Every interpolated value goes through [`escape`]; the fragments are
//! meant to be assigned to `innerHTML` by a browser binding.

use std::fmt::Write as _;

/// Escapes text for use in element content and quoted attribute values.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Success banner with a percentage-filled progress bar.
#[must_use]
pub fn prediction_banner(severity_class: &str, message: &str, percent: f64, label: &str) -> String {
    let class = escape(severity_class);
    format!(
        "<div class=\"alert alert-{class}\" role=\"alert\">\
         <h4 class=\"alert-heading\">{message}</h4>\
         <div class=\"progress mt-2\" style=\"height: 20px;\">\
         <div class=\"progress-bar bg-{class}\" role=\"progressbar\" \
         style=\"width: {percent}%;\" aria-valuenow=\"{percent}\" \
         aria-valuemin=\"0\" aria-valuemax=\"100\">{label}</div>\
         </div></div>",
        message = escape(message),
        label = escape(label),
    )
}

/// Generic error banner.
#[must_use]
pub fn error_banner(message: &str) -> String {
    format!(
        "<div class=\"alert alert-danger\" role=\"alert\">\
         <i class=\"fas fa-exclamation-triangle me-2\"></i>{}</div>",
        escape(message)
    )
}

/// Marker popup body.
#[must_use]
pub fn incident_popup(
    category: &str,
    district: &str,
    count: u64,
    color: &str,
    risk_label: &str,
) -> String {
    format!(
        "<div class=\"map-popup\">\
         <h6>{}</h6>\
         <p><strong>District:</strong> {}</p>\
         <p><strong>Incidents:</strong> {count}</p>\
         <p style=\"color:{}\"><i class=\"fas fa-map-marker-alt\"></i> {}</p>\
         </div>",
        escape(category),
        escape(district),
        escape(color),
        escape(risk_label),
    )
}

/// Alert box used for transient map notices.
#[must_use]
pub fn notice(kind: &str, text: &str) -> String {
    format!(
        "<div class=\"alert alert-{}\">{}</div>",
        escape(kind),
        escape(text)
    )
}

/// Legend box listing `(color, label)` swatches under a title.
#[must_use]
pub fn legend<'a>(title: &str, entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut html = format!("<div class=\"map-legend\"><h6>{}</h6>", escape(title));
    for (color, label) in entries {
        let _ = write!(
            html,
            "<div><i style=\"background:{}\"></i> {}</div>",
            escape(color),
            escape(label)
        );
    }
    html.push_str("</div>");
    html
}
