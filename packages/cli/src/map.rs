//! Terminal binding for the incident map view.
//!
//! Text mode prints a summary of each render step; `--json` prints every
//! step as one JSON object per line so the output can be piped into a
//! browser-side renderer or inspected with `jq`.

use std::collections::BTreeMap;

use crime_risk_cli_utils::{MultiProgress, Spinner};
use crime_risk_models::{BoundingBox, RiskTier};
use crime_risk_view::map::{ClusterLayer, LayerId, Legend, MapInit, MapSurface, Notice};
use serde::Serialize;

/// One render step, as printed in JSON mode.
#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum MapEvent<'a> {
    Init { map: &'a MapInit },
    Legend { legend: &'a Legend },
    AddLayer { id: LayerId, layer: &'a ClusterLayer },
    RemoveLayer { id: LayerId },
    FitBounds { bounds: [[f64; 2]; 2], padding: [u32; 2] },
    Notice { notice: &'a Notice },
}

/// Renders map steps to stdout.
pub struct TerminalMap<'a> {
    multi: &'a MultiProgress,
    json: bool,
    spinner: Option<Spinner>,
    next_layer: u64,
}

impl<'a> TerminalMap<'a> {
    pub const fn new(multi: &'a MultiProgress, json: bool) -> Self {
        Self {
            multi,
            json,
            spinner: None,
            next_layer: 0,
        }
    }

    fn emit(&self, event: &MapEvent<'_>, text: impl FnOnce() -> String) {
        let line = if self.json {
            match serde_json::to_string(event) {
                Ok(line) => line,
                Err(e) => {
                    log::error!("Failed to serialize map event: {e}");
                    return;
                }
            }
        } else {
            text()
        };
        self.multi.suspend(|| println!("{line}"));
    }
}

impl MapSurface for TerminalMap<'_> {
    fn init_map(&mut self, init: &MapInit) {
        self.emit(&MapEvent::Init { map: init }, || {
            format!(
                "Map centered at {:.4}, {:.4} (zoom {}), tiles: {}",
                init.center[0], init.center[1], init.zoom, init.tiles.attribution
            )
        });
    }

    fn show_loading(&mut self) {
        self.spinner = Some(Spinner::start(self.multi, "Loading crime data..."));
    }

    fn hide_loading(&mut self) {
        self.spinner = None;
    }

    fn add_cluster_layer(&mut self, layer: &ClusterLayer) -> LayerId {
        self.next_layer += 1;
        let id = LayerId(self.next_layer);
        self.emit(&MapEvent::AddLayer { id, layer }, || layer_summary(layer));
        id
    }

    fn remove_layer(&mut self, id: LayerId) {
        self.emit(&MapEvent::RemoveLayer { id }, || {
            format!("Removed marker layer {}", id.0)
        });
    }

    fn fit_bounds(&mut self, bounds: BoundingBox, padding: [u32; 2]) {
        let corners = bounds.corners();
        self.emit(
            &MapEvent::FitBounds {
                bounds: corners,
                padding,
            },
            || {
                format!(
                    "Viewport: [{:.4}, {:.4}] - [{:.4}, {:.4}]",
                    corners[0][0], corners[0][1], corners[1][0], corners[1][1]
                )
            },
        );
    }

    fn show_notice(&mut self, notice: &Notice) {
        // A terminal line cannot be dismissed; the timeout only applies to
        // graphical bindings.
        self.emit(&MapEvent::Notice { notice }, || {
            format!("[{}] {}", notice.kind.as_str(), notice.text)
        });
    }

    fn add_legend(&mut self, legend: &Legend) {
        self.emit(&MapEvent::Legend { legend }, || {
            let rows: Vec<String> = legend
                .entries
                .iter()
                .map(|e| format!("  {} {}", e.color, e.label))
                .collect();
            format!("{}\n{}", legend.title, rows.join("\n"))
        });
    }
}

fn layer_summary(layer: &ClusterLayer) -> String {
    let mut by_tier: BTreeMap<&str, usize> = BTreeMap::new();
    for marker in &layer.markers {
        *by_tier.entry(marker.tier.label()).or_default() += 1;
    }
    let breakdown: Vec<String> = RiskTier::all()
        .iter()
        .map(|tier| format!("{}: {}", tier.label(), by_tier.get(tier.label()).unwrap_or(&0)))
        .collect();

    format!(
        "Rendered {} markers (cluster radius {}px) - {}",
        layer.markers.len(),
        layer.options.max_cluster_radius,
        breakdown.join(", ")
    )
}
