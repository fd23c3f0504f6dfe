//! Incident map view.
//!
//! [`plan_render`] is the pure part: it turns a `/heatmap_data` body into
//! a [`MapRender`] description. [`IncidentMapView`] drives a
//! [`MapSurface`] binding through one load cycle:
//!
//! ```text
//! idle -> loading -> { rendered | empty | errored }
//! ```
//!
//! Each load shows the loading indicator, removes the previous cluster
//! layer, fetches, renders, and hides the indicator. Hiding happens in a
//! drop guard so it runs whatever the outcome.

use crime_risk_client::RiskApi;
use crime_risk_models::{BoundingBox, IncidentBatch, IncidentPoint, RiskTier};
use serde::Serialize;
use serde_json::Value;

use crate::config::{ClusterConfig, IconTier, MapViewConfig, NoticeWidget, TileLayerConfig};
use crate::html;

/// Notice shown when the response holds no records.
pub const NO_DATA_MESSAGE: &str = "No crime data available";

/// Notice shown when every record failed validation.
pub const NO_VALID_POINTS_MESSAGE: &str = "No valid crime locations found";

/// Notice shown when the request fails.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load crime data";

/// Severity of a transient notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// Non-fatal condition, such as an empty result set.
    Warning,
    /// The load failed.
    Danger,
}

impl NoticeKind {
    /// Style class suffix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

/// A transient message overlaid on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Message text.
    pub text: String,
    /// Severity.
    pub kind: NoticeKind,
    /// Display widget.
    pub widget: NoticeWidget,
    /// Map corner for control widgets.
    pub position: String,
    /// Milliseconds until the binding should remove the notice.
    pub dismiss_after_ms: Option<u64>,
}

impl Notice {
    fn new(text: &str, kind: NoticeKind, config: &MapViewConfig) -> Self {
        Self {
            text: text.to_string(),
            kind,
            widget: config.notice.widget,
            position: config.notice.position.clone(),
            dismiss_after_ms: (config.notice.dismiss_after_ms > 0)
                .then_some(config.notice.dismiss_after_ms),
        }
    }

    /// HTML fragment for the notice.
    #[must_use]
    pub fn to_html(&self) -> String {
        html::notice(self.kind.as_str(), &self.text)
    }
}

/// Circle marker styling.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerStyle {
    /// Radius in pixels.
    pub radius: f64,
    /// Fill color.
    pub fill_color: String,
    /// Outline color.
    pub color: String,
    /// Outline width.
    pub weight: f64,
    /// Outline opacity.
    pub opacity: f64,
    /// Fill opacity.
    pub fill_opacity: f64,
}

/// One incident marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleMarker {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Styling.
    pub style: MarkerStyle,
    /// Tier derived from the point's color.
    pub tier: RiskTier,
    /// Popup HTML.
    pub popup_html: String,
}

impl CircleMarker {
    /// Builds the marker for a validated point.
    #[must_use]
    pub fn from_point(point: &IncidentPoint, config: &MapViewConfig) -> Self {
        let marker = &config.marker;
        let fill_color = point
            .color
            .clone()
            .unwrap_or_else(|| marker.default_fill_color.clone());
        let tier = point.tier();

        Self {
            lat: point.lat,
            lng: point.lng,
            popup_html: html::incident_popup(
                point.category_or_unknown(),
                point.district_or_unknown(),
                point.count.unwrap_or(0),
                &fill_color,
                tier.label(),
            ),
            style: MarkerStyle {
                radius: point.radius.unwrap_or(marker.default_radius),
                fill_color,
                color: marker.stroke_color.clone(),
                weight: marker.weight,
                opacity: marker.opacity,
                fill_opacity: marker.fill_opacity,
            },
            tier,
        }
    }
}

/// Clustering options handed to the binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOptions {
    /// Maximum radius in pixels a cluster covers.
    pub max_cluster_radius: u32,
    /// Whether clusters fan out at the maximum zoom level.
    pub spiderfy_on_max_zoom: bool,
    /// Whether hovering a cluster shows its coverage.
    pub show_coverage_on_hover: bool,
    /// Icon size tiers for [`cluster_icon`].
    pub icon_tiers: Vec<IconTier>,
}

impl From<&ClusterConfig> for ClusterOptions {
    fn from(config: &ClusterConfig) -> Self {
        Self {
            max_cluster_radius: config.max_cluster_radius,
            spiderfy_on_max_zoom: config.spiderfy_on_max_zoom,
            show_coverage_on_hover: config.show_coverage_on_hover,
            icon_tiers: config.icon_tiers.clone(),
        }
    }
}

/// A clustered marker layer plus the viewport fit that follows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterLayer {
    /// Clustering options.
    pub options: ClusterOptions,
    /// Markers, in response order. Never empty.
    pub markers: Vec<CircleMarker>,
    /// Bounding box of every marker.
    pub bounds: BoundingBox,
    /// Padding applied when fitting the viewport.
    pub fit_padding: [u32; 2],
}

/// Icon for a cluster of `count` markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterIcon {
    /// CSS class.
    pub class: String,
    /// Edge length in pixels.
    pub size: u32,
}

/// Picks the icon for a cluster: the last tier whose threshold `count`
/// exceeds, or the first tier if none does.
#[must_use]
pub fn cluster_icon(count: u64, tiers: &[IconTier]) -> Option<ClusterIcon> {
    tiers
        .iter()
        .rev()
        .find(|tier| count > tier.above)
        .or_else(|| tiers.first())
        .map(|tier| ClusterIcon {
            class: tier.class.clone(),
            size: tier.size,
        })
}

/// Terminal render state of one load.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "render", rename_all = "snake_case")]
pub enum MapRender {
    /// Valid points were found.
    Clusters(ClusterLayer),
    /// Nothing to draw; show this notice instead.
    Empty(Notice),
}

/// Turns a `/heatmap_data` body into a render description.
///
/// Non-array bodies and empty arrays yield [`NO_DATA_MESSAGE`]; arrays
/// whose records all fail validation yield [`NO_VALID_POINTS_MESSAGE`].
#[must_use]
pub fn plan_render(body: &Value, config: &MapViewConfig) -> MapRender {
    let Some(batch) = IncidentBatch::from_json(body).filter(|b| b.received > 0) else {
        log::warn!("Heatmap response contained no records");
        return MapRender::Empty(Notice::new(NO_DATA_MESSAGE, NoticeKind::Warning, config));
    };

    if batch.dropped() > 0 {
        log::debug!(
            "Dropped {} of {} heatmap records with invalid coordinates",
            batch.dropped(),
            batch.received
        );
    }

    let Some(bounds) = BoundingBox::from_points(batch.points.iter().map(|p| (p.lat, p.lng)))
    else {
        log::warn!("No valid locations among {} heatmap records", batch.received);
        return MapRender::Empty(Notice::new(
            NO_VALID_POINTS_MESSAGE,
            NoticeKind::Warning,
            config,
        ));
    };

    MapRender::Clusters(ClusterLayer {
        options: ClusterOptions::from(&config.cluster),
        markers: batch
            .points
            .iter()
            .map(|point| CircleMarker::from_point(point, config))
            .collect(),
        bounds,
        fit_padding: config.fit_padding,
    })
}

/// Notice shown when the request fails.
#[must_use]
pub fn error_notice(config: &MapViewConfig) -> Notice {
    Notice::new(LOAD_FAILED_MESSAGE, NoticeKind::Danger, config)
}

/// One legend row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegendEntry {
    /// Tier.
    pub tier: RiskTier,
    /// Label.
    pub label: String,
    /// Swatch color.
    pub color: String,
}

/// Static legend control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Legend {
    /// Heading.
    pub title: String,
    /// Map corner.
    pub position: String,
    /// Rows, most severe first.
    pub entries: Vec<LegendEntry>,
}

impl Legend {
    /// HTML fragment for the legend control.
    #[must_use]
    pub fn to_html(&self) -> String {
        html::legend(
            &self.title,
            self.entries
                .iter()
                .map(|e| (e.color.as_str(), e.label.as_str())),
        )
    }
}

/// Builds the legend listing the three risk tiers.
#[must_use]
pub fn legend(config: &MapViewConfig) -> Legend {
    Legend {
        title: config.legend.title.clone(),
        position: config.legend.position.clone(),
        entries: RiskTier::all()
            .iter()
            .map(|tier| LegendEntry {
                tier: *tier,
                label: tier.label().to_string(),
                color: tier.color().to_string(),
            })
            .collect(),
    }
}

/// Initial map setup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapInit {
    /// Center as `[lat, lng]`.
    pub center: [f64; 2],
    /// Zoom level.
    pub zoom: u8,
    /// Base tile layer.
    pub tiles: TileLayerConfig,
}

impl From<&MapViewConfig> for MapInit {
    fn from(config: &MapViewConfig) -> Self {
        Self {
            center: config.center,
            zoom: config.zoom,
            tiles: config.tiles.clone(),
        }
    }
}

/// Handle to a layer added through a [`MapSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LayerId(pub u64);

/// UI binding for the tile map.
pub trait MapSurface {
    /// Creates the map and its base tile layer.
    fn init_map(&mut self, init: &MapInit);

    /// Shows the loading indicator.
    fn show_loading(&mut self);

    /// Hides the loading indicator.
    fn hide_loading(&mut self);

    /// Adds a clustered marker layer, returning its handle.
    fn add_cluster_layer(&mut self, layer: &ClusterLayer) -> LayerId;

    /// Removes a previously added layer.
    fn remove_layer(&mut self, id: LayerId);

    /// Fits the viewport to `bounds` with `padding` pixels.
    fn fit_bounds(&mut self, bounds: BoundingBox, padding: [u32; 2]);

    /// Shows a transient notice. The binding removes it after
    /// `dismiss_after_ms`.
    fn show_notice(&mut self, notice: &Notice);

    /// Adds the legend control.
    fn add_legend(&mut self, legend: &Legend);
}

/// Where the view is in its load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState {
    /// Not loaded yet.
    Idle,
    /// A fetch is pending.
    Loading,
    /// Markers are on the map.
    Rendered {
        /// Number of markers drawn.
        markers: usize,
    },
    /// The response held nothing drawable.
    Empty,
    /// The request failed.
    Errored,
}

/// Incident map controller.
pub struct IncidentMapView<S: MapSurface> {
    surface: S,
    config: MapViewConfig,
    cluster_layer: Option<LayerId>,
    state: ViewState,
    mounted: bool,
}

impl<S: MapSurface> IncidentMapView<S> {
    /// Creates an unmounted view.
    #[must_use]
    pub const fn new(surface: S, config: MapViewConfig) -> Self {
        Self {
            surface,
            config,
            cluster_layer: None,
            state: ViewState::Idle,
            mounted: false,
        }
    }

    /// Initializes the map and legend on first call, then loads data.
    pub async fn mount<A: RiskApi + ?Sized>(&mut self, api: &A) -> ViewState {
        if !self.mounted {
            self.surface.init_map(&MapInit::from(&self.config));
            self.surface.add_legend(&legend(&self.config));
            self.mounted = true;
        }
        self.load(api).await
    }

    /// Fetches incident data and renders it, replacing any previous layer.
    pub async fn load<A: RiskApi + ?Sized>(&mut self, api: &A) -> ViewState {
        let mut guard = LoadingGuard::show(&mut self.surface, &mut self.state);

        if let Some(id) = self.cluster_layer.take() {
            guard.surface.remove_layer(id);
        }

        let state = match api.heatmap_data().await {
            Ok(body) => match plan_render(&body, &self.config) {
                MapRender::Clusters(layer) => {
                    let id = guard.surface.add_cluster_layer(&layer);
                    guard.surface.fit_bounds(layer.bounds, layer.fit_padding);
                    self.cluster_layer = Some(id);
                    log::info!("Rendered {} incident markers", layer.markers.len());
                    ViewState::Rendered {
                        markers: layer.markers.len(),
                    }
                }
                MapRender::Empty(notice) => {
                    guard.surface.show_notice(&notice);
                    ViewState::Empty
                }
            },
            Err(e) => {
                log::error!("Failed to load heatmap data: {e}");
                guard.surface.show_notice(&error_notice(&self.config));
                ViewState::Errored
            }
        };

        guard.settle(state);
        state
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ViewState {
        self.state
    }

    /// Handle of the cluster layer currently on the map.
    #[must_use]
    pub const fn cluster_layer(&self) -> Option<LayerId> {
        self.cluster_layer
    }

    /// The underlying binding.
    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// Consumes the view, returning the binding.
    #[must_use]
    pub fn into_surface(self) -> S {
        self.surface
    }
}

/// Keeps the loading indicator up until dropped, then publishes the view
/// state. A load abandoned before [`LoadingGuard::settle`] ends as
/// [`ViewState::Errored`], since its previous layer is already gone.
struct LoadingGuard<'a, S: MapSurface> {
    surface: &'a mut S,
    state: &'a mut ViewState,
    outcome: ViewState,
}

impl<'a, S: MapSurface> LoadingGuard<'a, S> {
    fn show(surface: &'a mut S, state: &'a mut ViewState) -> Self {
        surface.show_loading();
        *state = ViewState::Loading;
        Self {
            surface,
            state,
            outcome: ViewState::Errored,
        }
    }

    const fn settle(&mut self, outcome: ViewState) {
        self.outcome = outcome;
    }
}

impl<S: MapSurface> Drop for LoadingGuard<'_, S> {
    fn drop(&mut self) {
        self.surface.hide_loading();
        *self.state = self.outcome;
    }
}
