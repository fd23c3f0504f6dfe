//! Map view configuration.
//!
//! The default configuration is embedded at compile time from
//! `config/map.toml`. A deployment can override it with a TOML file of
//! the same shape via [`MapViewConfig::from_path`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const EMBEDDED_CONFIG: &str = include_str!("../config/map.toml");

/// Errors from loading a map view configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML was malformed or missing fields.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The configuration parsed but is not usable.
    #[error("Invalid map config: {message}")]
    Invalid {
        /// Description of what is wrong.
        message: String,
    },
}

/// Full configuration of the incident map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapViewConfig {
    /// Initial map center as `[lat, lng]`.
    pub center: [f64; 2],
    /// Initial zoom level.
    pub zoom: u8,
    /// Padding in pixels applied when fitting the viewport to the markers.
    pub fit_padding: [u32; 2],
    /// Base tile layer.
    pub tiles: TileLayerConfig,
    /// Marker clustering options.
    pub cluster: ClusterConfig,
    /// Circle marker styling.
    pub marker: MarkerConfig,
    /// Transient notice display.
    pub notice: NoticeConfig,
    /// Legend control.
    pub legend: LegendConfig,
}

/// Base tile layer options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLayerConfig {
    /// Tile URL template (`{s}`, `{z}`, `{x}`, `{y}` placeholders).
    pub url: String,
    /// Attribution text.
    pub attribution: String,
    /// Maximum zoom level served by the tile source.
    pub max_zoom: u8,
}

/// Marker clustering options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Maximum radius in pixels a cluster covers.
    pub max_cluster_radius: u32,
    /// Whether clusters fan out at the maximum zoom level.
    pub spiderfy_on_max_zoom: bool,
    /// Whether hovering a cluster shows the area it covers.
    pub show_coverage_on_hover: bool,
    /// Icon size tiers, ascending by `above`.
    pub icon_tiers: Vec<IconTier>,
}

/// One cluster icon size tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconTier {
    /// Applies to clusters with strictly more members than this.
    pub above: u64,
    /// CSS class for the icon.
    pub class: String,
    /// Icon edge length in pixels.
    pub size: u32,
}

/// Circle marker styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// Radius used when a point carries none.
    pub default_radius: f64,
    /// Fill color used when a point carries none.
    pub default_fill_color: String,
    /// Outline color.
    pub stroke_color: String,
    /// Outline width in pixels.
    pub weight: f64,
    /// Outline opacity.
    pub opacity: f64,
    /// Fill opacity.
    pub fill_opacity: f64,
}

/// How transient notices are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeWidget {
    /// A control docked to a corner of the map.
    Control,
    /// A toast floating above the map container.
    Overlay,
}

/// Transient notice options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeConfig {
    /// Display widget.
    pub widget: NoticeWidget,
    /// Map corner for [`NoticeWidget::Control`] (e.g. `"topright"`).
    pub position: String,
    /// Milliseconds before the notice is removed. `0` keeps it.
    pub dismiss_after_ms: u64,
}

/// Legend control options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendConfig {
    /// Heading shown above the entries.
    pub title: String,
    /// Map corner (e.g. `"bottomright"`).
    pub position: String,
}

impl MapViewConfig {
    /// Returns the configuration embedded in the binary.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (this is a compile-time
    /// guarantee since the file is embedded and covered by tests).
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_toml_str(EMBEDDED_CONFIG)
            .unwrap_or_else(|e| panic!("Failed to parse embedded map config: {e}"))
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] for malformed TOML and
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise
    /// the errors of [`MapViewConfig::from_toml_str`].
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded map config from {}", path.display());
        Self::from_toml_str(&contents)
    }

    /// Checks invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let [lat, lng] = self.center;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(invalid(format!("center {lat},{lng} is out of range")));
        }
        if self.zoom > self.tiles.max_zoom {
            return Err(invalid(format!(
                "zoom {} exceeds tile max_zoom {}",
                self.zoom, self.tiles.max_zoom
            )));
        }
        if self.cluster.icon_tiers.is_empty() {
            return Err(invalid("cluster.icon_tiers must not be empty".to_string()));
        }
        if self
            .cluster
            .icon_tiers
            .windows(2)
            .any(|w| w[0].above >= w[1].above)
        {
            return Err(invalid(
                "cluster.icon_tiers must be strictly ascending by `above`".to_string(),
            ));
        }
        if self.marker.default_radius <= 0.0 {
            return Err(invalid("marker.default_radius must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for MapViewConfig {
    fn default() -> Self {
        Self::embedded()
    }
}

const fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid { message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_loads() {
        let config = MapViewConfig::embedded();
        assert_eq!(config.center, [37.7749, -122.4194]);
        assert_eq!(config.zoom, 12);
        assert_eq!(config.tiles.max_zoom, 18);
        assert_eq!(config.cluster.max_cluster_radius, 40);
        assert_eq!(config.fit_padding, [50, 50]);
        assert_eq!(config.notice.widget, NoticeWidget::Control);
        assert_eq!(config.notice.dismiss_after_ms, 5000);
        let thresholds: Vec<u64> = config.cluster.icon_tiers.iter().map(|t| t.above).collect();
        assert_eq!(thresholds, vec![0, 50, 100]);
    }

    #[test]
    fn rejects_unsorted_tiers() {
        let mut config = MapViewConfig::embedded();
        config.cluster.icon_tiers.swap(1, 2);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_zoom_beyond_tiles() {
        let mut config = MapViewConfig::embedded();
        config.zoom = 19;
        assert!(config.validate().is_err());
    }

    #[test]
    fn overlay_widget_round_trips_through_toml() {
        let mut config = MapViewConfig::embedded();
        config.notice.widget = NoticeWidget::Overlay;
        let text = toml::to_string(&config).unwrap();
        let parsed = MapViewConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.notice.widget, NoticeWidget::Overlay);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = MapViewConfig::from_path(Path::new("/nonexistent/map.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(
            err.to_string()
                .starts_with("Failed to read /nonexistent/map.toml: ")
        );
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = MapViewConfig::from_toml_str("center = ").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }
}
