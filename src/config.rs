//! Startup configuration
//!
//! Everything has a default, so an empty file (or no file at all) gives the
//! stock room. Values are read from TOML:
//!
//! ```toml
//! asset_root = "assets"
//! panel = "wide"
//! butterfly_speed = 45.0
//!
//! [canvas]
//! mode = "fitted"
//!
//! [initial]
//! axes = true
//! vase_x = 50.0
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::animation::DEFAULT_SPEED;
use crate::params::{PanelVariant, SceneParameters};

/// Canvas width the room was laid out for
pub const CANVAS_WIDTH: u32 = 846;
/// Canvas height the room was laid out for
pub const CANVAS_HEIGHT: u32 = 494;

/// How big the window is
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CanvasMode {
    /// Always 846 x 494
    #[default]
    Fixed,
    /// A fraction of the monitor width, keeping the 846:494 aspect
    Fitted {
        #[serde(default = "default_fill")]
        fill: f32,
    },
}

fn default_fill() -> f32 {
    0.9
}

impl CanvasMode {
    /// Window size for a monitor `monitor_width` pixels wide
    pub fn size(&self, monitor_width: u32) -> (u32, u32) {
        match self {
            CanvasMode::Fixed => (CANVAS_WIDTH, CANVAS_HEIGHT),
            CanvasMode::Fitted { fill } => {
                let width = (monitor_width as f32 * fill.clamp(0.1, 1.0)).round().max(1.0);
                let height = (width * CANVAS_HEIGHT as f32 / CANVAS_WIDTH as f32).round();
                (width as u32, height.max(1.0) as u32)
            }
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Directory the fixed asset paths are resolved against
    pub asset_root: PathBuf,
    pub canvas: CanvasMode,
    pub panel: PanelVariant,
    /// Butterfly path units per second
    pub butterfly_speed: f32,
    pub show_flower_heads: bool,
    /// Fraction of pending camera motion applied per 60 Hz frame
    pub camera_damping: f32,
    /// Parameters the panel starts from
    pub initial: SceneParameters,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            canvas: CanvasMode::Fixed,
            panel: PanelVariant::Room,
            butterfly_speed: DEFAULT_SPEED,
            show_flower_heads: true,
            camera_damping: 0.05,
            initial: SceneParameters::default(),
        }
    }
}

impl DemoConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses a config, replacing values the room cannot run with
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<Self>(text).map(Self::normalized)
    }

    fn normalized(mut self) -> Self {
        let defaults = Self::default();
        self.butterfly_speed = finite_or(self.butterfly_speed, defaults.butterfly_speed).max(0.0);
        self.camera_damping = finite_or(self.camera_damping, defaults.camera_damping);
        if let CanvasMode::Fitted { fill } = &mut self.canvas {
            *fill = finite_or(*fill, default_fill());
        }

        let stock = defaults.initial;
        let initial = &mut self.initial;
        initial.vase_x = finite_or(initial.vase_x, stock.vase_x);
        initial.vase_z = finite_or(initial.vase_z, stock.vase_z);
        initial.vase_rotation = finite_or(initial.vase_rotation, stock.vase_rotation);
        initial.fog_density = finite_or(initial.fog_density, stock.fog_density);
        for (channel, fallback) in initial.fog_color.iter_mut().zip(stock.fog_color) {
            *channel = finite_or(*channel, fallback);
        }
        self
    }

    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = root.into();
        self
    }

    pub fn with_canvas(mut self, canvas: CanvasMode) -> Self {
        self.canvas = canvas;
        self
    }

    pub fn with_panel(mut self, panel: PanelVariant) -> Self {
        self.panel = panel;
        self
    }

    pub fn with_butterfly_speed(mut self, speed: f32) -> Self {
        self.butterfly_speed = finite_or(speed, DEFAULT_SPEED).max(0.0);
        self
    }

    pub fn with_flower_heads(mut self, show: bool) -> Self {
        self.show_flower_heads = show;
        self
    }

    pub fn with_camera_damping(mut self, damping: f32) -> Self {
        self.camera_damping = damping;
        self
    }

    pub fn with_initial(mut self, initial: SceneParameters) -> Self {
        self.initial = initial;
        self
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = DemoConfig::from_toml("").expect("empty config parses");
        assert_eq!(config, DemoConfig::default());
        assert_eq!(config.butterfly_speed, 60.0);
        assert_eq!(config.initial.fog_density, 0.00025);
    }

    #[test]
    fn test_partial_file_overrides_named_fields() {
        let config = DemoConfig::from_toml(
            r#"
            asset_root = "assets"
            panel = "wide"
            show_flower_heads = false

            [canvas]
            mode = "fitted"

            [initial]
            axes = true
            vase_x = 50.0
            "#,
        )
        .expect("config parses");

        assert_eq!(config.asset_root, PathBuf::from("assets"));
        assert_eq!(config.panel, PanelVariant::Wide);
        assert!(!config.show_flower_heads);
        assert_eq!(config.canvas, CanvasMode::Fitted { fill: 0.9 });
        assert!(config.initial.axes);
        assert_eq!(config.initial.vase_x, 50.0);
        assert!(!config.initial.ground);
        assert_eq!(config.butterfly_speed, DEFAULT_SPEED);
    }

    #[test]
    fn test_bad_value_is_a_parse_error() {
        assert!(DemoConfig::from_toml("butterfly_speed = \"fast\"").is_err());

        let missing = DemoConfig::load("/nonexistent/sunroom.toml");
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_negative_speed_from_file_is_clamped() {
        let config = DemoConfig::from_toml("butterfly_speed = -60.0").expect("config parses");
        assert_eq!(config.butterfly_speed, 0.0);

        let config = DemoConfig::from_toml("butterfly_speed = nan").expect("config parses");
        assert_eq!(config.butterfly_speed, DEFAULT_SPEED);
    }

    #[test]
    fn test_non_finite_initial_values_fall_back_to_defaults() {
        let config = DemoConfig::from_toml(
            r#"
            camera_damping = inf

            [canvas]
            mode = "fitted"
            fill = nan

            [initial]
            vase_x = nan
            vase_z = 12.0
            fog_density = inf
            fog_color = [0.5, -inf, 0.25]
            "#,
        )
        .expect("config parses");

        let stock = SceneParameters::default();
        assert_eq!(config.initial.vase_x, stock.vase_x);
        assert_eq!(config.initial.vase_z, 12.0);
        assert_eq!(config.initial.fog_density, stock.fog_density);
        assert_eq!(config.initial.fog_color, [0.5, stock.fog_color[1], 0.25]);
        assert_eq!(config.camera_damping, 0.05);
        assert_eq!(config.canvas, CanvasMode::Fitted { fill: 0.9 });

        // a clean start commits nothing
        let mut panel = crate::params::ParameterPanel::new(config.initial, config.panel);
        assert!(panel.commit().is_empty());
        assert!(panel.commit().is_empty());
    }

    #[test]
    fn test_canvas_sizes() {
        assert_eq!(CanvasMode::Fixed.size(1920), (846, 494));

        let (w, h) = CanvasMode::Fitted { fill: 0.9 }.size(1920);
        assert_eq!(w, 1728);
        assert_eq!(h, (1728.0f32 * 494.0 / 846.0).round() as u32);
    }

    #[test]
    fn test_builders() {
        let config = DemoConfig::default()
            .with_asset_root("/srv/room")
            .with_butterfly_speed(-3.0)
            .with_flower_heads(false)
            .with_panel(PanelVariant::Wide);
        assert_eq!(config.asset_root, PathBuf::from("/srv/room"));
        assert_eq!(config.butterfly_speed, 0.0);
        assert!(!config.show_flower_heads);
        assert_eq!(config.panel, PanelVariant::Wide);
    }
}
