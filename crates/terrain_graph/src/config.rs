//! Graph-wide configuration: working resolutions and size limits.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::maps::{MapSize, DEFAULT_MAX_CELLS};

/// Which of the two configured resolutions generators use.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResolutionMode {
    /// Small maps for interactive editing.
    #[default]
    Preview,
    /// Full-size maps for export.
    Render,
}

/// Configuration for a [`NodeGraph`](crate::graph::NodeGraph).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub struct GraphConfig {
    /// Resolution used while editing.
    pub preview_resolution: MapSize,
    /// Resolution used for the final export.
    pub render_resolution: MapSize,
    /// Active resolution mode.
    pub mode: ResolutionMode,
    /// Largest map, in cells, any node may produce.
    pub max_cells: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            preview_resolution: MapSize::PREVIEW,
            render_resolution: MapSize::RENDER,
            mode: ResolutionMode::Preview,
            max_cells: DEFAULT_MAX_CELLS,
        }
    }
}

impl GraphConfig {
    /// Creates a [`GraphConfig`] with default resolutions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the preview resolution.
    pub fn with_preview_resolution(mut self, size: MapSize) -> Self {
        self.preview_resolution = size;
        self
    }

    /// Sets the render resolution.
    pub fn with_render_resolution(mut self, size: MapSize) -> Self {
        self.render_resolution = size;
        self
    }

    /// Sets the active resolution mode.
    pub fn with_mode(mut self, mode: ResolutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the cell limit.
    pub fn with_max_cells(mut self, max_cells: usize) -> Self {
        self.max_cells = max_cells;
        self
    }

    /// Resolution for the active mode.
    pub fn active_resolution(&self) -> MapSize {
        match self.mode {
            ResolutionMode::Preview => self.preview_resolution,
            ResolutionMode::Render => self.render_resolution,
        }
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.max_cells == 0 {
            return Err(Error::InvalidConfig("max_cells must be > 0".into()));
        }
        for (name, size) in [
            ("preview_resolution", self.preview_resolution),
            ("render_resolution", self.render_resolution),
        ] {
            if size.cells() > self.max_cells {
                return Err(Error::InvalidConfig(format!(
                    "{name} {size} exceeds max_cells {}",
                    self.max_cells
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_editor_resolutions() {
        let config = GraphConfig::default();
        assert_eq!(config.preview_resolution.to_string(), "256x256");
        assert_eq!(config.render_resolution.to_string(), "1024x1024");
        assert_eq!(config.active_resolution(), config.preview_resolution);
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn mode_selects_active_resolution() {
        let config = GraphConfig::new().with_mode(ResolutionMode::Render);
        assert_eq!(config.active_resolution(), config.render_resolution);
    }

    #[test]
    fn resolution_above_limit_is_rejected() {
        let config = GraphConfig::new().with_max_cells(1000);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        let config = GraphConfig::new()
            .with_max_cells(1000)
            .with_preview_resolution(MapSize::new(10, 10).expect("valid"))
            .with_render_resolution(MapSize::new(20, 50).expect("valid"));
        config.validate().expect("both fit");
    }
}
