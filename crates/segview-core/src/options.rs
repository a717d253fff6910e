//! Session configuration.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::isosurface::{IsosurfaceExtractor, ThresholdPolicy};
use crate::style::Style;

/// Configuration options for a session.
///
/// Every field has a default, so a JSON file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Mask samples strictly above this value are part of the structure in slice overlays.
    pub mask_cutoff: f32,

    /// Threshold policy for isosurface extraction.
    pub threshold: ThresholdPolicy,

    /// Laplacian smoothing iterations applied to every surface.
    pub smooth_iterations: u32,

    /// Laplacian smoothing step factor.
    pub relaxation: f32,

    /// How a structure's overlay alpha is derived from its style.
    pub overlay_alpha: OverlayAlpha,

    /// Opacity given to structures without a preset.
    pub default_opacity: f32,

    /// Initial colors/opacities by structure id, matched case-insensitively.
    pub presets: Vec<StylePreset>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            mask_cutoff: 0.5,
            threshold: ThresholdPolicy::Mean,
            smooth_iterations: 0,
            relaxation: 0.0,
            overlay_alpha: OverlayAlpha::MirrorOpacity,
            default_opacity: 1.0,
            presets: Vec::new(),
        }
    }
}

impl Options {
    /// Parses options from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Returns the isosurface extractor these options describe.
    #[must_use]
    pub fn extractor(&self) -> IsosurfaceExtractor {
        IsosurfaceExtractor::new(self.threshold)
            .with_smoothing(self.smooth_iterations, self.relaxation)
    }

    /// Finds the preset for `id`: an exact match first, then a case-insensitive one.
    #[must_use]
    pub fn preset(&self, id: &str) -> Option<&StylePreset> {
        self.presets
            .iter()
            .find(|p| p.name == id)
            .or_else(|| self.presets.iter().find(|p| p.name.eq_ignore_ascii_case(id)))
    }

    /// Returns the style a structure starts with.
    #[must_use]
    pub fn initial_style(&self, id: &str) -> Style {
        let mut style = Style::default_for(id);
        style.opacity = self.default_opacity;
        if let Some(preset) = self.preset(id) {
            if let Some(color) = preset.color {
                style.color = color;
            }
            if let Some(opacity) = preset.opacity {
                style.opacity = opacity;
            }
        }
        style.clamped()
    }
}

/// Initial style values for one structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StylePreset {
    /// Structure id this preset applies to.
    pub name: String,
    /// Initial RGB color.
    #[serde(default)]
    pub color: Option<Vec3>,
    /// Initial opacity.
    #[serde(default)]
    pub opacity: Option<f32>,
}

/// Policy for the alpha of a structure's slice overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverlayAlpha {
    /// Overlay alpha equals the structure's opacity.
    #[default]
    MirrorOpacity,
    /// Every visible structure overlays with this alpha, whatever its opacity.
    Fixed(f32),
}

impl OverlayAlpha {
    /// Conventional overlay alpha for fixed-alpha display.
    pub const DEFAULT_FIXED: f32 = 0.45;

    /// Returns the overlay alpha of a structure with `style`.
    ///
    /// Hidden structures always get 0.
    #[must_use]
    pub fn alpha(self, style: &Style) -> f32 {
        if !style.visible {
            return 0.0;
        }
        match self {
            Self::MirrorOpacity => style.opacity,
            Self::Fixed(alpha) => alpha,
        }
        .clamp(0.0, 1.0)
    }
}
