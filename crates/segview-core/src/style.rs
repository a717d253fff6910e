//! Per-structure visual state.
//!
//! [`StyleRegistry`] is the only place a structure's visibility, opacity and
//! color live. The 3D scene and every slice view read it; none of them keep a
//! copy that could drift.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::palette::default_color;

/// Visual state of one structure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Style {
    /// Whether the structure is drawn at all.
    pub visible: bool,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// RGB color in `[0, 1]³`.
    pub color: Vec3,
}

impl Style {
    /// Returns the default style for a structure id: visible, opaque, palette color.
    #[must_use]
    pub fn default_for(id: &str) -> Self {
        Self {
            visible: true,
            opacity: 1.0,
            color: default_color(id),
        }
    }

    /// Returns the style with opacity clamped to `[0, 1]` and color to `[0, 1]³`.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            visible: self.visible,
            opacity: clamp_unit(self.opacity),
            color: clamp_color(self.color),
        }
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn clamp_color(color: Vec3) -> Vec3 {
    Vec3::new(clamp_unit(color.x), clamp_unit(color.y), clamp_unit(color.z))
}

/// Registry of structure styles, keyed by structure id.
///
/// Reads never fail: an id without an entry reads as its default style.
/// Setters create the entry on first write. Every write is visible to the
/// next read; there is no staging.
#[derive(Debug, Clone, Default)]
pub struct StyleRegistry {
    styles: HashMap<String, Style>,
}

impl StyleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id` with `style` unless it already has an entry.
    ///
    /// Returns the style now in effect.
    pub fn register(&mut self, id: &str, style: Style) -> Style {
        *self
            .styles
            .entry(id.to_string())
            .or_insert_with(|| style.clamped())
    }

    /// Returns the current style of `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Style {
        self.styles
            .get(id)
            .copied()
            .unwrap_or_else(|| Style::default_for(id))
    }

    fn entry(&mut self, id: &str) -> &mut Style {
        self.styles
            .entry(id.to_string())
            .or_insert_with(|| Style::default_for(id))
    }

    /// Sets visibility. Returns true if the stored value changed.
    pub fn set_visible(&mut self, id: &str, visible: bool) -> bool {
        let style = self.entry(id);
        let changed = style.visible != visible;
        style.visible = visible;
        changed
    }

    /// Sets opacity, clamped to `[0, 1]`. Returns true if the stored value changed.
    pub fn set_opacity(&mut self, id: &str, opacity: f32) -> bool {
        let opacity = clamp_unit(opacity);
        let style = self.entry(id);
        let changed = style.opacity.to_bits() != opacity.to_bits();
        style.opacity = opacity;
        changed
    }

    /// Sets the RGB color, clamped to `[0, 1]³`. Returns true if the stored value changed.
    pub fn set_color(&mut self, id: &str, color: Vec3) -> bool {
        let color = clamp_color(color);
        let style = self.entry(id);
        let changed = style.color != color;
        style.color = color;
        changed
    }

    /// Replaces the whole style. Returns true if the stored value changed.
    pub fn set(&mut self, id: &str, style: Style) -> bool {
        let style = style.clamped();
        let entry = self.entry(id);
        let changed = *entry != style;
        *entry = style;
        changed
    }

    /// Checks whether `id` has an entry.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.styles.contains_key(id)
    }

    /// Removes the entry of `id`.
    pub fn remove(&mut self, id: &str) -> Option<Style> {
        self.styles.remove(id)
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        self.styles.clear();
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// Returns true if the registry has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Iterates over all entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Style)> {
        self.styles.iter().map(|(id, style)| (id.as_str(), style))
    }
}
