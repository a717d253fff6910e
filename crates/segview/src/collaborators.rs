//! Interfaces to the outside world: color picking, structure discovery and
//! evaluation metrics.
//!
//! The session only talks to these through traits so that it never depends
//! on a particular UI toolkit or data layout.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};
use segview_core::{is_volume_file, volume_stem, Result};

/// Modal color selection.
pub trait ColorPicker {
    /// Asks the user for a color for `structure`, starting from `current`.
    ///
    /// Returns `None` if the user cancels.
    fn pick_color(&mut self, structure: &str, current: Vec3) -> Option<Vec3>;
}

impl<F> ColorPicker for F
where
    F: FnMut(&str, Vec3) -> Option<Vec3>,
{
    fn pick_color(&mut self, structure: &str, current: Vec3) -> Option<Vec3> {
        self(structure, current)
    }
}

/// Supplies the mask files of one organ for one segmentation model.
pub trait StructureSource {
    /// Returns `(structure id, mask path)` pairs, in load order.
    fn structures(&self, organ: &str, model: &str) -> Vec<(String, PathBuf)>;
}

/// In-memory [`StructureSource`]: organ -> model -> structure id -> mask path.
#[derive(Debug, Clone, Default)]
pub struct StaticStructureSource {
    entries: BTreeMap<String, BTreeMap<String, BTreeMap<String, PathBuf>>>,
}

impl StaticStructureSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one mask. A later insert for the same id replaces the path.
    pub fn insert(
        &mut self,
        organ: impl Into<String>,
        model: impl Into<String>,
        id: impl Into<String>,
        path: impl Into<PathBuf>,
    ) {
        self.entries
            .entry(organ.into())
            .or_default()
            .entry(model.into())
            .or_default()
            .insert(id.into(), path.into());
    }

    /// Adds every volume file in `dir`, using the file stem as the structure id.
    ///
    /// Returns the number of masks added.
    pub fn add_directory(
        &mut self,
        organ: &str,
        model: &str,
        dir: impl AsRef<Path>,
    ) -> Result<usize> {
        let mut added = 0;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || !is_volume_file(&path) {
                continue;
            }
            let Some(id) = volume_stem(&path).map(str::to_string) else {
                continue;
            };
            self.insert(organ, model, id, path);
            added += 1;
        }
        log::debug!("found {added} masks for {organ}/{model}");
        Ok(added)
    }

    /// Returns the known organs.
    pub fn organs(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the models with masks for `organ`.
    pub fn models<'a>(&'a self, organ: &str) -> impl Iterator<Item = &'a str> {
        self.entries
            .get(organ)
            .into_iter()
            .flat_map(|models| models.keys().map(String::as_str))
    }
}

impl StructureSource for StaticStructureSource {
    fn structures(&self, organ: &str, model: &str) -> Vec<(String, PathBuf)> {
        self.entries
            .get(organ)
            .and_then(|models| models.get(model))
            .map(|masks| {
                masks
                    .iter()
                    .map(|(id, path)| (id.clone(), path.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Segmentation quality of one structure for one model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Dice similarity coefficient.
    pub dice: f64,
    /// Intersection over union.
    pub iou: f64,
    /// Volume similarity.
    pub volume_similarity: f64,
}

/// Read-only source of evaluation metrics.
pub trait MetricsProvider {
    /// Returns the metrics of `structure` under `model`, if known.
    fn metrics(&self, model: &str, structure: &str) -> Option<Metrics>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MetricsRow {
    model: String,
    structure: String,
    #[serde(flatten)]
    metrics: Metrics,
}

/// Metrics table keyed by (model, structure).
#[derive(Debug, Clone, Default)]
pub struct MetricsTable {
    rows: BTreeMap<(String, String), Metrics>,
}

impl MetricsTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON array of `{model, structure, dice, iou, volume_similarity}` rows.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let rows: Vec<MetricsRow> = serde_json::from_str(json)?;
        let mut table = Self::new();
        for row in rows {
            table.insert(row.model, row.structure, row.metrics);
        }
        Ok(table)
    }

    /// Reads a metrics table from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serializes the table as JSON rows.
    pub fn to_json_string(&self) -> Result<String> {
        let rows: Vec<MetricsRow> = self
            .rows
            .iter()
            .map(|((model, structure), metrics)| MetricsRow {
                model: model.clone(),
                structure: structure.clone(),
                metrics: *metrics,
            })
            .collect();
        Ok(serde_json::to_string_pretty(&rows)?)
    }

    /// Inserts or replaces one entry.
    pub fn insert(
        &mut self,
        model: impl Into<String>,
        structure: impl Into<String>,
        metrics: Metrics,
    ) {
        self.rows.insert((model.into(), structure.into()), metrics);
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl MetricsProvider for MetricsTable {
    fn metrics(&self, model: &str, structure: &str) -> Option<Metrics> {
        self.rows
            .get(&(model.to_string(), structure.to_string()))
            .copied()
    }
}
