//! A viewing session: one scan, its segmented structures, and every view of them.
//!
//! The session owns the [`StyleRegistry`]. Each style setter writes the
//! registry first, then pushes the new style to the structure's 3D actor in
//! the same call. Slice views hold no style state: each composite reads the
//! registry, so the next composite of any orientation reflects the write.

use std::path::Path;

use glam::Vec3;
use segview_core::{
    load_volume, ExtractionFailure, IsosurfaceExtractor, Options, Orientation, Result,
    SegviewError, Style, StyleRegistry, VolumeGrid, VolumeLoadError,
};
use segview_structures::{SliceCompositor, SliceImage, Structure};

use crate::collaborators::{ColorPicker, StructureSource};
use crate::scene::{RenderSurface, Scene};

/// Which view of the session is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    /// The 3D scene with all structures.
    #[default]
    Overview,
    /// The three orthogonal slice views.
    SliceDetail,
}

/// A recoverable problem with one structure, recorded while the session continues.
#[derive(Debug, Clone)]
pub enum SessionWarning {
    /// The structure's mask could not be loaded; the structure was skipped.
    VolumeLoad {
        structure: String,
        error: VolumeLoadError,
    },
    /// No surface could be extracted; the structure has no 3D actor.
    Extraction {
        structure: String,
        failure: ExtractionFailure,
    },
}

impl SessionWarning {
    /// Returns the id of the structure the warning is about.
    pub fn structure(&self) -> &str {
        match self {
            Self::VolumeLoad { structure, .. } | Self::Extraction { structure, .. } => structure,
        }
    }
}

impl std::fmt::Display for SessionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VolumeLoad { structure, error } => {
                write!(f, "structure '{structure}' skipped: {error}")
            }
            Self::Extraction { structure, failure } => {
                write!(f, "structure '{structure}' has no surface: {failure}")
            }
        }
    }
}

/// A style change addressed to one structure, as sent by per-structure UI controls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StyleEvent<'a> {
    Visible { id: &'a str, visible: bool },
    Opacity { id: &'a str, opacity: f32 },
    Color { id: &'a str, color: Vec3 },
}

/// One scan and the segmented structures shown over it.
#[derive(Debug)]
pub struct Session {
    options: Options,
    extractor: IsosurfaceExtractor,
    scan: VolumeGrid,
    structures: Vec<Structure>,
    styles: StyleRegistry,
    scene: Scene,
    views: [SliceCompositor; 3],
    view_state: ViewState,
    warnings: Vec<SessionWarning>,
}

fn slot(orientation: Orientation) -> usize {
    match orientation {
        Orientation::Axial => 0,
        Orientation::Sagittal => 1,
        Orientation::Coronal => 2,
    }
}

impl Session {
    /// Creates a session over an already loaded scan.
    pub fn new(scan: VolumeGrid, options: Options) -> Self {
        let views = Orientation::ALL.map(|o| SliceCompositor::new(o, &scan));
        let dims = scan.dims();
        log::info!("session opened on {}x{}x{} scan", dims.x, dims.y, dims.z);
        Self {
            extractor: options.extractor(),
            options,
            scan,
            structures: Vec::new(),
            styles: StyleRegistry::new(),
            scene: Scene::new(),
            views,
            view_state: ViewState::default(),
            warnings: Vec::new(),
        }
    }

    /// Opens a session from a scan file and `(structure id, mask path)` pairs.
    ///
    /// Masks that fail to load or extract are recorded in
    /// [`Session::warnings`] and the rest keep loading.
    ///
    /// # Errors
    /// Fails only if the scan cannot be loaded.
    pub fn open<I, S, P>(
        scan_path: impl AsRef<Path>,
        structures: I,
        options: Options,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (S, P)>,
        S: Into<String>,
        P: AsRef<Path>,
    {
        let scan_path = scan_path.as_ref();
        let scan = load_volume(scan_path)?;
        log::info!("loaded scan {}", scan_path.display());
        let mut session = Self::new(scan, options);
        for (id, path) in structures {
            let id = id.into();
            match session.load_structure_file(&id, path) {
                Ok(()) | Err(SegviewError::VolumeLoad(_)) => {}
                Err(e) => log::warn!("skipping structure '{id}': {e}"),
            }
        }
        Ok(session)
    }

    /// Loads every structure `source` lists for `organ` and `model`.
    ///
    /// Returns the number of structures added.
    pub fn load_from_source(
        &mut self,
        source: &dyn StructureSource,
        organ: &str,
        model: &str,
    ) -> usize {
        let mut loaded = 0;
        for (id, path) in source.structures(organ, model) {
            match self.load_structure_file(&id, &path) {
                Ok(()) => loaded += 1,
                Err(SegviewError::VolumeLoad(_)) => {}
                Err(e) => log::warn!("skipping structure '{id}': {e}"),
            }
        }
        loaded
    }

    /// Reads a mask file and adds it as structure `id`.
    ///
    /// A load failure is also recorded as a [`SessionWarning::VolumeLoad`].
    pub fn load_structure_file(&mut self, id: &str, path: impl AsRef<Path>) -> Result<()> {
        if self.contains(id) {
            return Err(SegviewError::StructureExists(id.to_string()));
        }
        match load_volume(path.as_ref()) {
            Ok(mask) => self.load_structure(id, mask),
            Err(error) => {
                log::warn!("structure '{id}' skipped: {error}");
                self.warnings.push(SessionWarning::VolumeLoad {
                    structure: id.to_string(),
                    error: error.clone(),
                });
                Err(error.into())
            }
        }
    }

    /// Adds structure `id` with `mask`.
    ///
    /// The structure gets its preset or default style, and a 3D actor if a
    /// surface can be extracted. Extraction failure is not an error: it is
    /// recorded as a [`SessionWarning::Extraction`] and the structure still
    /// appears in slice views.
    pub fn load_structure(&mut self, id: &str, mask: VolumeGrid) -> Result<()> {
        if self.contains(id) {
            return Err(SegviewError::StructureExists(id.to_string()));
        }
        if mask.dims() != self.scan.dims() {
            log::debug!(
                "mask '{id}' is {} but scan is {}; slices will zero-fill",
                mask.dims(),
                self.scan.dims()
            );
        }
        let style = self.styles.register(id, self.options.initial_style(id));
        self.structures.push(Structure::new(id, mask));
        let Some(structure) = self.structures.last() else {
            return Ok(());
        };

        match structure.surface(&self.extractor) {
            Ok(mesh) => {
                self.scene.add_actor(id, mesh, &style)?;
                log::info!(
                    "loaded structure '{id}' ({} triangles)",
                    mesh.num_triangles()
                );
            }
            Err(failure) => {
                self.warnings.push(SessionWarning::Extraction {
                    structure: id.to_string(),
                    failure: failure.clone(),
                });
                log::info!("loaded structure '{id}' without surface");
            }
        }
        Ok(())
    }

    /// Removes structure `id` with its actor and style.
    pub fn remove_structure(&mut self, id: &str) -> Result<()> {
        let index = self
            .structures
            .iter()
            .position(|s| s.id() == id)
            .ok_or_else(|| SegviewError::StructureNotFound(id.to_string()))?;
        self.structures.remove(index);
        self.scene.remove(id);
        self.styles.remove(id);
        self.warnings.retain(|w| w.structure() != id);
        log::debug!("removed structure '{id}'");
        Ok(())
    }

    /// Removes every structure.
    pub fn remove_all(&mut self) {
        self.structures.clear();
        self.scene.clear();
        self.styles.clear();
        self.warnings.clear();
    }

    fn require(&self, id: &str) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(SegviewError::StructureNotFound(id.to_string()))
        }
    }

    fn sync_actor(&mut self, id: &str) {
        let style = self.styles.get(id);
        self.scene.set_actor_style(id, &style);
    }

    /// Shows or hides structure `id`. Returns true if the stored value changed.
    pub fn set_visible(&mut self, id: &str, visible: bool) -> Result<bool> {
        self.require(id)?;
        let changed = self.styles.set_visible(id, visible);
        self.sync_actor(id);
        Ok(changed)
    }

    /// Sets the opacity of structure `id`, clamped to `[0, 1]`.
    pub fn set_opacity(&mut self, id: &str, opacity: f32) -> Result<bool> {
        self.require(id)?;
        let changed = self.styles.set_opacity(id, opacity);
        self.sync_actor(id);
        Ok(changed)
    }

    /// Sets the color of structure `id`.
    pub fn set_color(&mut self, id: &str, color: Vec3) -> Result<bool> {
        self.require(id)?;
        let changed = self.styles.set_color(id, color);
        self.sync_actor(id);
        Ok(changed)
    }

    /// Applies a style event from a per-structure control.
    pub fn apply(&mut self, event: StyleEvent<'_>) -> Result<bool> {
        match event {
            StyleEvent::Visible { id, visible } => self.set_visible(id, visible),
            StyleEvent::Opacity { id, opacity } => self.set_opacity(id, opacity),
            StyleEvent::Color { id, color } => self.set_color(id, color),
        }
    }

    /// Asks `picker` for a new color for `id` and applies it.
    ///
    /// Returns the picked color, or `None` if the picker was cancelled.
    pub fn pick_color(&mut self, id: &str, picker: &mut dyn ColorPicker) -> Result<Option<Vec3>> {
        self.require(id)?;
        let current = self.styles.get(id).color;
        let Some(color) = picker.pick_color(id, current) else {
            return Ok(None);
        };
        self.set_color(id, color)?;
        Ok(Some(self.styles.get(id).color))
    }

    /// Returns the current style of `id`.
    pub fn style(&self, id: &str) -> Option<Style> {
        self.contains(id).then(|| self.styles.get(id))
    }

    /// Composites the slice view for `orientation` at its current index.
    pub fn composite(&self, orientation: Orientation) -> Result<SliceImage> {
        self.views[slot(orientation)].composite(
            &self.scan,
            &self.structures,
            &self.styles,
            &self.options,
        )
    }

    /// Composites slice `index` along `orientation` without moving the view.
    pub fn composite_at(&self, orientation: Orientation, index: u32) -> Result<SliceImage> {
        self.views[slot(orientation)].composite_at(
            index,
            &self.scan,
            &self.structures,
            &self.styles,
            &self.options,
        )
    }

    /// Composites all three views at their current indices.
    pub fn composite_all(&self) -> Result<Vec<SliceImage>> {
        Orientation::ALL
            .iter()
            .map(|&o| self.composite(o))
            .collect()
    }

    /// Moves the view for `orientation` to `index`, clamped. Returns the applied index.
    pub fn set_slice_index(&mut self, orientation: Orientation, index: u32) -> u32 {
        self.views[slot(orientation)].set_index(index)
    }

    /// Returns the current index of the view for `orientation`.
    pub fn slice_index(&self, orientation: Orientation) -> u32 {
        self.views[slot(orientation)].index()
    }

    /// Returns the last valid index along `orientation`.
    pub fn max_slice_index(&self, orientation: Orientation) -> u32 {
        self.views[slot(orientation)].max_index()
    }

    /// Returns which view is on screen.
    pub fn view_state(&self) -> ViewState {
        self.view_state
    }

    /// Switches the on-screen view.
    pub fn set_view_state(&mut self, state: ViewState) {
        if self.view_state != state {
            log::debug!("view state {:?} -> {state:?}", self.view_state);
            self.view_state = state;
        }
    }

    /// Attaches a render surface; existing actors are added to it.
    pub fn attach_surface(&mut self, surface: Box<dyn RenderSurface>) {
        let structures = &self.structures;
        self.scene.set_surface(surface, |id| {
            structures
                .iter()
                .find(|s| s.id() == id)
                .and_then(Structure::mesh)
        });
    }

    /// Returns true if a structure with `id` is loaded.
    pub fn contains(&self, id: &str) -> bool {
        self.structures.iter().any(|s| s.id() == id)
    }

    /// Returns the structure with `id`.
    pub fn structure(&self, id: &str) -> Option<&Structure> {
        self.structures.iter().find(|s| s.id() == id)
    }

    /// Returns all structures in load order.
    pub fn structures(&self) -> &[Structure] {
        &self.structures
    }

    /// Returns the scan volume.
    pub fn scan(&self) -> &VolumeGrid {
        &self.scan
    }

    /// Returns the style registry.
    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    /// Returns the 3D scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Returns the session options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Returns the problems recorded while loading structures.
    pub fn warnings(&self) -> &[SessionWarning] {
        &self.warnings
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.scene.clear();
        log::info!("session closed ({} structures)", self.structures.len());
    }
}
