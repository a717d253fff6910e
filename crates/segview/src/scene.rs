//! The 3D side of a session: one actor per structure surface.

use glam::Vec3;
use segview_core::{Result, SegviewError, Style, SurfaceMesh};

/// Receives geometry and style updates for display.
///
/// This is the only seam between the scene and a renderer; the scene makes no
/// assumption about windows or GPU APIs.
pub trait RenderSurface {
    /// Adds a mesh for `id` drawn with `style`.
    fn add_mesh(&mut self, id: &str, mesh: &SurfaceMesh, style: &Style);

    /// Replaces the style of the mesh for `id`.
    fn update_style(&mut self, id: &str, style: &Style);

    /// Removes the mesh for `id`.
    fn remove(&mut self, id: &str);

    /// Removes every mesh.
    fn clear(&mut self);

    /// Asks for the view to be redrawn.
    fn request_redraw(&mut self) {}
}

/// A structure surface in the scene with the style it is currently drawn with.
#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    id: String,
    style: Style,
    bounds: Option<(Vec3, Vec3)>,
}

impl Actor {
    /// Returns the structure id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the style the actor is drawn with.
    pub fn style(&self) -> Style {
        self.style
    }

    /// Returns whether the actor is drawn.
    pub fn is_visible(&self) -> bool {
        self.style.visible
    }

    /// Returns the actor opacity.
    pub fn opacity(&self) -> f32 {
        self.style.opacity
    }

    /// Returns the actor color.
    pub fn color(&self) -> Vec3 {
        self.style.color
    }

    /// Returns the world-space bounding box of the actor's mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        self.bounds
    }
}

/// The set of actors, in load order, and the surface they are drawn on.
#[derive(Default)]
pub struct Scene {
    actors: Vec<Actor>,
    surface: Option<Box<dyn RenderSurface>>,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("actors", &self.actors)
            .field("has_surface", &self.surface.is_some())
            .finish()
    }
}

impl Scene {
    /// Creates an empty scene with no render surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty scene drawing on `surface`.
    pub fn with_surface(surface: Box<dyn RenderSurface>) -> Self {
        Self {
            actors: Vec::new(),
            surface: Some(surface),
        }
    }

    /// Replaces the render surface. Existing actors are added to the new one.
    ///
    /// `meshes` resolves an actor id to its geometry.
    pub fn set_surface<'a>(
        &mut self,
        mut surface: Box<dyn RenderSurface>,
        meshes: impl Fn(&str) -> Option<&'a SurfaceMesh>,
    ) {
        if let Some(old) = self.surface.as_mut() {
            old.clear();
        }
        for actor in &self.actors {
            if let Some(mesh) = meshes(&actor.id) {
                surface.add_mesh(&actor.id, mesh, &actor.style);
            }
        }
        surface.request_redraw();
        self.surface = Some(surface);
    }

    /// Adds an actor for `id` showing `mesh` with `style`.
    pub fn add_actor(&mut self, id: &str, mesh: &SurfaceMesh, style: &Style) -> Result<()> {
        if self.contains(id) {
            return Err(SegviewError::StructureExists(id.to_string()));
        }
        self.actors.push(Actor {
            id: id.to_string(),
            style: *style,
            bounds: mesh.bounding_box(),
        });
        if let Some(surface) = self.surface.as_mut() {
            surface.add_mesh(id, mesh, style);
            surface.request_redraw();
        }
        Ok(())
    }

    /// Sets the actor for `id` to exactly `style`.
    ///
    /// The surface is updated even when the style is unchanged. Returns false
    /// if there is no actor for `id`.
    pub fn set_actor_style(&mut self, id: &str, style: &Style) -> bool {
        let Some(actor) = self.actors.iter_mut().find(|a| a.id == id) else {
            return false;
        };
        actor.style = *style;
        if let Some(surface) = self.surface.as_mut() {
            surface.update_style(id, style);
            surface.request_redraw();
        }
        true
    }

    /// Returns the actor for `id`.
    pub fn actor(&self, id: &str) -> Option<&Actor> {
        self.actors.iter().find(|a| a.id == id)
    }

    /// Returns true if there is an actor for `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.actor(id).is_some()
    }

    /// Returns all actors in load order.
    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    /// Returns the number of actors.
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Returns true if the scene has no actors.
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Removes the actor for `id`. Returns false if there was none.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.actors.len();
        self.actors.retain(|a| a.id != id);
        let removed = self.actors.len() != before;
        if removed {
            if let Some(surface) = self.surface.as_mut() {
                surface.remove(id);
                surface.request_redraw();
            }
        }
        removed
    }

    /// Removes every actor.
    pub fn clear(&mut self) {
        self.actors.clear();
        if let Some(surface) = self.surface.as_mut() {
            surface.clear();
            surface.request_redraw();
        }
    }

    /// Returns the bounding box of all visible actors.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        self.actors
            .iter()
            .filter(|a| a.style.visible)
            .filter_map(|a| a.bounds)
            .reduce(|(min_a, max_a), (min_b, max_b)| (min_a.min(min_b), max_a.max(max_b)))
    }
}
