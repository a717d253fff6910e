//! Segmented structures: one labeled mask and its surface.

use std::cell::OnceCell;

use glam::Vec3;
use segview_core::{ExtractionFailure, IsosurfaceExtractor, SurfaceMesh, VolumeGrid};

/// One anatomical structure of a segmentation, such as "liver".
///
/// The structure owns its mask and the surface extracted from it. The surface
/// is computed on first request and never recomputed, since masks are
/// immutable. Styles are not stored here; they are looked up by id in the
/// session's [`segview_core::StyleRegistry`].
#[derive(Debug)]
pub struct Structure {
    id: String,
    mask: VolumeGrid,
    surface: OnceCell<Result<SurfaceMesh, ExtractionFailure>>,
}

impl Structure {
    /// Creates a structure from its id and mask volume.
    pub fn new(id: impl Into<String>, mask: VolumeGrid) -> Self {
        Self {
            id: id.into(),
            mask,
            surface: OnceCell::new(),
        }
    }

    /// Returns the unique id of this structure.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the mask volume.
    #[must_use]
    pub fn mask(&self) -> &VolumeGrid {
        &self.mask
    }

    /// Returns the surface, extracting it with `extractor` on first call.
    ///
    /// Later calls return the cached result whatever extractor they pass.
    pub fn surface(
        &self,
        extractor: &IsosurfaceExtractor,
    ) -> Result<&SurfaceMesh, &ExtractionFailure> {
        self.surface
            .get_or_init(|| {
                let result = extractor.extract(&self.mask);
                if let Err(failure) = &result {
                    log::warn!("no surface for structure '{}': {failure}", self.id);
                }
                result
            })
            .as_ref()
    }

    /// Returns the surface if it has been extracted successfully.
    #[must_use]
    pub fn mesh(&self) -> Option<&SurfaceMesh> {
        self.surface.get().and_then(|r| r.as_ref().ok())
    }

    /// Returns the extraction failure, if extraction has run and failed.
    #[must_use]
    pub fn extraction_failure(&self) -> Option<&ExtractionFailure> {
        self.surface.get().and_then(|r| r.as_ref().err())
    }

    /// Returns true once extraction has run, successfully or not.
    #[must_use]
    pub fn is_extracted(&self) -> bool {
        self.surface.get().is_some()
    }

    /// Returns the bounding box of the surface, if there is one.
    #[must_use]
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        self.mesh().and_then(SurfaceMesh::bounding_box)
    }
}
