//! Integration tests for sessions built from in-memory volumes.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;
use segview::*;

const DIMS: UVec3 = UVec3::new(64, 64, 40);

fn scan() -> VolumeGrid {
    VolumeGrid::from_fn(DIMS, Vec3::new(0.8, 0.8, 2.5), Vec3::ZERO, |x, y, z| {
        ((x * 7 + y * 3 + z) % 50) as f32
    })
    .unwrap()
}

fn block(lo: UVec3, hi: UVec3) -> VolumeGrid {
    VolumeGrid::from_fn(DIMS, Vec3::new(0.8, 0.8, 2.5), Vec3::ZERO, |x, y, z| {
        let p = UVec3::new(x, y, z);
        if p.cmpge(lo).all() && p.cmplt(hi).all() {
            1.0
        } else {
            0.0
        }
    })
    .unwrap()
}

fn abdomen() -> Session {
    let mut session = Session::new(scan(), Options::default());
    session
        .load_structure("liver", block(UVec3::new(10, 10, 10), UVec3::new(40, 40, 30)))
        .unwrap();
    session
        .load_structure("spleen", block(UVec3::new(30, 30, 15), UVec3::new(50, 50, 25)))
        .unwrap();
    session
}

#[derive(Default, Clone)]
struct StyleLog(Rc<RefCell<Vec<(String, Style)>>>);

impl RenderSurface for StyleLog {
    fn add_mesh(&mut self, id: &str, _mesh: &SurfaceMesh, style: &Style) {
        self.0.borrow_mut().push((id.to_string(), *style));
    }
    fn update_style(&mut self, id: &str, style: &Style) {
        self.0.borrow_mut().push((id.to_string(), *style));
    }
    fn remove(&mut self, _id: &str) {}
    fn clear(&mut self) {}
}

#[test]
fn test_slice_dimensions() {
    let session = abdomen();
    let axial = session.composite_at(Orientation::Axial, 20).unwrap();
    assert_eq!((axial.height(), axial.width()), (64, 64));
    let sagittal = session.composite_at(Orientation::Sagittal, 30).unwrap();
    assert_eq!((sagittal.height(), sagittal.width()), (40, 64));
    assert!(matches!(
        session.composite_at(Orientation::Axial, 40),
        Err(SegviewError::SliceOutOfRange { .. })
    ));
}

#[test]
fn test_empty_mask_keeps_session_alive() {
    let mut session = Session::new(scan(), Options::default());
    session.load_structure("kidney", VolumeGrid::zeros(DIMS)).unwrap();
    session
        .load_structure("liver", block(UVec3::new(10, 10, 10), UVec3::new(40, 40, 30)))
        .unwrap();

    assert_eq!(session.warnings().len(), 1);
    let warning = &session.warnings()[0];
    assert_eq!(warning.structure(), "kidney");
    assert!(matches!(
        warning,
        SessionWarning::Extraction {
            failure: ExtractionFailure::Empty { .. },
            ..
        }
    ));

    // No actor, but the style entry survives.
    assert!(session.scene().actor("kidney").is_none());
    assert!(session.scene().actor("liver").is_some());
    assert!(session.style("kidney").is_some());

    let before = session.composite_at(Orientation::Axial, 5).unwrap();
    assert!(!before.has_overlay());
    assert_eq!(before.base(), session.scan().plane(Orientation::Axial, 5).unwrap().values());
}

#[test]
fn test_overlap_takes_max_alpha() {
    let mut session = abdomen();
    session.set_opacity("liver", 0.3).unwrap();
    session.set_opacity("spleen", 0.8).unwrap();
    let spleen_color = session.style("spleen").unwrap().color;

    let slice = session.composite_at(Orientation::Axial, 20).unwrap();
    let [r, g, b, a] = slice.overlay_at(35, 35).unwrap();
    assert_eq!(a, 0.8);
    assert_eq!(Vec3::new(r, g, b), spleen_color);
    assert_eq!(slice.alpha_at(15, 15), Some(0.3));
    assert_eq!(slice.alpha_at(0, 0), Some(0.0));

    // Order of loading does not matter for the alpha.
    session.set_opacity("liver", 0.8).unwrap();
    session.set_opacity("spleen", 0.3).unwrap();
    let swapped = session.composite_at(Orientation::Axial, 20).unwrap();
    assert_eq!(swapped.alpha_at(35, 35), Some(0.8));
}

#[test]
fn test_hide_and_restore() {
    let mut session = abdomen();
    let before = session.composite_all().unwrap();

    session.set_visible("liver", false).unwrap();
    assert!(!session.scene().actor("liver").unwrap().is_visible());
    let hidden = session.composite_at(Orientation::Axial, 12).unwrap();
    assert!(!hidden.has_overlay());

    session.set_visible("liver", true).unwrap();
    assert!(session.scene().actor("liver").unwrap().is_visible());
    assert_eq!(session.composite_all().unwrap(), before);
}

#[test]
fn test_opacity_toggle_has_no_intermediate_state() {
    let mut session = abdomen();
    session.set_slice_index(Orientation::Axial, 12);

    session.set_opacity("liver", 0.0).unwrap();
    let off = session.composite(Orientation::Axial).unwrap();
    assert_eq!(off.alpha_at(15, 15), Some(0.0));
    assert_eq!(session.scene().actor("liver").unwrap().opacity(), 0.0);

    session.set_opacity("liver", 1.0).unwrap();
    let on = session.composite(Orientation::Axial).unwrap();
    assert_eq!(on.alpha_at(15, 15), Some(1.0));
    assert_eq!(session.scene().actor("liver").unwrap().opacity(), 1.0);
}

#[test]
fn test_style_change_reaches_every_view() {
    let mut session = abdomen();
    let log = StyleLog::default();
    session.attach_surface(Box::new(log.clone()));
    assert_eq!(log.0.borrow().len(), 2);

    let teal = Vec3::new(0.0, 0.5, 0.5);
    session.set_color("liver", teal).unwrap();

    // The render surface saw the exact registry value.
    let (id, style) = log.0.borrow().last().cloned().unwrap();
    assert_eq!(id, "liver");
    assert_eq!(style, session.styles().get("liver"));

    // All three slice views at their current index use the new color.
    for orientation in Orientation::ALL {
        let slice = session.composite(orientation).unwrap();
        let liver_px = slice
            .overlay()
            .iter()
            .find(|px| px[3] > 0.0 && Vec3::new(px[0], px[1], px[2]) == teal);
        assert!(liver_px.is_some(), "{orientation} view missed the new color");
    }
}

#[test]
fn test_repeated_style_writes_still_sync() {
    let mut session = abdomen();
    let log = StyleLog::default();
    session.attach_surface(Box::new(log.clone()));

    assert!(session.set_opacity("spleen", 0.4).unwrap());
    assert!(!session.set_opacity("spleen", 0.4).unwrap());
    // Sync is unconditional: both writes reached the surface.
    assert_eq!(log.0.borrow().len(), 4);
}

#[test]
fn test_presets_apply_case_insensitively() {
    let options = Options::from_json_str(
        r#"{ "presets": [ { "name": "Liver", "color": [1.0, 0.0, 0.0], "opacity": 0.45 } ] }"#,
    )
    .unwrap();
    let mut session = Session::new(scan(), options);
    session
        .load_structure("liver", block(UVec3::new(10, 10, 10), UVec3::new(40, 40, 30)))
        .unwrap();

    let style = session.style("liver").unwrap();
    assert_eq!(style.color, Vec3::new(1.0, 0.0, 0.0));
    assert_eq!(style.opacity, 0.45);
    assert_eq!(session.scene().actor("liver").unwrap().style(), style);
}

#[test]
fn test_scene_bounds_cover_structures() {
    let session = abdomen();
    let (min, max) = session.scene().bounds().unwrap();
    let (liver_min, liver_max) = session.structure("liver").unwrap().bounding_box().unwrap();
    let (spleen_min, spleen_max) = session.structure("spleen").unwrap().bounding_box().unwrap();
    assert_eq!(min, liver_min.min(spleen_min));
    assert_eq!(max, liver_max.max(spleen_max));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn setting_a_style_twice_equals_once(opacity in -1.0_f32..2.0, visible in any::<bool>()) {
        let mut once = Session::new(VolumeGrid::zeros(UVec3::new(8, 8, 4)), Options::default());
        let mask = VolumeGrid::from_fn(UVec3::new(8, 8, 4), Vec3::ONE, Vec3::ZERO, |x, _, _| {
            if x < 4 { 1.0 } else { 0.0 }
        })
        .unwrap();
        once.load_structure("liver", mask.clone()).unwrap();
        let mut twice = Session::new(VolumeGrid::zeros(UVec3::new(8, 8, 4)), Options::default());
        twice.load_structure("liver", mask).unwrap();

        once.set_opacity("liver", opacity).unwrap();
        once.set_visible("liver", visible).unwrap();
        for _ in 0..2 {
            twice.set_opacity("liver", opacity).unwrap();
            twice.set_visible("liver", visible).unwrap();
        }

        prop_assert_eq!(once.style("liver"), twice.style("liver"));
        prop_assert_eq!(
            once.scene().actor("liver").map(Actor::style),
            twice.scene().actor("liver").map(Actor::style)
        );
        prop_assert_eq!(
            once.composite(Orientation::Axial).unwrap(),
            twice.composite(Orientation::Axial).unwrap()
        );
    }
}
