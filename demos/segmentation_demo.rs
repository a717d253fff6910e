#![allow(clippy::cast_precision_loss)]
//! Demo of a segmentation review session in segview.
//!
//! Builds a synthetic abdominal scan with three organ masks, writes them as
//! NIfTI files, opens a session over them, restyles the structures and saves
//! the three composited slice views as PNG files. The "kidney" mask is empty,
//! so it shows up as an extraction warning.
//!
//! Run with `RUST_LOG=debug` to see per-structure tracing.

use segview::{
    save_slice, save_volume, Metrics, MetricsProvider, MetricsTable, Options, Orientation,
    OverlayAlpha, Session, StaticStructureSource, UVec3, Vec3, ViewState, VolumeGrid,
};

const DIMS: UVec3 = UVec3::new(96, 96, 48);
const SPACING: Vec3 = Vec3::new(0.8, 0.8, 2.5);

/// A soft-tissue-like scan: a bright ellipse on a dark background.
fn synthetic_scan() -> VolumeGrid {
    let center = DIMS.as_vec3() / 2.0;
    VolumeGrid::from_fn(DIMS, SPACING, Vec3::ZERO, |x, y, z| {
        let p = (Vec3::new(x as f32, y as f32, z as f32) - center) / center;
        let r = (p.x * p.x + p.y * p.y).sqrt();
        if r < 0.9 {
            40.0 + 20.0 * (p.z * 3.0).sin()
        } else {
            -1000.0
        }
    })
    .expect("scan dimensions are valid")
}

/// A binary ellipsoid mask around `center` (voxel units).
fn ellipsoid(center: Vec3, radii: Vec3) -> VolumeGrid {
    VolumeGrid::from_fn(DIMS, SPACING, Vec3::ZERO, |x, y, z| {
        let d = (Vec3::new(x as f32, y as f32, z as f32) - center) / radii;
        if d.length_squared() <= 1.0 {
            1.0
        } else {
            0.0
        }
    })
    .expect("mask dimensions are valid")
}

fn main() -> segview::Result<()> {
    segview::init_logging();

    let dir = std::env::temp_dir().join("segview_demo");
    let masks = dir.join("unet");
    std::fs::create_dir_all(&masks)?;

    let scan_path = dir.join("scan.nii.gz");
    save_volume(&scan_path, &synthetic_scan())?;
    save_volume(
        masks.join("liver.nii.gz"),
        &ellipsoid(Vec3::new(36.0, 44.0, 24.0), Vec3::new(18.0, 14.0, 10.0)),
    )?;
    save_volume(
        masks.join("spleen.nii.gz"),
        &ellipsoid(Vec3::new(62.0, 50.0, 24.0), Vec3::new(8.0, 10.0, 7.0)),
    )?;
    save_volume(masks.join("kidney.nii.gz"), &VolumeGrid::zeros(DIMS))?;

    let mut source = StaticStructureSource::new();
    source.add_directory("abdomen", "unet", &masks)?;

    let options = Options::from_json_str(
        r#"{
            "smooth_iterations": 10,
            "relaxation": 0.3,
            "presets": [ { "name": "Liver", "color": [0.8, 0.3, 0.2] } ]
        }"#,
    )?;
    let no_files = Vec::<(String, std::path::PathBuf)>::new();
    let mut session = Session::open(&scan_path, no_files, options)?;
    let loaded = session.load_from_source(&source, "abdomen", "unet");
    println!("loaded {loaded} structures");
    for warning in session.warnings() {
        println!("warning: {warning}");
    }

    for actor in session.scene().actors() {
        println!(
            "actor {:<8} color {:?} opacity {:.2}",
            actor.id(),
            actor.color(),
            actor.opacity()
        );
    }

    let mut metrics = MetricsTable::new();
    metrics.insert(
        "unet",
        "liver",
        Metrics {
            dice: 0.95,
            iou: 0.90,
            volume_similarity: 0.98,
        },
    );
    if let Some(m) = metrics.metrics("unet", "liver") {
        println!("liver: dice {:.2} iou {:.2} vs {:.2}", m.dice, m.iou, m.volume_similarity);
    }

    session.set_opacity("spleen", 0.6)?;
    let mut picker = |_: &str, _: Vec3| -> Option<Vec3> { Some(Vec3::new(0.3, 0.5, 0.9)) };
    session.pick_color("spleen", &mut picker)?;

    session.set_view_state(ViewState::SliceDetail);
    for orientation in Orientation::ALL {
        session.set_slice_index(orientation, session.max_slice_index(orientation) / 2);
        let slice = session.composite(orientation)?;
        let path = dir.join(format!("{orientation}.png"));
        if let Err(e) = save_slice(&path, &slice, None) {
            eprintln!("could not save {}: {e}", path.display());
            continue;
        }
        println!(
            "{orientation}: {}x{} with {} overlay pixels -> {}",
            slice.width(),
            slice.height(),
            slice.overlay_pixel_count(),
            path.display()
        );
    }

    // Fixed-alpha overlays make low-opacity structures easier to see in slices.
    let fixed = Options {
        overlay_alpha: OverlayAlpha::Fixed(OverlayAlpha::DEFAULT_FIXED),
        ..session.options().clone()
    };
    let mut review = Session::new(session.scan().clone(), fixed);
    review.load_from_source(&source, "abdomen", "unet");
    review.set_opacity("liver", 0.1)?;
    let axial = review.composite(Orientation::Axial)?;
    println!(
        "fixed-alpha axial overlay covers {} pixels",
        axial.overlay_pixel_count()
    );

    Ok(())
}
