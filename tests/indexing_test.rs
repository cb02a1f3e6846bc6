//! Integration tests: render synthetic Kikuchi patterns for known
//! orientations and verify the full pipeline — Hough transform, peak
//! detection, band geometry, triplet matching, voting — recovers the
//! orientation.

use kikuchi::solver::vote::{are_orientations_equivalent, trace_tolerance};
use kikuchi::{
    AtomBasis, DetectorGeometry, EulerAngles, HoughConfig, IndexConfig, IndexStatus, Lattice,
    PhaseConfig, PhaseDatabase, Quaternion, ScatteringTable, Vector3,
};

const WIDTH: u32 = 200;
const HEIGHT: u32 = 200;
const DETECTOR_DISTANCE: f64 = 0.3;

fn bcc_iron() -> PhaseDatabase {
    let lattice = Lattice::cubic(2.87).unwrap();
    let basis = AtomBasis::body_centered(26);
    let config = PhaseConfig {
        max_indice: 2,
        ..Default::default()
    };
    PhaseDatabase::build(lattice, &basis, &ScatteringTable::default(), &config).unwrap()
}

/// (θ, ρ) of the band a plane with sample-frame normal `n` casts on the
/// detector, in the same convention as the Hough accumulator. `None` when
/// the band is badly placed (accumulator edge or outside the frame).
fn band_line(n: &Vector3) -> Option<(f64, f64)> {
    let spread = n.x.hypot(n.z);
    if spread < 1e-9 {
        return None;
    }
    let mut cos = n.x / spread;
    let mut sin = -n.z / spread;
    let mut rho = -n.y * DETECTOR_DISTANCE * WIDTH as f64 / spread;
    if sin < 0.0 {
        cos = -cos;
        sin = -sin;
        rho = -rho;
    }
    let mut theta = sin.atan2(cos);
    if theta < 0.0 {
        theta += std::f64::consts::PI;
    }
    let theta_deg = theta.to_degrees();
    if !(8.0..=172.0).contains(&theta_deg) || rho.abs() > 0.42 * WIDTH as f64 {
        return None;
    }
    Some((theta, rho))
}

/// Render the bands a grain with orientation `g` casts for the given
/// planes: bright 3 px bands on a dark background.
fn render_pattern(db: &PhaseDatabase, g: &Quaternion, planes: &[(i32, i32, i32)]) -> (Vec<f32>, usize) {
    let lines: Vec<(f64, f64)> = planes
        .iter()
        .filter_map(|&(h, k, l)| {
            let u = db
                .lattice
                .plane_normal(&kikuchi::Plane::new(h, k, l))
                .normalize();
            let n = g.conjugate().rotate_vector(u);
            band_line(&n)
        })
        .collect();

    let (w, h) = (WIDTH as usize, HEIGHT as usize);
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    let mut pixels = vec![10.0f32; w * h];
    for row in 0..h {
        let y = row as f64 + 0.5 - cy;
        for col in 0..w {
            let x = col as f64 + 0.5 - cx;
            let on_band = lines
                .iter()
                .any(|&(theta, rho)| (x * theta.cos() + y * theta.sin() - rho).abs() < 1.5);
            if on_band {
                pixels[row * w + col] = 250.0;
            }
        }
    }
    (pixels, lines.len())
}

fn hough_config() -> HoughConfig {
    HoughConfig {
        sigma_threshold: 6.0,
        min_peak_area: 3,
        max_peaks: Some(8),
        ..Default::default()
    }
}

#[test]
fn test_full_pipeline_recovers_orientation() {
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();

    let db = bcc_iron();
    let g = EulerAngles::from_degrees(15.0, 25.0, 35.0).to_quaternion();
    let planes = [
        (1, 0, 1),
        (1, 1, 0),
        (0, 1, 1),
        (1, -1, 0),
        (1, 0, -1),
        (0, 1, -1),
        (2, 0, 0),
        (0, 2, 0),
        (0, 0, 2),
    ];
    let (pixels, num_lines) = render_pattern(&db, &g, &planes);
    assert!(num_lines >= 5, "only {num_lines} bands rendered");

    let result = db.index_from_raw(
        &pixels,
        WIDTH,
        HEIGHT,
        None,
        &hough_config(),
        &DetectorGeometry::new((0.0, 0.0), DETECTOR_DISTANCE),
        &IndexConfig::default(),
    );

    assert_eq!(result.status, IndexStatus::OrientationFound);
    assert!(result.num_bands >= 4, "only {} bands usable", result.num_bands);

    let best = result.best().unwrap();
    assert!(best.votes >= 3, "only {} votes", best.votes);
    assert!(
        are_orientations_equivalent(
            &best.orientation,
            &g,
            trace_tolerance(2.0_f64.to_radians()),
            &db.symmetry,
        ),
        "recovered {:?} (Euler {:?}), expected {:?} (Euler {:?})",
        best.orientation,
        best.euler_angles().to_degrees(),
        g,
        g.to_euler_angles().to_degrees(),
    );
}

#[test]
fn test_more_bands_never_decrease_support() {
    let db = bcc_iron();
    let g = EulerAngles::from_degrees(15.0, 25.0, 35.0).to_quaternion();
    let few = [(1, 0, 1), (0, 1, 1), (1, 0, -1), (0, 1, -1)];
    let more = [
        (1, 0, 1),
        (0, 1, 1),
        (1, 0, -1),
        (0, 1, -1),
        (2, 0, 0),
        (0, 2, 0),
        (0, 0, 2),
    ];

    let geometry = DetectorGeometry::new((0.0, 0.0), DETECTOR_DISTANCE);
    let config = IndexConfig::default();

    let (pixels_few, _) = render_pattern(&db, &g, &few);
    let (pixels_more, _) = render_pattern(&db, &g, &more);
    let result_few = db.index_from_raw(
        &pixels_few,
        WIDTH,
        HEIGHT,
        None,
        &hough_config(),
        &geometry,
        &config,
    );
    let result_more = db.index_from_raw(
        &pixels_more,
        WIDTH,
        HEIGHT,
        None,
        &hough_config(),
        &geometry,
        &config,
    );

    assert_eq!(result_few.status, IndexStatus::OrientationFound);
    assert_eq!(result_more.status, IndexStatus::OrientationFound);
    assert!(
        result_more.best().unwrap().votes >= result_few.best().unwrap().votes,
        "support dropped from {} to {} votes",
        result_few.best().unwrap().votes,
        result_more.best().unwrap().votes,
    );
}

#[test]
fn test_blank_pattern_is_unindexable() {
    let db = bcc_iron();
    let pixels = vec![100.0f32; (WIDTH * HEIGHT) as usize];
    let result = db.index_from_raw(
        &pixels,
        WIDTH,
        HEIGHT,
        None,
        &hough_config(),
        &DetectorGeometry::new((0.0, 0.0), DETECTOR_DISTANCE),
        &IndexConfig::default(),
    );
    assert_eq!(result.status, IndexStatus::InsufficientBands);
    assert!(result.candidates.is_empty());
}

#[test]
fn test_orthogonal_lines_give_identity_orientation() {
    // A vertical and a horizontal Kikuchi line through the pattern center,
    // assigned to (100) and (001), pin the orientation to the identity.
    use kikuchi::detector::{line_to_normal, peak_to_line};
    use kikuchi::solver::orient::calculate_orientation;

    let geometry = DetectorGeometry::new((0.0, 0.0), 10.0);
    let size = (100u32, 100u32);

    let vertical = peak_to_line(0.0, 0.0, size);
    let horizontal = peak_to_line(0.0, std::f64::consts::FRAC_PI_2, size);
    let n1 = line_to_normal(&vertical, &geometry).unwrap();
    let n2 = line_to_normal(&horizontal, &geometry).unwrap();

    let hkl1 = Vector3::new(1.0, 0.0, 0.0);
    let hkl2 = Vector3::new(0.0, 0.0, 1.0);
    let q = calculate_orientation(&n1, &n2, &hkl1, &hkl2).unwrap();

    let euler = q.to_euler_angles();
    let tau = 2.0 * std::f64::consts::PI;
    assert!(euler.phi1.min(tau - euler.phi1) < 1e-3, "phi1 = {}", euler.phi1);
    assert!(euler.phi.abs() < 1e-3, "phi = {}", euler.phi);
    assert!(euler.phi2.min(tau - euler.phi2) < 1e-3, "phi2 = {}", euler.phi2);
}

#[test]
fn test_database_save_load_round_trip() {
    let db = bcc_iron();
    let path = std::env::temp_dir().join("kikuchi_bcc_iron_test.rkyv");
    let path = path.to_str().unwrap();

    db.save_to_file(path).unwrap();
    let loaded = PhaseDatabase::load_from_file(path).unwrap();
    std::fs::remove_file(path).ok();

    assert_eq!(loaded.catalog.len(), db.catalog.len());
    assert_eq!(loaded.lut.len(), db.lut.len());
    assert_eq!(loaded.symmetry.len(), db.symmetry.len());
    assert_eq!(loaded.props.max_indice, db.props.max_indice);

    // The loaded database must index identically
    let g = EulerAngles::from_degrees(15.0, 25.0, 35.0).to_quaternion();
    let planes = [(1, 0, 1), (0, 1, 1), (1, 0, -1), (0, 1, -1), (0, 0, 2)];
    let (pixels, _) = render_pattern(&db, &g, &planes);
    let geometry = DetectorGeometry::new((0.0, 0.0), DETECTOR_DISTANCE);
    let config = IndexConfig::default();

    let original = db.index_from_raw(
        &pixels,
        WIDTH,
        HEIGHT,
        None,
        &hough_config(),
        &geometry,
        &config,
    );
    let reloaded = loaded.index_from_raw(
        &pixels,
        WIDTH,
        HEIGHT,
        None,
        &hough_config(),
        &geometry,
        &config,
    );

    assert_eq!(original.status, reloaded.status);
    assert_eq!(original.candidates.len(), reloaded.candidates.len());
    if let (Some(a), Some(b)) = (original.best(), reloaded.best()) {
        assert_eq!(a.votes, b.votes);
        assert!(a.orientation.approx_eq(&b.orientation, 1e-9));
    }
}
