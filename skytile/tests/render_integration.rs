//! Integration tests for full tile rendering.
//!
//! These tests drive `render_tile` end to end:
//! - request validation before rendering
//! - layer resilience (unknown and failing layers)
//! - catalog memoization in the on-disk cache across renders
//! - tiles spanning the 0h seam
//! - every output mode
//!
//! Run with: `cargo test --test render_integration`

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use skytile::cache::TileCache;
use skytile::output::{OutputMode, OutputSelection};
use skytile::render::Star;
use skytile::request::{Bounds, RequestError, TileRequest, TileRequestBuilder};
use skytile::TileError;

// ============================================================================
// Helper Functions
// ============================================================================

/// The reference tile: RA 10°..11°, Dec 0°..1°.
fn reference_bounds() -> Bounds {
    Bounds::Celestial {
        ra_min: 10.0,
        ra_max: 11.0,
        dec_min: 0.0,
        dec_max: 1.0,
    }
}

fn builder(size: u32, layers: &[&str]) -> TileRequestBuilder {
    TileRequest::builder()
        .bounds(reference_bounds())
        .size(size, size)
        .layers(layers.iter().copied())
}

fn render(request: &TileRequest) -> Vec<u8> {
    let mut out = Vec::new();
    skytile::render_tile(request, &mut out).expect("render should succeed");
    out
}

fn decode_png(bytes: &[u8]) -> image::RgbaImage {
    image::load_from_memory(bytes)
        .expect("valid PNG")
        .to_rgba8()
}

fn write_catalog(dir: &Path, text: &str) -> PathBuf {
    let path = dir.join("stars.txt");
    std::fs::write(&path, text).unwrap();
    path
}

/// Names of the files in one cache domain.
fn cache_entries(root: &Path, domain: &str) -> Vec<String> {
    match std::fs::read_dir(root.join(domain)) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect(),
        Err(_) => Vec::new(),
    }
}

// ============================================================================
// Reference Scenario
// ============================================================================

#[test]
fn test_reference_tile_png() {
    let request = builder(256, &["solid", "grid"]).build().unwrap();
    assert_eq!(request.geometry().zoom_level(), 8);

    let img = decode_png(&render(&request));
    assert_eq!(img.dimensions(), (256, 256));
    // The solid layer leaves no transparent pixel
    assert!(img.pixels().all(|p| p.0[3] == 255));
    // Grid line at RA 10.2° (x = 204.8) is brighter than the background
    assert!(img.get_pixel(204, 128).0[0] > 0);
    assert_eq!(img.get_pixel(230, 128).0, [0, 0, 0, 255]);
}

#[test]
fn test_mercator_bounds_match_celestial() {
    let celestial = builder(64, &["solid", "grid"]).build().unwrap();
    let (x_min, x_max) = celestial.geometry().merc_x_range();
    let (y_min, y_max) = celestial.geometry().merc_y_range();

    let mercator = TileRequest::builder()
        .bounds(Bounds::Mercator {
            x_min,
            x_max,
            y_min,
            y_max,
        })
        .size(64, 64)
        .layers(["solid", "grid"])
        .build()
        .unwrap();

    assert_eq!(
        celestial.geometry().zoom_level(),
        mercator.geometry().zoom_level()
    );
    assert!((mercator.geometry().ra_min() - 10.0).abs() < 1e-9);
    assert!((mercator.geometry().dec_max() - 1.0).abs() < 1e-9);
}

// ============================================================================
// Request Validation
// ============================================================================

#[test]
fn test_conflicting_outputs_rejected_before_rendering() {
    let err = builder(64, &["solid"])
        .output_selection(OutputSelection {
            jpeg: true,
            pdf: true,
            raw: false,
        })
        .build()
        .unwrap_err();
    assert!(matches!(err, RequestError::ConflictingOutputs(_)));
    assert!(TileError::from(err).is_config());
}

#[test]
fn test_oversized_and_degenerate_tiles_rejected() {
    assert!(builder(4097, &["solid"]).build().is_err());

    let inverted = TileRequest::builder()
        .bounds(Bounds::Celestial {
            ra_min: 11.0,
            ra_max: 10.0,
            dec_min: 0.0,
            dec_max: 1.0,
        })
        .size(64, 64)
        .build();
    assert!(matches!(inverted, Err(RequestError::Geometry(_))));
}

// ============================================================================
// Layer Resilience
// ============================================================================

#[test]
fn test_unknown_layer_is_ignored() {
    let known = render(&builder(64, &["solid", "grid"]).build().unwrap());
    let mixed = render(
        &builder(64, &["solid", "definitely-not-a-layer", "grid"])
            .build()
            .unwrap(),
    );
    assert_eq!(known, mixed);
}

#[test]
fn test_failing_layer_is_ignored() {
    let known = render(&builder(64, &["solid"]).build().unwrap());
    // Malformed colour and a catalog with no file: both layers fail
    let mixed = render(
        &builder(64, &["solid", "grid", "catalog"])
            .arg("grid_color 1 1")
            .build()
            .unwrap(),
    );
    assert_eq!(known, mixed);
}

#[test]
fn test_non_finite_draw_input_skips_layer_only() {
    let known = render(&builder(64, &["solid", "grid"]).build().unwrap());
    let mixed = render(
        &builder(64, &["solid", "draw", "points", "grid"])
            .arg("draw moveto nan 0.5")
            .arg("draw lineto 1e308 0.5")
            .arg("draw stroke")
            .arg("point inf 0.5")
            .build()
            .unwrap(),
    );
    assert_eq!(known, mixed);
}

// ============================================================================
// Cache Memoization
// ============================================================================

#[test]
fn test_catalog_memoized_across_renders() {
    let data = TempDir::new().unwrap();
    let cache_root = TempDir::new().unwrap();
    let catalog = write_catalog(data.path(), "# bright star in the tile\n10.5 0.5 1.0\n");

    let request = builder(64, &["solid", "brightstars"])
        .arg(format!("catalog_file {}", catalog.display()))
        .cache_dir(cache_root.path())
        .build()
        .unwrap();

    let first = render(&request);
    let entries = cache_entries(cache_root.path(), "catalog");
    assert_eq!(entries.len(), 1);
    assert!(entries[0].starts_with("stars.txt-"));

    let second = render(&request);
    assert_eq!(first, second);
    assert_eq!(cache_entries(cache_root.path(), "catalog"), entries);

    // Plant a different catalog under the same key: the next render must use it
    let planted = vec![Star {
        ra: 10.25,
        dec: 0.75,
        mag: 1.0,
    }];
    TileCache::new(cache_root.path())
        .save("catalog", &entries[0], &bincode::serialize(&planted).unwrap())
        .unwrap();
    let third = decode_png(&render(&request));

    let (x, y) = request.geometry().celestial_to_pixel(10.25, 0.75);
    assert!(third.get_pixel(x as u32, y as u32).0[0] > 0);
    let (x, y) = request.geometry().celestial_to_pixel(10.5, 0.5);
    assert_eq!(third.get_pixel(x as u32, y as u32).0, [0, 0, 0, 255]);
}

#[test]
fn test_corrupt_cache_entry_falls_back_to_source() {
    let data = TempDir::new().unwrap();
    let cache_root = TempDir::new().unwrap();
    let catalog = write_catalog(data.path(), "10.5 0.5 1.0\n");

    let request = builder(64, &["solid", "brightstars"])
        .arg(format!("catalog_file {}", catalog.display()))
        .cache_dir(cache_root.path())
        .build()
        .unwrap();
    let clean = render(&request);

    let entry = cache_root
        .path()
        .join("catalog")
        .join(&cache_entries(cache_root.path(), "catalog")[0]);
    std::fs::write(&entry, [1, 0, 0]).unwrap();

    assert_eq!(render(&request), clean);
}

#[test]
fn test_unwritable_cache_does_not_fail_render() {
    let data = TempDir::new().unwrap();
    let catalog = write_catalog(data.path(), "10.5 0.5 1.0\n");
    // A regular file where the cache root should be
    let bogus_root = data.path().join("not-a-directory");
    std::fs::write(&bogus_root, b"").unwrap();

    let uncached = render(
        &builder(64, &["solid", "brightstars"])
            .arg(format!("catalog_file {}", catalog.display()))
            .build()
            .unwrap(),
    );
    let cached = render(
        &builder(64, &["solid", "brightstars"])
            .arg(format!("catalog_file {}", catalog.display()))
            .cache_dir(&bogus_root)
            .build()
            .unwrap(),
    );
    assert_eq!(uncached, cached);
}

// ============================================================================
// Wraparound
// ============================================================================

#[test]
fn test_seam_tile_draws_geodesic_and_stars() {
    let data = TempDir::new().unwrap();
    let catalog = write_catalog(data.path(), "359.5 0.5 1.0\n");

    let request = TileRequest::builder()
        .bounds(Bounds::Celestial {
            ra_min: -2.0,
            ra_max: 2.0,
            dec_min: -1.0,
            dec_max: 1.0,
        })
        .size(128, 128)
        .layers(["draw", "brightstars"])
        .arg("draw linewidth 3")
        .arg("draw geodesic 358 0 2 0 16")
        .arg("draw stroke")
        .arg(format!("catalog_file {}", catalog.display()))
        .build()
        .unwrap();
    assert!(request.geometry().straddles_zero());

    let img = decode_png(&render(&request));

    // The arc crosses the whole tile along the equator without a gap
    for x in [2, 32, 64, 96, 125] {
        assert!(img.get_pixel(x, 64).0[3] > 0, "gap at x = {}", x);
    }
    // Away from the equator nothing is drawn
    assert_eq!(img.get_pixel(64, 10).0[3], 0);

    // RA 359.5° is RA -0.5°, drawn one turn over from the catalog position
    let (x, y) = request.geometry().celestial_to_pixel_f(-0.5, 0.5);
    assert!((x - 80.0).abs() < 1e-6);
    assert!((y - 48.0).abs() < 0.1);
    assert!(img.get_pixel(80, 48).0[3] > 0);
    assert_eq!(img.get_pixel(48, 48).0[3], 0);
}

// ============================================================================
// Output Modes
// ============================================================================

#[test]
fn test_jpeg_output() {
    let bytes = render(
        &builder(64, &["solid", "grid"])
            .output(OutputMode::Jpeg)
            .build()
            .unwrap(),
    );
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    let img = image::load_from_memory(&bytes).unwrap();
    assert_eq!((img.width(), img.height()), (64, 64));
}

#[test]
fn test_pdf_output() {
    let bytes = render(
        &builder(64, &["solid", "grid", "points"])
            .arg("point 10.5 0.5")
            .output(OutputMode::Pdf)
            .build()
            .unwrap(),
    );
    assert!(bytes.starts_with(b"%PDF-"));
}

#[test]
fn test_raw_output_accumulates_flux() {
    let data = TempDir::new().unwrap();
    let catalog = write_catalog(data.path(), "10.5 0.5 0.0\n");

    let request = builder(16, &["solid", "grid", "catalog"])
        .arg(format!("catalog_file {}", catalog.display()))
        .output(OutputMode::RawFloat)
        .build()
        .unwrap();
    let bytes = render(&request);
    assert_eq!(bytes.len(), 16 * 16 * 3 * 4);

    let floats: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let (x, y) = request.geometry().celestial_to_pixel(10.5, 0.5);
    let i = (y as usize * 16 + x as usize) * 3;
    // A magnitude-zero white star contributes exactly 1.0 per channel
    assert_eq!(&floats[i..i + 3], &[1.0, 1.0, 1.0]);
    assert_eq!(floats.iter().sum::<f32>(), 3.0);
}
