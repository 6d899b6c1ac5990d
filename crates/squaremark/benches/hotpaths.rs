use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use squaremark::{
    estimate_orientations, fit_markers, intensity_from_gray, render_markers, segment,
    IntensityImage, Marker, OrientationWeights, Point, RenderOptions, SegmentConfig,
};

/// Dark 7x7 squares on a 24 px grid, light background, mild noise.
fn make_grid_image(w: u32, h: u32) -> IntensityImage {
    let mut rng = StdRng::seed_from_u64(12345);
    let mut img = GrayImage::from_fn(w, h, |_, _| Luma([rng.gen_range(200u8..=255)]));
    let pitch = 24u32;
    for gy in (pitch / 2..h.saturating_sub(4)).step_by(pitch as usize) {
        for gx in (pitch / 2..w.saturating_sub(4)).step_by(pitch as usize) {
            for y in gy - 3..=gy + 3 {
                for x in gx - 3..=gx + 3 {
                    img.put_pixel(x, y, Luma([rng.gen_range(0u8..40)]));
                }
            }
        }
    }
    intensity_from_gray(&img)
}

fn make_jittered_markers(n_cols: usize, n_rows: usize) -> Vec<Marker> {
    let mut rng = StdRng::seed_from_u64(7);
    let mut markers = Vec::with_capacity(n_cols * n_rows);
    for r in 0..n_rows {
        for c in 0..n_cols {
            let x = 20.0 * c as f64 + rng.gen_range(-0.5..0.5);
            let y = 24.0 * r as f64 + rng.gen_range(-0.5..0.5);
            markers.push(Marker::new(Point::new(x, y), rng.gen_range(3.5..4.5)));
        }
    }
    markers
}

fn bench_segment_fit(c: &mut Criterion) {
    let img = make_grid_image(1280, 1024);
    let cfg = SegmentConfig::default();

    c.bench_function("segment_1280x1024", |b| {
        b.iter(|| {
            let labels = segment(black_box(&img), black_box(&cfg)).unwrap();
            black_box(labels.count())
        })
    });

    let labels = segment(&img, &cfg).unwrap();
    c.bench_function("fit_markers_1280x1024", |b| {
        b.iter(|| {
            let markers = fit_markers(black_box(&labels)).unwrap();
            black_box(markers.len())
        })
    });
}

fn bench_orientation(c: &mut Criterion) {
    let markers = make_jittered_markers(25, 20);
    let weights = OrientationWeights::new(1.0, 1.2);
    c.bench_function("orientations_500", |b| {
        b.iter(|| {
            let angles = estimate_orientations(black_box(&markers), black_box(&weights)).unwrap();
            black_box(angles.len())
        })
    });
}

fn bench_render(c: &mut Criterion) {
    let markers: Vec<Marker> = make_jittered_markers(25, 20)
        .into_iter()
        .filter_map(|m| m.with_orientation(0.1))
        .collect();
    let options = RenderOptions {
        frame_ratio: Some(1.5),
        double_frame: true,
        ..Default::default()
    };
    c.bench_function("render_svg_500", |b| {
        b.iter(|| {
            let doc = render_markers(black_box(&markers), black_box(&options)).unwrap();
            black_box(doc.to_svg().len())
        })
    });
}

criterion_group!(hotpaths, bench_segment_fit, bench_orientation, bench_render);
criterion_main!(hotpaths);
