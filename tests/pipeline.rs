//! End-to-end runs of the sketch on the CPU backend.

#![allow(clippy::unwrap_used)]

use paint_trails::{
    CpuBackend, DisplaySize, Error, RandomSource, SeedHash, Sfc32, Sketch, SketchConfig,
    TickOutcome,
};

const GRAY: f32 = 0.4;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn seed() -> SeedHash {
    SeedHash::parse("9a3b".repeat(16)).unwrap()
}

fn cpu_sketch() -> Sketch<CpuBackend> {
    init_tracing();
    Sketch::with_seeded_random(SketchConfig::new(seed()), |config| {
        Ok(CpuBackend::new(&config.render))
    })
}

fn display() -> DisplaySize {
    DisplaySize::new(200, 200)
}

fn red_at(sketch: &Sketch<CpuBackend>, x: u32, y: u32) -> f32 {
    sketch.backend().unwrap().texel(x, y)[0]
}

#[test]
fn overlapping_frames_accumulate() {
    let mut sketch = cpu_sketch();
    // Inside both the frame 0 and frame 1 quads.
    let (x, y) = (260, 350);
    assert!((red_at(&sketch, x, y) - GRAY).abs() < 1e-6);

    sketch.tick(display()).unwrap();
    let first = red_at(&sketch, x, y);
    assert!((first - (0.1 + GRAY * 0.9)).abs() < 1e-5, "got {first}");

    sketch.tick(display()).unwrap();
    let second = red_at(&sketch, x, y);
    let second_alone = 0.102 + GRAY * (1.0 - 0.102);
    assert!(second > first);
    assert!(second > second_alone);
    assert!((second - (0.102 + first * (1.0 - 0.102))).abs() < 1e-4);

    // Green and blue only ever fade toward zero; alpha stays opaque.
    let texel = sketch.backend().unwrap().texel(x, y);
    assert!(texel[1] < GRAY && texel[2] < GRAY);
    assert!((texel[3] - 1.0).abs() < 1e-6);
}

#[test]
fn untouched_regions_keep_the_clear_color() {
    let mut sketch = cpu_sketch();
    while sketch.tick(display()).unwrap() != TickOutcome::Finished {}
    let backend = sketch.backend().unwrap();
    assert_eq!(backend.texel(5, 5), [GRAY, GRAY, GRAY, 1.0]);
    assert_eq!(backend.texel(500, 900), [GRAY, GRAY, GRAY, 1.0]);
}

#[test]
fn frozen_after_frame_fifty() {
    let mut sketch = cpu_sketch();
    let mut drawn = Vec::new();
    loop {
        match sketch.tick(display()).unwrap() {
            TickOutcome::Drawn { frame, triangles } => {
                assert_eq!(triangles, 2);
                drawn.push(frame);
            }
            TickOutcome::Finished => break,
            TickOutcome::Disabled => panic!("cpu backend never disables"),
        }
    }
    assert_eq!(drawn, (0..=50).collect::<Vec<_>>());

    let accumulator = sketch.backend().unwrap().accumulator().clone();
    let visible = sketch.backend().unwrap().visible().clone();
    for _ in 0..5 {
        assert_eq!(sketch.tick(display()).unwrap(), TickOutcome::Finished);
    }
    assert_eq!(sketch.backend().unwrap().accumulator(), &accumulator);
    assert_eq!(sketch.backend().unwrap().visible(), &visible);
}

#[test]
fn identical_seeds_render_identically() {
    let mut a = cpu_sketch();
    let mut b = cpu_sketch();
    assert_eq!(a.seeds(), b.seeds());
    for _ in 0..10 {
        assert_eq!(a.tick(display()).unwrap(), b.tick(display()).unwrap());
    }
    let raw_a = a.backend().unwrap().accumulator().as_raw();
    let raw_b = b.backend().unwrap().accumulator().as_raw();
    assert!(raw_a.iter().zip(raw_b).all(|(x, y)| x.to_bits() == y.to_bits()));
    for _ in 0..100 {
        assert_eq!(a.random().to_bits(), b.random().to_bits());
    }
}

#[test]
fn seeded_source_matches_a_fresh_generator() {
    let mut sketch = cpu_sketch();
    let mut fresh = Sfc32::from_seed(&seed());
    // Setup consumed two draws for the startup seeds.
    fresh.next_f64();
    fresh.next_f64();
    assert_eq!(sketch.random().to_bits(), fresh.next_f64().to_bits());
}

#[test]
fn composite_tracks_the_display_size() {
    let mut sketch = cpu_sketch();
    sketch
        .tick(DisplaySize::new(320, 240).with_device_pixel_ratio(2.0))
        .unwrap();
    assert_eq!(sketch.backend().unwrap().visible().dimensions(), (640, 480));
    sketch.tick(DisplaySize::new(100, 100)).unwrap();
    assert_eq!(sketch.backend().unwrap().visible().dimensions(), (100, 100));
}

#[test]
fn missing_capability_leaves_the_surface_alone() {
    init_tracing();
    let mut sketch: Sketch<CpuBackend> =
        Sketch::with_seeded_random(SketchConfig::new(seed()), |_| {
            Err(Error::missing_capability("float render targets unsupported"))
        });
    assert!(sketch.is_disabled());
    assert!(sketch.backend().is_none());
    assert_eq!(sketch.tick(display()).unwrap(), TickOutcome::Disabled);
    assert_eq!(sketch.frame(), 0);
}

#[test]
fn visible_surface_saves_as_png() {
    let mut sketch = cpu_sketch();
    sketch.tick(DisplaySize::new(64, 64)).unwrap();

    let path = std::env::temp_dir().join(format!("paint-trails-{}.png", std::process::id()));
    sketch.backend().unwrap().save_visible(&path).unwrap();
    let decoded = image::open(&path).unwrap().to_rgba8();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(decoded.dimensions(), (64, 64));
    assert_eq!(&decoded, sketch.backend().unwrap().visible());
}

#[test]
fn config_document_drives_the_run() {
    init_tracing();
    let json = format!(
        r#"{{
            "seed": "{}",
            "render": {{ "width": 64, "height": 64 }},
            "animation": {{ "base_shape": [[0, 0], [8, 0], [8, 8], [0, 8]], "drift_base": 1.0, "last_frame": 2 }},
            "features": {{ "Frames": 3 }}
        }}"#,
        seed()
    );
    let config = SketchConfig::from_json(&json).unwrap();
    let mut sketch = Sketch::with_seeded_random(config, |c| Ok(CpuBackend::new(&c.render)));
    assert_eq!(sketch.features().to_json(), r#"{"Frames":3.0}"#);

    let mut frames = 0;
    while let TickOutcome::Drawn { .. } = sketch.tick(DisplaySize::new(16, 16)).unwrap() {
        frames += 1;
    }
    assert_eq!(frames, 3);
    assert_eq!(sketch.backend().unwrap().accumulator().dimensions(), (64, 64));
    assert!(red_at(&sketch, 4, 4) > GRAY);
}
