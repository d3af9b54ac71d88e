use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pixel_view::core::{PixelBuffer, PixelFormat, TextureCache, TextureKey};
use pixel_view::source::TestPatternSource;

fn key(width: u32, height: u32) -> TextureKey {
    TextureKey {
        width,
        height,
        format: PixelFormat::Bgra8,
    }
}

/// Benchmark: steady-state lookup of the texture for the current geometry
fn bench_cache_hit(c: &mut Criterion) {
    let mut cache = TextureCache::new(4);
    cache.get_or_insert_with(key(1280, 720), || Ok::<_, ()>(0u64)).ok();

    c.bench_function("texture_cache_hit", |b| {
        b.iter(|| {
            let lookup = cache
                .get_or_insert_with(black_box(key(1280, 720)), || Ok::<_, ()>(1u64))
                .ok();
            black_box(lookup.map(|l| *l.texture));
        })
    });
}

/// Benchmark: worst case where every frame changes geometry
fn bench_cache_thrash(c: &mut Criterion) {
    let mut cache = TextureCache::new(2);
    let keys = [key(640, 480), key(1280, 720), key(1920, 1080)];
    let mut i = 0usize;

    c.bench_function("texture_cache_thrash", |b| {
        b.iter(|| {
            i = (i + 1) % keys.len();
            black_box(cache.make_room(&keys[i]));
            let lookup = cache.get_or_insert_with(keys[i], || Ok::<_, ()>(i)).ok();
            black_box(lookup.map(|l| l.created));
        })
    });
}

/// Benchmark: per-frame buffer validation at common camera resolutions
fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate");
    for (width, height) in [(640, 480), (1280, 720), (1920, 1080)] {
        let frame = TestPatternSource::new(width, height, PixelFormat::Bgra8).next_frame();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", width, height)),
            &frame,
            |b, frame| {
                b.iter(|| {
                    let buffer = PixelBuffer::with_stride(
                        frame.width,
                        frame.height,
                        frame.bytes_per_row,
                        frame.format,
                        &frame.data,
                    );
                    black_box(buffer.validate()).ok();
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_cache_hit, bench_cache_thrash, bench_validate);
criterion_main!(benches);
