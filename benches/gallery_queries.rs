//! Benchmark gallery queries with a 500-image dataset.

use criterion::{criterion_group, criterion_main, Criterion};
use imageforge_common::EncodedImage;
use imageforge_db::pool::{init_memory_pool, PooledConnection};
use imageforge_db::queries::gallery;

/// Roughly the size of a small generated PNG once base64 encoded.
const IMAGE_BYTES: usize = 48 * 1024;

fn image_data(i: u32) -> String {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(&i.to_le_bytes());
    bytes.resize(IMAGE_BYTES, (i % 251) as u8);
    EncodedImage::from_bytes("image/png", &bytes).to_data_url()
}

fn setup() -> (PooledConnection, imageforge_common::GalleryImageId) {
    let pool = init_memory_pool().expect("pool");
    let conn = pool.get().expect("conn");

    let mut first_id = None;
    for i in 0..500 {
        let id = gallery::insert_image(&conn, &image_data(i)).unwrap();
        first_id.get_or_insert(id);
    }

    (conn, first_id.unwrap())
}

fn bench_gallery_queries(c: &mut Criterion) {
    let (conn, first_id) = setup();

    c.bench_function("gallery_list_images_500", |b| {
        b.iter(|| gallery::list_images(&conn).unwrap())
    });

    c.bench_function("gallery_get_image", |b| {
        b.iter(|| gallery::get_image(&conn, first_id).unwrap())
    });

    c.bench_function("gallery_count_images", |b| {
        b.iter(|| gallery::count_images(&conn).unwrap())
    });

    let data = image_data(9999);
    c.bench_function("gallery_insert_delete", |b| {
        b.iter(|| {
            let id = gallery::insert_image(&conn, &data).unwrap();
            gallery::delete_image(&conn, id).unwrap()
        })
    });
}

criterion_group!(benches, bench_gallery_queries);
criterion_main!(benches);
