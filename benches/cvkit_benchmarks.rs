use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cvkit::imgproc::{canny, gaussian_blur, threshold_otsu, ThresholdType};
use cvkit::transform::{dft_2d, haar_forward, haar_inverse, Plane, Shrinkage};
use image::{GrayImage, Luma};

fn test_image(size: u32) -> GrayImage {
    let mut img = GrayImage::new(size, size);
    for y in 0..size {
        for x in 0..size {
            img.put_pixel(x, y, Luma([((x * 31 + y * 17) % 256) as u8]));
        }
    }
    img
}

fn bench_imgproc(c: &mut Criterion) {
    let img = test_image(512);

    c.bench_function("gaussian_blur_512", |b| {
        b.iter(|| gaussian_blur(black_box(&img), 1.5))
    });

    c.bench_function("canny_512", |b| {
        b.iter(|| canny(black_box(&img), 50, 150))
    });

    c.bench_function("otsu_512", |b| {
        b.iter(|| threshold_otsu(black_box(&img), 255, ThresholdType::Binary))
    });
}

fn bench_transforms(c: &mut Criterion) {
    let plane = Plane::from_gray(&test_image(256));

    c.bench_function("dft_256", |b| b.iter(|| dft_2d(black_box(&plane)).unwrap()));

    c.bench_function("haar_denoise_256", |b| {
        b.iter(|| {
            let coeffs = haar_forward(black_box(&plane), 3).unwrap();
            haar_inverse(&coeffs, 3, Shrinkage::Garrote, 30.0).unwrap()
        })
    });
}

criterion_group!(benches, bench_imgproc, bench_transforms);
criterion_main!(benches);
