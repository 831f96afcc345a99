//! Binary image thinning (skeletonization).

use image::GrayImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThinningMethod {
    ZhangSuen,
    GuoHall,
}

/// One thinning sub-pass. `iter` selects which of the two alternating
/// deletion conditions applies. Pixels are 0/1 at this point.
fn thinning_iteration(img: &mut Vec<u8>, width: usize, height: usize, iter: usize, method: ThinningMethod) -> bool {
    let mut marker = vec![0u8; width * height];
    let at = |data: &[u8], x: usize, y: usize| data[y * width + x] as i32;

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            if img[y * width + x] == 0 {
                continue;
            }
            let p2 = at(img, x, y - 1);
            let p3 = at(img, x + 1, y - 1);
            let p4 = at(img, x + 1, y);
            let p5 = at(img, x + 1, y + 1);
            let p6 = at(img, x, y + 1);
            let p7 = at(img, x - 1, y + 1);
            let p8 = at(img, x - 1, y);
            let p9 = at(img, x - 1, y - 1);

            let delete = match method {
                ThinningMethod::ZhangSuen => {
                    let a = (p2 == 0 && p3 == 1) as i32
                        + (p3 == 0 && p4 == 1) as i32
                        + (p4 == 0 && p5 == 1) as i32
                        + (p5 == 0 && p6 == 1) as i32
                        + (p6 == 0 && p7 == 1) as i32
                        + (p7 == 0 && p8 == 1) as i32
                        + (p8 == 0 && p9 == 1) as i32
                        + (p9 == 0 && p2 == 1) as i32;
                    let b = p2 + p3 + p4 + p5 + p6 + p7 + p8 + p9;
                    let m1 = if iter == 0 { p2 * p4 * p6 } else { p2 * p4 * p8 };
                    let m2 = if iter == 0 { p4 * p6 * p8 } else { p2 * p6 * p8 };
                    a == 1 && (2..=6).contains(&b) && m1 == 0 && m2 == 0
                }
                ThinningMethod::GuoHall => {
                    let c = ((p2 == 0) && (p3 == 1 || p4 == 1)) as i32
                        + ((p4 == 0) && (p5 == 1 || p6 == 1)) as i32
                        + ((p6 == 0) && (p7 == 1 || p8 == 1)) as i32
                        + ((p8 == 0) && (p9 == 1 || p2 == 1)) as i32;
                    let n1 = (p9 | p2) + (p3 | p4) + (p5 | p6) + (p7 | p8);
                    let n2 = (p2 | p3) + (p4 | p5) + (p6 | p7) + (p8 | p9);
                    let n = n1.min(n2);
                    let m = if iter == 0 {
                        (p6 | p7 | (1 - p9)) & p8
                    } else {
                        (p2 | p3 | (1 - p5)) & p4
                    };
                    c == 1 && (2..=3).contains(&n) && m == 0
                }
            };

            if delete {
                marker[y * width + x] = 1;
            }
        }
    }

    let mut changed = false;
    for (px, &m) in img.iter_mut().zip(marker.iter()) {
        if m == 1 && *px == 1 {
            *px = 0;
            changed = true;
        }
    }
    changed
}

/// Thin a binary image (non-zero = foreground) down to a one-pixel-wide
/// skeleton. Iterates both sub-passes until no pixel changes. Output pixels
/// are 0 or 255.
pub fn thinning(src: &GrayImage, method: ThinningMethod) -> GrayImage {
    let width = src.width() as usize;
    let height = src.height() as usize;
    let mut data: Vec<u8> = src.as_raw().iter().map(|&v| (v > 0) as u8).collect();

    if width > 2 && height > 2 {
        loop {
            let c0 = thinning_iteration(&mut data, width, height, 0, method);
            let c1 = thinning_iteration(&mut data, width, height, 1, method);
            if !c0 && !c1 {
                break;
            }
        }
    }

    for v in &mut data {
        *v *= 255;
    }
    GrayImage::from_raw(src.width(), src.height(), data)
        .expect("buffer sized from dimensions")
}
