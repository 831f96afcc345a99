use image::GrayImage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<(i32, i32)>,
}

/// Spatial moments up to first order plus the derived centroid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub m11: f64,
    pub m20: f64,
    pub m02: f64,
}

impl Moments {
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.m00.abs() < f64::EPSILON {
            return None;
        }
        Some((self.m10 / self.m00, self.m01 / self.m00))
    }
}

const DIRS_8: [(i32, i32); 8] = [
    (1, 0),   // E
    (1, 1),   // SE
    (0, 1),   // S
    (-1, 1),  // SW
    (-1, 0),  // W
    (-1, -1), // NW
    (0, -1),  // N
    (1, -1),  // NE
];

fn in_bounds(x: i32, y: i32, w: i32, h: i32) -> bool {
    x >= 0 && y >= 0 && x < w && y < h
}

fn is_foreground(data: &[u8], w: i32, h: i32, x: i32, y: i32) -> bool {
    in_bounds(x, y, w, h) && data[(y * w + x) as usize] > 0
}

fn is_boundary(data: &[u8], w: i32, h: i32, x: i32, y: i32) -> bool {
    if !is_foreground(data, w, h, x, y) {
        return false;
    }
    for (dx, dy) in DIRS_8 {
        let nx = x + dx;
        let ny = y + dy;
        if !in_bounds(nx, ny, w, h) || !is_foreground(data, w, h, nx, ny) {
            return true;
        }
    }
    false
}

fn trace_boundary(data: &[u8], w: i32, h: i32, sx: i32, sy: i32) -> Vec<(i32, i32)> {
    let mut contour = Vec::new();
    let mut current = (sx, sy);
    let mut prev_dir = 4usize; // as if arrived from the west
    let start = current;
    let start_prev_dir = prev_dir;
    let max_steps = (w as usize * h as usize).saturating_mul(8).max(32);

    for _ in 0..max_steps {
        contour.push(current);

        let mut found = None;
        for step in 1..=8 {
            let k = (prev_dir + step) % 8;
            let nx = current.0 + DIRS_8[k].0;
            let ny = current.1 + DIRS_8[k].1;
            if is_foreground(data, w, h, nx, ny) {
                // Backtrack direction for the next step: the neighbor before
                // k in the clockwise search.
                prev_dir = (k + 6) % 8;
                found = Some((nx, ny));
                break;
            }
        }

        let Some(next) = found else { break };

        if next == start && prev_dir == start_prev_dir && contour.len() > 1 {
            break;
        }
        current = next;
    }

    if contour.len() > 1 && contour.first() == contour.last() {
        contour.pop();
    }
    contour
}

/// Find external contours in a binary image (non-zero pixels are foreground).
pub fn find_external_contours(binary: &GrayImage) -> Vec<Contour> {
    let w = binary.width() as i32;
    let h = binary.height() as i32;
    let data = binary.as_raw();
    let mut visited_boundary = vec![false; (w * h) as usize];
    let mut contours = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) as usize;
            if visited_boundary[idx] || !is_boundary(data, w, h, x, y) {
                continue;
            }
            let points = trace_boundary(data, w, h, x, y);
            if points.len() >= 3 {
                for &(px, py) in &points {
                    visited_boundary[(py * w + px) as usize] = true;
                }
                contours.push(Contour { points });
            } else {
                visited_boundary[idx] = true;
            }
        }
    }

    contours
}

/// Polygon area via the shoelace formula. Contour points must be ordered.
pub fn contour_area(contour: &Contour) -> f64 {
    let n = contour.points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0i64;
    for i in 0..n {
        let (x0, y0) = contour.points[i];
        let (x1, y1) = contour.points[(i + 1) % n];
        sum += x0 as i64 * y1 as i64 - x1 as i64 * y0 as i64;
    }
    (sum as f64 / 2.0).abs()
}

pub fn contour_perimeter(contour: &Contour) -> f64 {
    let n = contour.points.len();
    if n < 2 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let (x0, y0) = contour.points[i];
        let (x1, y1) = contour.points[(i + 1) % n];
        let dx = (x1 - x0) as f64;
        let dy = (y1 - y0) as f64;
        sum += (dx * dx + dy * dy).sqrt();
    }
    sum
}

/// Axis-aligned bounding rectangle as (x, y, width, height).
pub fn bounding_rect(contour: &Contour) -> Option<(i32, i32, u32, u32)> {
    let first = contour.points.first()?;
    let mut min_x = first.0;
    let mut max_x = first.0;
    let mut min_y = first.1;
    let mut max_y = first.1;
    for &(x, y) in &contour.points {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    Some((
        min_x,
        min_y,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}

/// Intensity-weighted spatial moments of the whole image.
pub fn image_moments(img: &GrayImage) -> Moments {
    let mut m = Moments {
        m00: 0.0,
        m10: 0.0,
        m01: 0.0,
        m11: 0.0,
        m20: 0.0,
        m02: 0.0,
    };
    for (x, y, p) in img.enumerate_pixels() {
        let v = p[0] as f64;
        let xf = x as f64;
        let yf = y as f64;
        m.m00 += v;
        m.m10 += xf * v;
        m.m01 += yf * v;
        m.m11 += xf * yf * v;
        m.m20 += xf * xf * v;
        m.m02 += yf * yf * v;
    }
    m
}

/// Moments of the polygon boundary treated as a set of unit-mass points.
pub fn contour_moments(contour: &Contour) -> Moments {
    let mut m = Moments {
        m00: 0.0,
        m10: 0.0,
        m01: 0.0,
        m11: 0.0,
        m20: 0.0,
        m02: 0.0,
    };
    for &(x, y) in &contour.points {
        let xf = x as f64;
        let yf = y as f64;
        m.m00 += 1.0;
        m.m10 += xf;
        m.m01 += yf;
        m.m11 += xf * yf;
        m.m20 += xf * xf;
        m.m02 += yf * yf;
    }
    m
}
