use image::GrayImage;

/// A row-major single-channel f32 image plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
}

impl Plane {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0.0; width * height],
            width,
            height,
        }
    }

    pub fn from_vec(data: Vec<f32>, width: usize, height: usize) -> crate::Result<Self> {
        if data.len() != width * height {
            return Err(crate::Error::DimensionMismatch(format!(
                "plane data length {} does not match {}x{}",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub fn from_gray(img: &GrayImage) -> Self {
        Self {
            data: img.as_raw().iter().map(|&v| v as f32).collect(),
            width: img.width() as usize,
            height: img.height() as usize,
        }
    }

    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        self.data[y * self.width + x] = v;
    }

    pub fn min_max(&self) -> (f32, f32) {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &v in &self.data {
            min = min.min(v);
            max = max.max(v);
        }
        (min, max)
    }

    /// Linearly rescale values to [0, 255] and quantize, for display.
    /// A constant plane maps to mid-gray.
    pub fn to_gray_normalized(&self) -> GrayImage {
        let (min, max) = self.min_max();
        let range = max - min;
        let data: Vec<u8> = if range > 0.0 {
            self.data
                .iter()
                .map(|&v| (((v - min) / range) * 255.0).round() as u8)
                .collect()
        } else {
            vec![128; self.data.len()]
        };
        GrayImage::from_raw(self.width as u32, self.height as u32, data)
            .expect("buffer sized from dimensions")
    }

    /// Zero-pad (bottom/right) to the given size.
    pub fn padded(&self, width: usize, height: usize) -> Plane {
        let mut out = Plane::new(width, height);
        for y in 0..self.height.min(height) {
            let src = &self.data[y * self.width..y * self.width + self.width.min(width)];
            out.data[y * width..y * width + src.len()].copy_from_slice(src);
        }
        out
    }

    /// Crop the top-left region of the given size.
    pub fn cropped(&self, width: usize, height: usize) -> Plane {
        let mut out = Plane::new(width, height);
        for y in 0..height.min(self.height) {
            for x in 0..width.min(self.width) {
                out.data[y * width + x] = self.get(x, y);
            }
        }
        out
    }
}
