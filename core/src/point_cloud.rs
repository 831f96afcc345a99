use nalgebra::{Matrix4, Point3, Vector3};

/// An unordered set of 3D points with optional per-point colors and normals.
///
/// Colors are RGB in [0, 1]; normals are expected to be unit length but this
/// is not enforced.
#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    pub points: Vec<Point3<f32>>,
    pub colors: Option<Vec<Point3<f32>>>,
    pub normals: Option<Vec<Vector3<f32>>>,
}

impl PointCloud {
    pub fn new(points: Vec<Point3<f32>>) -> Self {
        Self {
            points,
            colors: None,
            normals: None,
        }
    }

    pub fn with_colors(mut self, colors: Vec<Point3<f32>>) -> crate::Result<Self> {
        if colors.len() != self.points.len() {
            return Err(crate::Error::DimensionMismatch(format!(
                "color count {} does not match point count {}",
                colors.len(),
                self.points.len()
            )));
        }
        self.colors = Some(colors);
        Ok(self)
    }

    pub fn with_normals(mut self, normals: Vec<Vector3<f32>>) -> crate::Result<Self> {
        if normals.len() != self.points.len() {
            return Err(crate::Error::DimensionMismatch(format!(
                "normal count {} does not match point count {}",
                normals.len(),
                self.points.len()
            )));
        }
        self.normals = Some(normals);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn centroid(&self) -> Option<Point3<f32>> {
        if self.points.is_empty() {
            return None;
        }
        let mut sum = Vector3::zeros();
        for p in &self.points {
            sum += p.coords;
        }
        Some(Point3::from(sum / self.points.len() as f32))
    }

    /// Apply a rigid (or affine) transform to every point and rotate the
    /// normals if present.
    pub fn transform(&self, m: &Matrix4<f32>) -> Self {
        let rot = m.fixed_view::<3, 3>(0, 0).into_owned();
        let points = self.points.iter().map(|p| m.transform_point(p)).collect();
        let normals = self
            .normals
            .as_ref()
            .map(|ns| ns.iter().map(|n| rot * n).collect());
        Self {
            points,
            colors: self.colors.clone(),
            normals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_colors_rejected() {
        let pc = PointCloud::new(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)]);
        assert!(pc.with_colors(vec![Point3::origin()]).is_err());
    }

    #[test]
    fn centroid_of_unit_square_corners() {
        let pc = PointCloud::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]);
        let c = pc.centroid().unwrap();
        assert!((c - Point3::new(0.5, 0.5, 0.0)).norm() < 1e-6);
    }

    #[test]
    fn translation_moves_points() {
        let pc = PointCloud::new(vec![Point3::new(1.0, 2.0, 3.0)]);
        let mut m = Matrix4::identity();
        m[(0, 3)] = 1.0;
        let moved = pc.transform(&m);
        assert!((moved.points[0] - Point3::new(2.0, 2.0, 3.0)).norm() < 1e-6);
    }
}
