//! ASCII PLY point-cloud I/O.

use crate::{IoError, Result};
use cvkit_core::PointCloud;
use nalgebra::{Point3, Vector3};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Read an ASCII PLY point cloud from a reader.
pub fn read_ply<R: BufRead>(reader: R) -> Result<PointCloud> {
    let mut lines = reader.lines();

    let mut format = String::new();
    let mut has_colors = false;
    let mut has_normals = false;
    let mut num_vertices = 0usize;

    loop {
        let line = lines
            .next()
            .ok_or_else(|| IoError::Parse("Unexpected EOF in header".to_string()))??;
        let line = line.trim();

        if line.starts_with("format ") {
            format = line
                .split_whitespace()
                .nth(1)
                .ok_or_else(|| IoError::Parse("Invalid format line".to_string()))?
                .to_string();
        } else if line.starts_with("element vertex ") {
            num_vertices = line
                .split_whitespace()
                .nth(2)
                .ok_or_else(|| IoError::Parse("Invalid vertex count".to_string()))?
                .parse()
                .map_err(|_| IoError::Parse("Invalid vertex count number".to_string()))?;
        } else if line.contains("property") && line.contains("red") {
            has_colors = true;
        } else if line.contains("property") && line.contains("nx") {
            has_normals = true;
        } else if line == "end_header" {
            break;
        }
    }

    if format != "ascii" {
        return Err(IoError::UnsupportedFormat(format!(
            "PLY format '{}' not supported, only ASCII",
            format
        )));
    }

    let mut points = Vec::with_capacity(num_vertices);
    let mut colors = has_colors.then(|| Vec::with_capacity(num_vertices));
    let mut normals = has_normals.then(|| Vec::with_capacity(num_vertices));

    for _ in 0..num_vertices {
        let line = lines
            .next()
            .ok_or_else(|| IoError::Parse("Unexpected EOF in data".to_string()))??;

        let values: Vec<f32> = line
            .split_whitespace()
            .map(|s| {
                s.parse()
                    .map_err(|_| IoError::Parse(format!("Invalid number: {}", s)))
            })
            .collect::<Result<Vec<_>>>()?;

        if values.len() < 3 {
            return Err(IoError::InvalidData(
                "Not enough values for vertex".to_string(),
            ));
        }

        points.push(Point3::new(values[0], values[1], values[2]));

        let mut idx = 3;
        if has_normals && values.len() >= idx + 3 {
            normals.as_mut().unwrap().push(Vector3::new(
                values[idx],
                values[idx + 1],
                values[idx + 2],
            ));
            idx += 3;
        }
        if has_colors && values.len() >= idx + 3 {
            colors.as_mut().unwrap().push(Point3::new(
                values[idx] / 255.0,
                values[idx + 1] / 255.0,
                values[idx + 2] / 255.0,
            ));
        }
    }

    let mut pc = PointCloud::new(points);
    if let Some(c) = colors {
        if c.len() == pc.len() {
            pc.colors = Some(c);
        }
    }
    if let Some(n) = normals {
        if n.len() == pc.len() {
            pc.normals = Some(n);
        }
    }
    Ok(pc)
}

/// Write an ASCII PLY point cloud to a writer.
pub fn write_ply<W: Write>(mut writer: W, pc: &PointCloud) -> Result<()> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "element vertex {}", pc.len())?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;
    if pc.normals.is_some() {
        writeln!(writer, "property float nx")?;
        writeln!(writer, "property float ny")?;
        writeln!(writer, "property float nz")?;
    }
    if pc.colors.is_some() {
        writeln!(writer, "property uchar red")?;
        writeln!(writer, "property uchar green")?;
        writeln!(writer, "property uchar blue")?;
    }
    writeln!(writer, "end_header")?;

    for i in 0..pc.len() {
        let p = pc.points[i];
        write!(writer, "{} {} {}", p.x, p.y, p.z)?;
        if let Some(normals) = &pc.normals {
            let n = normals[i];
            write!(writer, " {} {} {}", n.x, n.y, n.z)?;
        }
        if let Some(colors) = &pc.colors {
            let c = colors[i];
            write!(
                writer,
                " {} {} {}",
                (c.x * 255.0).round() as u8,
                (c.y * 255.0).round() as u8,
                (c.z * 255.0).round() as u8
            )?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

pub fn read_ply_file<P: AsRef<Path>>(path: P) -> Result<PointCloud> {
    read_ply(BufReader::new(File::open(path)?))
}

pub fn write_ply_file<P: AsRef<Path>>(path: P, pc: &PointCloud) -> Result<()> {
    write_ply(BufWriter::new(File::create(path)?), pc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_cloud() -> PointCloud {
        PointCloud::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 3.0),
            Point3::new(-1.5, 0.5, 2.25),
        ])
        .with_normals(vec![Vector3::z(), Vector3::x(), Vector3::y()])
        .unwrap()
        .with_colors(vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ])
        .unwrap()
    }

    #[test]
    fn roundtrip_preserves_everything() {
        let pc = sample_cloud();
        let mut buf = Vec::new();
        write_ply(&mut buf, &pc).unwrap();
        let back = read_ply(buf.as_slice()).unwrap();

        assert_eq!(back.len(), pc.len());
        for (a, b) in pc.points.iter().zip(&back.points) {
            assert!((a - b).norm() < 1e-5);
        }
        for (a, b) in pc
            .normals
            .as_ref()
            .unwrap()
            .iter()
            .zip(back.normals.as_ref().unwrap())
        {
            assert!((a - b).norm() < 1e-5);
        }
        for (a, b) in pc
            .colors
            .as_ref()
            .unwrap()
            .iter()
            .zip(back.colors.as_ref().unwrap())
        {
            assert!((a - b).norm() < 1e-2);
        }
    }

    #[test]
    fn binary_ply_rejected() {
        let data = "ply\nformat binary_little_endian 1.0\nelement vertex 0\nend_header\n";
        assert!(matches!(
            read_ply(data.as_bytes()),
            Err(IoError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn truncated_data_rejected() {
        let data = "ply\nformat ascii 1.0\nelement vertex 2\nproperty float x\nproperty float y\nproperty float z\nend_header\n0 0 0\n";
        assert!(read_ply(data.as_bytes()).is_err());
    }
}
