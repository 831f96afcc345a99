//! ASCII PCD (Point Cloud Data) I/O, xyz with optional normals.

use crate::{IoError, Result};
use cvkit_core::PointCloud;
use nalgebra::{Point3, Vector3};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Read an ASCII PCD file from a reader. Supported fields: `x y z`
/// optionally followed by `normal_x normal_y normal_z`.
pub fn read_pcd<R: BufRead>(reader: R) -> Result<PointCloud> {
    let mut lines = reader.lines();

    let mut fields: Vec<String> = Vec::new();
    let mut num_points = 0usize;
    let mut data_format = String::new();

    loop {
        let line = lines
            .next()
            .ok_or_else(|| IoError::Parse("Unexpected EOF in header".to_string()))??;
        let line = line.trim().to_string();

        if line.starts_with('#') || line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let key = parts.next().unwrap_or_default().to_uppercase();
        match key.as_str() {
            "FIELDS" => fields = parts.map(|s| s.to_lowercase()).collect(),
            "POINTS" => {
                num_points = parts
                    .next()
                    .ok_or_else(|| IoError::Parse("Missing POINTS count".to_string()))?
                    .parse()
                    .map_err(|_| IoError::Parse("Invalid POINTS count".to_string()))?;
            }
            "DATA" => {
                data_format = parts.next().unwrap_or_default().to_lowercase();
                break;
            }
            // SIZE/TYPE/COUNT/WIDTH/HEIGHT/VERSION/VIEWPOINT carry no extra
            // information for the ASCII xyz layout.
            _ => {}
        }
    }

    if data_format != "ascii" {
        return Err(IoError::UnsupportedFormat(format!(
            "PCD data format '{}' not supported, only ascii",
            data_format
        )));
    }

    let x_idx = fields.iter().position(|f| f == "x").ok_or_else(|| {
        IoError::InvalidData("PCD file has no x field".to_string())
    })?;
    if fields.get(x_idx + 1).map(String::as_str) != Some("y")
        || fields.get(x_idx + 2).map(String::as_str) != Some("z")
    {
        return Err(IoError::InvalidData(
            "expected contiguous x y z fields".to_string(),
        ));
    }
    let normal_idx = fields.iter().position(|f| f == "normal_x");

    let mut points = Vec::with_capacity(num_points);
    let mut normals = normal_idx.map(|_| Vec::with_capacity(num_points));

    for _ in 0..num_points {
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

        if values.len() < x_idx + 3 {
            return Err(IoError::InvalidData(
                "Not enough values for point".to_string(),
            ));
        }
        points.push(Point3::new(
            values[x_idx],
            values[x_idx + 1],
            values[x_idx + 2],
        ));

        if let (Some(ni), Some(ns)) = (normal_idx, normals.as_mut()) {
            if values.len() < ni + 3 {
                return Err(IoError::InvalidData(
                    "Not enough values for normal".to_string(),
                ));
            }
            ns.push(Vector3::new(values[ni], values[ni + 1], values[ni + 2]));
        }
    }

    let mut pc = PointCloud::new(points);
    if let Some(ns) = normals {
        pc.normals = Some(ns);
    }
    Ok(pc)
}

/// Write an ASCII PCD file.
pub fn write_pcd<W: Write>(mut writer: W, pc: &PointCloud) -> Result<()> {
    let with_normals = pc.normals.is_some();
    let (fields, size, typ, count) = if with_normals {
        (
            "x y z normal_x normal_y normal_z",
            "4 4 4 4 4 4",
            "F F F F F F",
            "1 1 1 1 1 1",
        )
    } else {
        ("x y z", "4 4 4", "F F F", "1 1 1")
    };

    writeln!(writer, "# .PCD v0.7 - Point Cloud Data file format")?;
    writeln!(writer, "VERSION 0.7")?;
    writeln!(writer, "FIELDS {}", fields)?;
    writeln!(writer, "SIZE {}", size)?;
    writeln!(writer, "TYPE {}", typ)?;
    writeln!(writer, "COUNT {}", count)?;
    writeln!(writer, "WIDTH {}", pc.len())?;
    writeln!(writer, "HEIGHT 1")?;
    writeln!(writer, "VIEWPOINT 0 0 0 1 0 0 0")?;
    writeln!(writer, "POINTS {}", pc.len())?;
    writeln!(writer, "DATA ascii")?;

    for i in 0..pc.len() {
        let p = pc.points[i];
        write!(writer, "{} {} {}", p.x, p.y, p.z)?;
        if let Some(normals) = &pc.normals {
            let n = normals[i];
            write!(writer, " {} {} {}", n.x, n.y, n.z)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

pub fn read_pcd_file<P: AsRef<Path>>(path: P) -> Result<PointCloud> {
    read_pcd(BufReader::new(File::open(path)?))
}

pub fn write_pcd_file<P: AsRef<Path>>(path: P, pc: &PointCloud) -> Result<()> {
    write_pcd(BufWriter::new(File::create(path)?), pc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_xyz_with_normals() {
        let pc = PointCloud::new(vec![
            Point3::new(0.5, -1.0, 2.0),
            Point3::new(3.25, 0.0, -0.75),
        ])
        .with_normals(vec![Vector3::z(), Vector3::new(0.0, 1.0, 0.0)])
        .unwrap();

        let mut buf = Vec::new();
        write_pcd(&mut buf, &pc).unwrap();
        let back = read_pcd(buf.as_slice()).unwrap();

        assert_eq!(back.len(), 2);
        for (a, b) in pc.points.iter().zip(&back.points) {
            assert!((a - b).norm() < 1e-5);
        }
        assert!(back.normals.is_some());
    }

    #[test]
    fn binary_pcd_rejected() {
        let data = "VERSION 0.7\nFIELDS x y z\nSIZE 4 4 4\nTYPE F F F\nCOUNT 1 1 1\nWIDTH 1\nHEIGHT 1\nPOINTS 1\nDATA binary\n";
        assert!(matches!(
            read_pcd(data.as_bytes()),
            Err(IoError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn missing_xyz_fields_rejected() {
        let data = "FIELDS rgb\nPOINTS 0\nDATA ascii\n";
        assert!(read_pcd(data.as_bytes()).is_err());
    }

    #[test]
    fn comments_in_header_skipped() {
        let data = "# comment\nFIELDS x y z\nPOINTS 1\nDATA ascii\n1 2 3\n";
        let pc = read_pcd(data.as_bytes()).unwrap();
        assert_eq!(pc.len(), 1);
        assert!((pc.points[0] - Point3::new(1.0, 2.0, 3.0)).norm() < 1e-6);
    }
}
