use cvkit_core::Error;

/// One decoded detection; `rect` is (x, y, width, height) in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub rect: [f32; 4],
    pub class_id: usize,
    pub confidence: f32,
}

impl Detection {
    pub fn area(&self) -> f32 {
        self.rect[2].max(0.0) * self.rect[3].max(0.0)
    }
}

/// Intersection-over-union of two rectangles.
pub fn iou(a: &Detection, b: &Detection) -> f32 {
    let x1 = a.rect[0].max(b.rect[0]);
    let y1 = a.rect[1].max(b.rect[1]);
    let x2 = (a.rect[0] + a.rect[2]).min(b.rect[0] + b.rect[2]);
    let y2 = (a.rect[1] + a.rect[3]).min(b.rect[1] + b.rect[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.area() + b.area() - inter;
    if union > 0.0 {
        inter / union
    } else {
        0.0
    }
}

/// Decode YOLO-style output rows of the form
/// `[cx, cy, w, h, objectness, class scores...]` with box coordinates
/// relative to the frame. Detections below `conf_threshold` are dropped.
pub fn decode_yolo(
    rows: &[f32],
    stride: usize,
    conf_threshold: f32,
    frame_width: u32,
    frame_height: u32,
) -> cvkit_core::Result<Vec<Detection>> {
    if stride < 6 {
        return Err(Error::InvalidInput(format!(
            "row stride {stride} too small for [cx,cy,w,h,obj,scores...]"
        )));
    }
    if rows.len() % stride != 0 {
        return Err(Error::DimensionMismatch(format!(
            "output length {} not a multiple of stride {stride}",
            rows.len()
        )));
    }

    let mut detections = Vec::new();
    for row in rows.chunks(stride) {
        let objectness = row[4];
        let scores = &row[5..];
        let (class_id, &class_score) = scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .expect("stride guarantees at least one class score");

        let confidence = objectness * class_score;
        if confidence <= conf_threshold {
            continue;
        }

        let cx = row[0] * frame_width as f32;
        let cy = row[1] * frame_height as f32;
        let w = row[2] * frame_width as f32;
        let h = row[3] * frame_height as f32;

        detections.push(Detection {
            rect: [cx - w / 2.0, cy - h / 2.0, w, h],
            class_id,
            confidence,
        });
    }
    Ok(detections)
}

/// Greedy per-class non-maximum suppression: keep the highest-confidence
/// detection, drop overlapping ones above `iou_threshold`, repeat.
pub fn nms(detections: &[Detection], iou_threshold: f32) -> Vec<Detection> {
    let mut sorted: Vec<Detection> = detections.to_vec();
    sorted.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<Detection> = Vec::new();
    for det in sorted {
        let overlaps = kept
            .iter()
            .any(|k| k.class_id == det.class_id && iou(k, &det) > iou_threshold);
        if !overlaps {
            kept.push(det);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x: f32, y: f32, w: f32, h: f32, class_id: usize, confidence: f32) -> Detection {
        Detection {
            rect: [x, y, w, h],
            class_id,
            confidence,
        }
    }

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = det(10.0, 10.0, 20.0, 20.0, 0, 0.9);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_zero() {
        let a = det(0.0, 0.0, 10.0, 10.0, 0, 0.9);
        let b = det(20.0, 20.0, 10.0, 10.0, 0, 0.9);
        assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn decode_filters_by_confidence_and_scales_boxes() {
        // Two rows, 2 classes: one confident person-ish box, one weak row.
        let rows = vec![
            0.5, 0.5, 0.2, 0.4, 0.9, 0.1, 0.8, //
            0.1, 0.1, 0.1, 0.1, 0.3, 0.5, 0.2,
        ];
        let dets = decode_yolo(&rows, 7, 0.5, 640, 480).unwrap();
        assert_eq!(dets.len(), 1);
        let d = &dets[0];
        assert_eq!(d.class_id, 1);
        assert!((d.confidence - 0.72).abs() < 1e-5);
        assert!((d.rect[0] - (0.5 * 640.0 - 0.1 * 640.0)).abs() < 1e-3);
        assert!((d.rect[2] - 0.2 * 640.0).abs() < 1e-3);
        assert!((d.rect[3] - 0.4 * 480.0).abs() < 1e-3);
    }

    #[test]
    fn decode_rejects_bad_stride() {
        assert!(decode_yolo(&[0.0; 12], 5, 0.5, 640, 480).is_err());
        assert!(decode_yolo(&[0.0; 13], 7, 0.5, 640, 480).is_err());
    }

    #[test]
    fn nms_keeps_best_of_overlapping_pair() {
        let dets = vec![
            det(100.0, 100.0, 50.0, 50.0, 0, 0.9),
            det(105.0, 102.0, 50.0, 50.0, 0, 0.7),
            det(300.0, 300.0, 40.0, 40.0, 0, 0.8),
        ];
        let kept = nms(&dets, 0.4);
        assert_eq!(kept.len(), 2);
        assert!((kept[0].confidence - 0.9).abs() < 1e-6);
        assert!((kept[1].confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn nms_is_per_class() {
        let dets = vec![
            det(100.0, 100.0, 50.0, 50.0, 0, 0.9),
            det(100.0, 100.0, 50.0, 50.0, 1, 0.8),
        ];
        let kept = nms(&dets, 0.4);
        assert_eq!(kept.len(), 2);
    }
}
