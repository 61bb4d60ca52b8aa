use nalgebra::Vector3;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct GradientRecord {
    vertex: usize,
    gx: f64,
    gy: f64,
    gz: f64,
}

/// Writes one `vertex,gx,gy,gz` row per vertex.
pub fn write_gradient<W: Write>(writer: W, gradient: &[Vector3<f64>]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    for (vertex, g) in gradient.iter().enumerate() {
        writer.serialize(GradientRecord {
            vertex,
            gx: g.x,
            gy: g.y,
            gz: g.z,
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct LineRecord<'a> {
    lines_x: Option<f64>,
    lines_y: Option<f64>,
    name: &'a str,
}

/// Writes named 2D segment sets as `lines_x,lines_y,name` rows for line
/// plots. Each segment is two rows followed by an empty separator row so
/// plotting tools break the line between segments.
pub fn write_line_segments<W: Write>(
    writer: W,
    sets: &[(&str, Vec<[[f64; 2]; 2]>)],
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    for (name, segments) in sets {
        for [start, end] in segments {
            for point in [start, end] {
                writer.serialize(LineRecord {
                    lines_x: Some(point[0]),
                    lines_y: Some(point[1]),
                    name,
                })?;
            }
            writer.serialize(LineRecord {
                lines_x: None,
                lines_y: None,
                name,
            })?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_rows_follow_vertex_order() {
        let mut buffer = Vec::new();
        write_gradient(
            &mut buffer,
            &[Vector3::new(1.0, 2.0, 3.0), Vector3::new(-0.5, 0.0, 0.25)],
        )
        .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "vertex,gx,gy,gz");
        assert_eq!(lines[1], "0,1.0,2.0,3.0");
        assert_eq!(lines[2], "1,-0.5,0.0,0.25");
    }

    #[test]
    fn segments_are_separated_by_empty_rows() {
        let mut buffer = Vec::new();
        let apical = vec![[[0.0, 0.0], [1.0, 0.0]]];
        let basal = vec![[[0.0, 1.0], [1.0, 1.0]]];
        write_line_segments(&mut buffer, &[("apical", apical), ("basal", basal)]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "lines_x,lines_y,name");
        assert_eq!(lines[1], "0.0,0.0,apical");
        assert_eq!(lines[2], "1.0,0.0,apical");
        assert_eq!(lines[3], ",,apical");
        assert_eq!(lines[4], "0.0,1.0,basal");
        assert_eq!(lines.len(), 7);
    }
}
