use crate::geometry::{COORD_EPS, Point};

/// SVG `d` attribute made of moveto/lineto commands.
pub fn points_to_path(points: &[Point]) -> String {
    if points.is_empty() {
        return String::new();
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].x, points[0].y));
    for point in points.iter().skip(1) {
        d.push_str(&format!(" L {:.2} {:.2}", point.x, point.y));
    }
    d
}

/// Same polyline with each interior corner replaced by a quadratic curve of
/// at most `radius`, clamped to half of the shorter adjacent segment.
pub fn points_to_rounded_path(points: &[Point], radius: f32) -> String {
    if points.len() < 3 || radius <= 0.0 {
        return points_to_path(points);
    }
    let mut d = String::new();
    d.push_str(&format!("M {:.2} {:.2}", points[0].x, points[0].y));
    for idx in 1..points.len() - 1 {
        let prev = points[idx - 1];
        let corner = points[idx];
        let next = points[idx + 1];
        let len_in = prev.manhattan(corner);
        let len_out = corner.manhattan(next);
        let r = radius.min(len_in / 2.0).min(len_out / 2.0);
        if r <= COORD_EPS {
            d.push_str(&format!(" L {:.2} {:.2}", corner.x, corner.y));
            continue;
        }
        let (in_x, in_y) = unit(prev, corner);
        let (out_x, out_y) = unit(corner, next);
        let before = Point::new(corner.x - in_x * r, corner.y - in_y * r);
        let after = Point::new(corner.x + out_x * r, corner.y + out_y * r);
        d.push_str(&format!(" L {:.2} {:.2}", before.x, before.y));
        d.push_str(&format!(
            " Q {:.2} {:.2} {:.2} {:.2}",
            corner.x, corner.y, after.x, after.y
        ));
    }
    let last = points[points.len() - 1];
    d.push_str(&format!(" L {:.2} {:.2}", last.x, last.y));
    d
}

fn unit(a: Point, b: Point) -> (f32, f32) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len <= COORD_EPS {
        (0.0, 0.0)
    } else {
        (dx / len, dy / len)
    }
}
