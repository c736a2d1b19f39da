use serde::{Deserialize, Serialize};

/// Tolerance used when comparing coordinates produced by the router.
pub const COORD_EPS: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn approx_eq(self, other: Point) -> bool {
        (self.x - other.x).abs() <= COORD_EPS && (self.y - other.y).abs() <= COORD_EPS
    }

    pub fn manhattan(self, other: Point) -> f32 {
        (other.x - self.x).abs() + (other.y - self.y).abs()
    }
}

/// Screen-space rectangle captured from one render pass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Square of side `size` sharing this rectangle's center.
    pub fn centered_square(&self, size: f32) -> Rect {
        let center = self.center();
        Rect::new(center.x - size / 2.0, center.y - size / 2.0, size, size)
    }

    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// Midpoint of the given side, where connectors attach.
    pub fn side_midpoint(&self, side: Side) -> Point {
        let c = self.center();
        match side {
            Side::Left => Point::new(self.x, c.y),
            Side::Right => Point::new(self.right(), c.y),
            Side::Top => Point::new(c.x, self.y),
            Side::Bottom => Point::new(c.x, self.bottom()),
        }
    }

    /// Strict interior test; points on the border are outside.
    pub fn contains_interior(&self, p: Point) -> bool {
        p.x > self.x && p.x < self.right() && p.y > self.y && p.y < self.bottom()
    }
}

/// Side of a node a connector leaves or enters through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    pub fn axis(self) -> Axis {
        match self {
            Side::Left | Side::Right => Axis::Horizontal,
            Side::Top | Side::Bottom => Axis::Vertical,
        }
    }

    /// Unit vector pointing away from the node.
    pub fn outward(self) -> (f32, f32) {
        match self {
            Side::Left => (-1.0, 0.0),
            Side::Right => (1.0, 0.0),
            Side::Top => (0.0, -1.0),
            Side::Bottom => (0.0, 1.0),
        }
    }

    pub fn offset(self, point: Point, length: f32) -> Point {
        let (dx, dy) = self.outward();
        Point::new(point.x + dx * length, point.y + dy * length)
    }
}

/// Axis of travel of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

pub fn segment_axis(a: Point, b: Point) -> Option<Axis> {
    let dx = (b.x - a.x).abs();
    let dy = (b.y - a.y).abs();
    if dx <= COORD_EPS && dy <= COORD_EPS {
        None
    } else if dy <= COORD_EPS {
        Some(Axis::Horizontal)
    } else if dx <= COORD_EPS {
        Some(Axis::Vertical)
    } else {
        None
    }
}

/// True when the segment passes through the interior of `rect`.
///
/// Axis-aligned segments are tested exactly; grazing a border or a corner
/// does not count. Diagonal segments fall back to sampling, which only
/// happens for degenerate input since the router emits orthogonal paths.
pub fn segment_crosses_rect(a: Point, b: Point, rect: &Rect) -> bool {
    if !rect.has_area() {
        return false;
    }
    match segment_axis(a, b) {
        Some(Axis::Horizontal) => {
            let y = a.y;
            if y <= rect.y || y >= rect.bottom() {
                return false;
            }
            let lo = a.x.min(b.x).max(rect.x);
            let hi = a.x.max(b.x).min(rect.right());
            hi - lo > COORD_EPS
        }
        Some(Axis::Vertical) => {
            let x = a.x;
            if x <= rect.x || x >= rect.right() {
                return false;
            }
            let lo = a.y.min(b.y).max(rect.y);
            let hi = a.y.max(b.y).min(rect.bottom());
            hi - lo > COORD_EPS
        }
        None if a.approx_eq(b) => rect.contains_interior(a),
        None => {
            let steps = ((a.manhattan(b) / 2.0).ceil() as usize).clamp(1, 512);
            (0..=steps).any(|i| {
                let t = i as f32 / steps as f32;
                rect.contains_interior(Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t))
            })
        }
    }
}

/// Number of (segment, obstacle) pairs where the path enters an obstacle.
pub fn path_obstacle_hits(points: &[Point], obstacles: &[Rect]) -> usize {
    if points.len() < 2 {
        return 0;
    }
    let mut count = 0usize;
    for segment in points.windows(2) {
        for obstacle in obstacles {
            if segment_crosses_rect(segment[0], segment[1], obstacle) {
                count += 1;
            }
        }
    }
    count
}

pub fn manhattan_length(points: &[Point]) -> f32 {
    points.windows(2).map(|s| s[0].manhattan(s[1])).sum()
}

pub fn bend_count(points: &[Point]) -> usize {
    if points.len() < 3 {
        return 0;
    }
    let mut bends = 0usize;
    for idx in 1..points.len() - 1 {
        let p0 = points[idx - 1];
        let p1 = points[idx];
        let p2 = points[idx + 1];
        let dx1 = p1.x - p0.x;
        let dy1 = p1.y - p0.y;
        let dx2 = p2.x - p1.x;
        let dy2 = p2.y - p1.y;
        if (dx1.abs() <= COORD_EPS && dy1.abs() <= COORD_EPS)
            || (dx2.abs() <= COORD_EPS && dy2.abs() <= COORD_EPS)
        {
            continue;
        }
        let cross = dx1 * dy2 - dy1 * dx2;
        if cross.abs() > COORD_EPS {
            bends += 1;
        }
    }
    bends
}

/// Drop duplicate points and interior points that continue a straight run.
/// Endpoints are always kept.
pub fn compress_path(points: &[Point]) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    out.push(points[0]);
    let last = points[points.len() - 1];
    for &curr in &points[1..points.len() - 1] {
        let prev = out[out.len() - 1];
        if curr.approx_eq(prev) {
            continue;
        }
        out.push(curr);
    }
    let tail = out.len() - 1;
    if out.len() > 1 && last.approx_eq(out[tail]) {
        out[tail] = last;
    } else {
        out.push(last);
    }

    // Second pass removes collinear middles now that duplicates are gone.
    let mut idx = 1;
    while out.len() > 2 && idx < out.len() - 1 {
        let prev = out[idx - 1];
        let curr = out[idx];
        let next = out[idx + 1];
        let dx1 = curr.x - prev.x;
        let dy1 = curr.y - prev.y;
        let dx2 = next.x - curr.x;
        let dy2 = next.y - curr.y;
        let straight = (dx1.abs() <= COORD_EPS && dx2.abs() <= COORD_EPS && dy1 * dy2 >= 0.0)
            || (dy1.abs() <= COORD_EPS && dy2.abs() <= COORD_EPS && dx1 * dx2 >= 0.0);
        if straight {
            out.remove(idx);
        } else {
            idx += 1;
        }
    }
    out
}

/// Midpoint of the longest segment, skipping the stubs at both ends when the
/// path has enough segments.
pub fn label_anchor(points: &[Point]) -> Option<Point> {
    if points.len() < 2 {
        return None;
    }
    let segment_count = points.len() - 1;
    let (start_idx, end_idx) = if segment_count >= 3 {
        (1, segment_count - 1)
    } else {
        (0, segment_count)
    };
    let mut best_idx = start_idx;
    let mut best_len = -1.0f32;
    for idx in start_idx..end_idx {
        let len = points[idx].manhattan(points[idx + 1]);
        if len > best_len {
            best_len = len;
            best_idx = idx;
        }
    }
    let p1 = points[best_idx];
    let p2 = points[best_idx + 1];
    Some(Point::new((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0))
}
