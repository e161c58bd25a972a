use serde::{Deserialize, Serialize};

/// Points closer than this on both axes are treated as the same vertex.
pub const POINT_EPSILON: f32 = 0.5;
/// Cross-product tolerance for the collinearity test.
const COLLINEAR_EPSILON: f32 = 1e-3;
/// Coordinate tolerance for calling a segment horizontal or vertical.
const AXIS_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn approx_eq(self, other: Point, epsilon: f32) -> bool {
        (self.x - other.x).abs() <= epsilon && (self.y - other.y).abs() <= epsilon
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle, `x`/`y` being the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
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

    pub fn expand(&self, pad: f32) -> Rect {
        Rect::new(
            self.x - pad,
            self.y - pad,
            self.width + pad * 2.0,
            self.height + pad * 2.0,
        )
    }

    /// Inclusive containment: points on the border count.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Strict containment: points on the border do not count.
    pub fn contains_strictly(&self, point: Point) -> bool {
        point.x > self.x && point.x < self.right() && point.y > self.y && point.y < self.bottom()
    }

    /// Whether the segment `a`-`b` passes through the open interior of the rect.
    ///
    /// Segments running along the border are not considered crossing. Only
    /// axis-aligned segments are evaluated exactly; diagonal segments are tested
    /// by their bounding box, which is conservative.
    pub fn segment_crosses(&self, a: Point, b: Point) -> bool {
        let min_x = a.x.min(b.x);
        let max_x = a.x.max(b.x);
        let min_y = a.y.min(b.y);
        let max_y = a.y.max(b.y);
        let x_hit = if max_x - min_x <= f32::EPSILON {
            min_x > self.x && min_x < self.right()
        } else {
            min_x < self.right() && max_x > self.x
        };
        let y_hit = if max_y - min_y <= f32::EPSILON {
            min_y > self.y && min_y < self.bottom()
        } else {
            min_y < self.bottom() && max_y > self.y
        };
        x_hit && y_hit
    }
}

/// Whether `a`-`b` is horizontal or vertical.
pub fn is_axis_aligned(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() <= AXIS_EPSILON || (a.y - b.y).abs() <= AXIS_EPSILON
}

pub fn is_collinear(a: Point, b: Point, c: Point) -> bool {
    let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
    cross.abs() <= COLLINEAR_EPSILON
}

pub fn dedupe_consecutive(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &point in points {
        if out.last() != Some(&point) {
            out.push(point);
        }
    }
    out
}

/// Drops vertices within `epsilon` of the previously kept one. The final point
/// always survives: a near-duplicate of the last kept vertex replaces it
/// instead of being dropped, unless that vertex is the path start. A vertex is
/// only dropped when its neighbours stay axis-aligned, so orthogonal input
/// stays orthogonal.
pub fn dedupe_near(points: &[Point], epsilon: f32) -> Vec<Point> {
    let Some((&last, rest)) = points.split_last() else {
        return Vec::new();
    };
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for (idx, &point) in rest.iter().enumerate() {
        let next = points[idx + 1];
        match out.last().copied() {
            Some(prev) if prev.approx_eq(point, epsilon) && is_axis_aligned(prev, next) => {}
            _ => out.push(point),
        }
    }
    let len = out.len();
    match out.last().copied() {
        None => out.push(last),
        Some(prev)
            if prev.approx_eq(last, epsilon)
                && len > 1
                && is_axis_aligned(out[len - 2], last) =>
        {
            out.pop();
            out.push(last);
        }
        Some(prev) if prev.approx_eq(last, epsilon) && len == 1 => {}
        Some(_) => out.push(last),
    }
    out
}

/// Collapses every run of three or more collinear points to its endpoints.
pub fn simplify_collinear(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &point in points {
        while out.len() >= 2 && is_collinear(out[out.len() - 2], out[out.len() - 1], point) {
            out.pop();
        }
        out.push(point);
    }
    out
}

pub fn clean_path(points: &[Point]) -> Vec<Point> {
    let deduped = dedupe_near(&dedupe_consecutive(points), POINT_EPSILON);
    simplify_collinear(&deduped)
}

pub fn path_to_string(points: &[Point]) -> String {
    let mut out = String::with_capacity(points.len() * 16);
    for (idx, point) in points.iter().enumerate() {
        if idx > 0 {
            out.push(' ');
        }
        out.push(if idx == 0 { 'M' } else { 'L' });
        out.push(' ');
        out.push_str(&format_coord(point.x));
        out.push(',');
        out.push_str(&format_coord(point.y));
    }
    out
}

fn format_coord(value: f32) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    // Normalizes -0.0 so the string stays byte-stable.
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{}", rounded)
}
