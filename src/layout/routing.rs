use crate::config::LayoutConfig;
use crate::geometry::{Point, Rect, clean_path, path_to_string};

// ── Hint selection ──────────────────────────────────────────────────
/// Layout hints this close to either endpoint x are not used as bend lanes.
const HINT_EDGE_EPSILON: f32 = 1.0;

// ── Candidate handling ──────────────────────────────────────────────
/// Bend lanes closer than this are the same candidate.
const CANDIDATE_MERGE_EPSILON: f32 = 1e-3;
/// Tolerance on the minimum-approach comparison.
const APPROACH_EPSILON: f32 = 1e-3;
/// Offsets below this are treated as "no approach offset".
const OFFSET_EPSILON: f32 = 1e-3;

/// One edge's routing inputs. `obstacles` is the pass-wide snapshot.
#[derive(Debug, Clone, Copy)]
pub struct RouteRequest<'a> {
    pub source: Point,
    pub target: Point,
    pub hints: &'a [Point],
    pub obstacles: &'a [Rect],
    pub preferred_bend_x: Option<f32>,
    pub approach_offset: f32,
}

impl<'a> RouteRequest<'a> {
    pub fn new(source: Point, target: Point, obstacles: &'a [Rect]) -> Self {
        Self {
            source,
            target,
            hints: &[],
            obstacles,
            preferred_bend_x: None,
            approach_offset: 0.0,
        }
    }

    fn has_offset(&self) -> bool {
        self.approach_offset.abs() > OFFSET_EPSILON
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutedPath {
    pub points: Vec<Point>,
    pub path: String,
    /// `false` when no candidate lane validated and the baseline was kept.
    pub validated: bool,
}

impl RoutedPath {
    fn from_points(points: &[Point], validated: bool) -> Self {
        let points = clean_path(points);
        let path = path_to_string(&points);
        Self {
            points,
            path,
            validated,
        }
    }

    /// Length of the last segment when it is horizontal, else 0.
    pub fn final_horizontal_run(&self) -> f32 {
        match self.points.as_slice() {
            [.., a, b] if (a.y - b.y).abs() <= f32::EPSILON => (b.x - a.x).abs(),
            _ => 0.0,
        }
    }
}

#[derive(Debug, Default)]
struct Evaluation {
    blockers: Vec<usize>,
    approach_ok: bool,
    lane_between_endpoints: bool,
}

impl Evaluation {
    fn is_valid(&self) -> bool {
        self.blockers.is_empty() && self.approach_ok && self.lane_between_endpoints
    }
}

/// Computes the orthogonal path for one edge. Never fails: when no probed
/// lane validates, the baseline shape is returned with `validated = false`.
pub fn route_edge(request: &RouteRequest<'_>, config: &LayoutConfig) -> RoutedPath {
    let source = request.source;
    let target = request.target;

    if (source.y - target.y).abs() <= f32::EPSILON && !request.has_offset() {
        return RoutedPath::from_points(&[source, target], true);
    }

    let padded: Vec<Rect> = request
        .obstacles
        .iter()
        .map(|rect| rect.expand(config.obstacle_padding))
        .collect();
    let endpoint_rects: Vec<bool> = padded
        .iter()
        .map(|rect| rect.contains(source) || rect.contains(target))
        .collect();
    let approach_x = approach_boundary(request, config);

    let baseline_x = baseline_bend_x(request);
    let baseline = candidate_shape(request, baseline_x, approach_x);
    let evaluation = evaluate(&baseline, request, &padded, &endpoint_rects, config);
    if evaluation.is_valid() {
        return RoutedPath::from_points(&baseline, true);
    }

    let lanes = probe_lanes(baseline_x, approach_x, &evaluation.blockers, &padded, config);
    tracing::trace!(
        baseline_x,
        candidates = lanes.len(),
        blockers = evaluation.blockers.len(),
        "probing bend lanes"
    );
    for lane in lanes {
        let points = candidate_shape(request, lane, approach_x);
        if evaluate(&points, request, &padded, &endpoint_rects, config).is_valid() {
            return RoutedPath::from_points(&points, true);
        }
    }

    tracing::debug!(
        baseline_x,
        source_x = source.x,
        source_y = source.y,
        target_x = target.x,
        target_y = target.y,
        "no valid bend lane; keeping baseline path"
    );
    RoutedPath::from_points(&baseline, false)
}

/// Merge hint first, then the first interior layout hint, then the midpoint.
fn baseline_bend_x(request: &RouteRequest<'_>) -> f32 {
    if let Some(x) = request.preferred_bend_x.filter(|x| x.is_finite()) {
        return x;
    }
    let lo = request.source.x.min(request.target.x) + HINT_EDGE_EPSILON;
    let hi = request.source.x.max(request.target.x) - HINT_EDGE_EPSILON;
    request
        .hints
        .iter()
        .map(|p| p.x)
        .find(|&x| x > lo && x < hi)
        .unwrap_or((request.source.x + request.target.x) / 2.0)
}

/// Vertical lane `min_approach` away from the target, on the side the edge
/// arrives from.
fn approach_boundary(request: &RouteRequest<'_>, config: &LayoutConfig) -> f32 {
    if request.source.x <= request.target.x {
        request.target.x - config.min_approach
    } else {
        request.target.x + config.min_approach
    }
}

fn candidate_shape(request: &RouteRequest<'_>, bend_x: f32, approach_x: f32) -> Vec<Point> {
    let source = request.source;
    let target = request.target;
    if request.has_offset() {
        let lane_y = target.y + request.approach_offset;
        vec![
            source,
            Point::new(bend_x, source.y),
            Point::new(bend_x, lane_y),
            Point::new(approach_x, lane_y),
            Point::new(approach_x, target.y),
            target,
        ]
    } else {
        vec![
            source,
            Point::new(bend_x, source.y),
            Point::new(bend_x, target.y),
            target,
        ]
    }
}

fn evaluate(
    points: &[Point],
    request: &RouteRequest<'_>,
    padded: &[Rect],
    endpoint_rects: &[bool],
    config: &LayoutConfig,
) -> Evaluation {
    let mut blockers: Vec<usize> = Vec::new();

    if points.len() > 2 {
        for &turn in &points[1..points.len() - 1] {
            for (idx, rect) in padded.iter().enumerate() {
                if rect.contains_strictly(turn) && !blockers.contains(&idx) {
                    blockers.push(idx);
                }
            }
        }
    }

    for segment in points.windows(2) {
        for (idx, rect) in padded.iter().enumerate() {
            if endpoint_rects[idx] || blockers.contains(&idx) {
                continue;
            }
            if rect.segment_crosses(segment[0], segment[1]) {
                blockers.push(idx);
            }
        }
    }

    // Endpoint rects skip the segment test; the lane must stay inside the
    // endpoints' span.
    let lo = request.source.x.min(request.target.x);
    let hi = request.source.x.max(request.target.x);
    let lane_between_endpoints = points
        .get(1)
        .is_none_or(|bend| bend.x >= lo - APPROACH_EPSILON && bend.x <= hi + APPROACH_EPSILON);

    let approach_ok = request.has_offset() || {
        let last_bend = points[points.len() - 2];
        (request.target.x - last_bend.x).abs() + APPROACH_EPSILON >= config.min_approach
    };

    Evaluation {
        blockers,
        approach_ok,
        lane_between_endpoints,
    }
}

/// Candidate bend lanes sorted nearest-first around `baseline_x`, ties broken
/// by value so the order is fully deterministic.
fn probe_lanes(
    baseline_x: f32,
    approach_x: f32,
    blockers: &[usize],
    padded: &[Rect],
    config: &LayoutConfig,
) -> Vec<f32> {
    let mut lanes: Vec<f32> = Vec::with_capacity(2 + blockers.len() * 2 + config.max_probe_steps * 2);
    lanes.push(baseline_x);
    lanes.push(approach_x);
    for &idx in blockers {
        let rect = &padded[idx];
        lanes.push(rect.x);
        lanes.push(rect.right());
    }
    if config.probe_step > 0.0 {
        for step in 1..=config.max_probe_steps {
            let delta = config.probe_step * step as f32;
            lanes.push(baseline_x - delta);
            lanes.push(baseline_x + delta);
        }
    }
    lanes.retain(|x| x.is_finite());
    lanes.sort_by(|a, b| {
        (a - baseline_x)
            .abs()
            .total_cmp(&(b - baseline_x).abs())
            .then(a.total_cmp(b))
    });
    lanes.dedup_by(|a, b| (*a - *b).abs() <= CANDIDATE_MERGE_EPSILON);
    lanes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    fn turns(path: &RoutedPath) -> &[Point] {
        &path.points[1..path.points.len() - 1]
    }

    #[test]
    fn same_row_is_straight_even_through_obstacles() {
        let config = LayoutConfig::default();
        let obstacles = [Rect::new(150.0, 0.0, 40.0, 40.0)];
        let hints = [p(170.0, 90.0)];
        let request = RouteRequest {
            hints: &hints,
            preferred_bend_x: Some(160.0),
            ..RouteRequest::new(p(100.0, 20.0), p(300.0, 20.0), &obstacles)
        };
        let routed = route_edge(&request, &config);
        assert_eq!(routed.points, vec![p(100.0, 20.0), p(300.0, 20.0)]);
        assert_eq!(routed.path, "M 100,20 L 300,20");
    }

    #[test]
    fn short_final_run_is_nudged_to_min_approach() {
        let config = LayoutConfig::default();
        let hints = [p(298.0, 20.0)];
        let request = RouteRequest {
            hints: &hints,
            ..RouteRequest::new(p(100.0, 20.0), p(300.0, 140.0), &[])
        };
        let routed = route_edge(&request, &config);
        assert_eq!(routed.points.len(), 4);
        assert!(routed.validated);
        assert!(routed.final_horizontal_run() >= config.min_approach);
        assert_eq!(routed.points[1], p(280.0, 20.0));
    }

    #[test]
    fn blocking_rect_on_lane_moves_bend_outside_padding() {
        let config = LayoutConfig::default();
        let blocker = Rect::new(280.0, 130.0, 40.0, 40.0);
        let obstacles = [blocker];
        let request = RouteRequest::new(p(100.0, 50.0), p(500.0, 250.0), &obstacles);
        let routed = route_edge(&request, &config);
        assert!(routed.validated);
        assert_eq!(routed.points.len(), 4);
        assert_eq!(turns(&routed).len(), 2);
        let bend_x = routed.points[1].x;
        let pad = config.obstacle_padding;
        assert!(bend_x <= blocker.x - pad + 1e-3 || bend_x >= blocker.right() + pad - 1e-3);
        assert_eq!(routed.points[1].x, routed.points[2].x);
    }

    #[test]
    fn clear_midpoint_baseline_is_kept() {
        let config = LayoutConfig::default();
        let request = RouteRequest::new(p(0.0, 0.0), p(200.0, 100.0), &[]);
        let routed = route_edge(&request, &config);
        assert_eq!(routed.path, "M 0,0 L 100,0 L 100,100 L 200,100");
    }

    #[test]
    fn merge_hint_is_used_as_baseline() {
        let config = LayoutConfig::default();
        let hints = [p(60.0, 0.0)];
        let request = RouteRequest {
            hints: &hints,
            preferred_bend_x: Some(150.0),
            ..RouteRequest::new(p(0.0, 0.0), p(200.0, 100.0), &[])
        };
        let routed = route_edge(&request, &config);
        assert_eq!(routed.points[1].x, 150.0);
    }

    #[test]
    fn hints_on_endpoint_columns_are_ignored() {
        let config = LayoutConfig::default();
        let hints = [p(0.5, 0.0), p(199.5, 100.0)];
        let request = RouteRequest {
            hints: &hints,
            ..RouteRequest::new(p(0.0, 0.0), p(200.0, 100.0), &[])
        };
        let routed = route_edge(&request, &config);
        assert_eq!(routed.points[1].x, 100.0);
    }

    #[test]
    fn approach_offset_adds_two_bends() {
        let config = LayoutConfig::default();
        let request = RouteRequest {
            approach_offset: 12.0,
            ..RouteRequest::new(p(0.0, 0.0), p(200.0, 100.0), &[])
        };
        let routed = route_edge(&request, &config);
        assert_eq!(
            routed.points,
            vec![
                p(0.0, 0.0),
                p(100.0, 0.0),
                p(100.0, 112.0),
                p(180.0, 112.0),
                p(180.0, 100.0),
                p(200.0, 100.0),
            ]
        );
    }

    #[test]
    fn approach_offset_on_same_row_still_bends() {
        let config = LayoutConfig::default();
        let request = RouteRequest {
            approach_offset: -10.0,
            ..RouteRequest::new(p(0.0, 50.0), p(200.0, 50.0), &[])
        };
        let routed = route_edge(&request, &config);
        assert!(routed.points.len() > 2);
        assert_eq!(routed.points.last(), Some(&p(200.0, 50.0)));
    }

    #[test]
    fn unroutable_edge_falls_back_to_baseline() {
        let mut config = LayoutConfig::default();
        config.max_probe_steps = 2;
        // A wall across every lane, with posts closing off the far detours.
        let obstacles = [
            Rect::new(-2000.0, 30.0, 4000.0, 20.0),
            Rect::new(-1000.0, -20.0, 100.0, 40.0),
            Rect::new(1100.0, -20.0, 100.0, 40.0),
        ];
        let request = RouteRequest::new(p(0.0, 0.0), p(200.0, 100.0), &obstacles);
        let routed = route_edge(&request, &config);
        assert!(!routed.validated);
        assert_eq!(routed.path, "M 0,0 L 100,0 L 100,100 L 200,100");
    }

    #[test]
    fn near_same_row_keeps_orthogonal_segments() {
        let config = LayoutConfig::default();
        let request = RouteRequest::new(p(0.0, 0.0), p(200.0, 0.3), &[]);
        let routed = route_edge(&request, &config);
        assert!(routed.validated);
        assert_eq!(routed.points.first(), Some(&p(0.0, 0.0)));
        assert_eq!(routed.points.last(), Some(&p(200.0, 0.3)));
        for pair in routed.points.windows(2) {
            assert!(
                pair[0].x == pair[1].x || pair[0].y == pair[1].y,
                "diagonal segment {:?} -> {:?}",
                pair[0],
                pair[1]
            );
        }
        assert!(routed.final_horizontal_run() >= config.min_approach);
    }

    #[test]
    fn lanes_behind_the_source_are_rejected() {
        let config = LayoutConfig::default();
        // The wall covers every lane between the endpoints; only lanes left of
        // the source (through its own node) would clear it.
        let obstacles = [
            Rect::new(0.0, 0.0, 100.0, 40.0),
            Rect::new(90.0, 40.0, 220.0, 80.0),
            Rect::new(300.0, 120.0, 100.0, 40.0),
        ];
        let request = RouteRequest::new(p(100.0, 20.0), p(300.0, 140.0), &obstacles);
        let routed = route_edge(&request, &config);
        assert!(!routed.validated);
        for &turn in turns(&routed) {
            assert!(turn.x >= 100.0 && turn.x <= 300.0, "turn {turn:?} outside the span");
        }
    }

    #[test]
    fn endpoint_rects_do_not_block_their_own_edge() {
        let config = LayoutConfig::default();
        let source_rect = Rect::new(0.0, 0.0, 100.0, 40.0);
        let target_rect = Rect::new(200.0, 100.0, 100.0, 40.0);
        let obstacles = [source_rect, target_rect];
        let request = RouteRequest::new(p(100.0, 20.0), p(200.0, 120.0), &obstacles);
        let routed = route_edge(&request, &config);
        assert!(routed.validated);
        assert_eq!(routed.points[1].x, 150.0);
    }

    #[test]
    fn routing_is_idempotent() {
        let config = LayoutConfig::default();
        let obstacles = [Rect::new(140.0, 40.0, 60.0, 30.0), Rect::new(260.0, 90.0, 60.0, 30.0)];
        let hints = [p(150.0, 10.0), p(150.0, 200.0)];
        let request = RouteRequest {
            hints: &hints,
            ..RouteRequest::new(p(40.0, 10.0), p(420.0, 200.0), &obstacles)
        };
        let first = route_edge(&request, &config);
        let second = route_edge(&request, &config);
        assert_eq!(first, second);
        assert_eq!(clean_path(&first.points), first.points);
    }

    #[test]
    fn validated_turns_stay_clear_of_padded_obstacles() {
        let config = LayoutConfig::default();
        let pad = config.obstacle_padding;
        // Small deterministic LCG so the sweep covers many layouts.
        let mut seed: u32 = 0x2545_f491;
        let mut next = move || {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (seed >> 8) as f32 / (1u32 << 24) as f32
        };
        for _ in 0..200 {
            let obstacles: Vec<Rect> = (0..4)
                .map(|_| Rect::new(80.0 + next() * 300.0, next() * 300.0, 40.0, 30.0))
                .collect();
            let source = p(40.0, next() * 300.0);
            let target = p(480.0, next() * 300.0);
            if (source.y - target.y).abs() < 1.0 {
                continue;
            }
            let request = RouteRequest::new(source, target, &obstacles);
            let routed = route_edge(&request, &config);
            if !routed.validated || routed.points.len() <= 2 {
                continue;
            }
            for &turn in turns(&routed) {
                for rect in &obstacles {
                    assert!(
                        !rect.expand(pad).contains_strictly(turn),
                        "turn {:?} inside padded {:?}",
                        turn,
                        rect
                    );
                }
            }
            assert!(routed.final_horizontal_run() + 1e-3 >= config.min_approach);
        }
    }
}
