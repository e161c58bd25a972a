use std::collections::BTreeMap;

use crate::config::LayoutConfig;

use super::EdgeRouteInput;

fn group_by_target(edges: &[EdgeRouteInput]) -> BTreeMap<&str, Vec<usize>> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, edge) in edges.iter().enumerate() {
        groups.entry(edge.target.as_str()).or_default().push(idx);
    }
    groups
}

/// Shared bend lane per converging group: halfway between the rightmost
/// source and the target, capped at the approach boundary. Groups with a
/// single edge, sources right of the target, or no room for a lane get `None`.
pub fn merge_hints(edges: &[EdgeRouteInput], config: &LayoutConfig) -> Vec<Option<f32>> {
    let mut hints = vec![None; edges.len()];
    for members in group_by_target(edges).values() {
        if members.len() < 2 {
            continue;
        }
        let target_x = edges[members[0]].target_point.x;
        let rightmost = members
            .iter()
            .map(|&idx| edges[idx].source_point.x)
            .fold(f32::NEG_INFINITY, f32::max);
        if rightmost >= target_x {
            continue;
        }
        let lane = ((rightmost + target_x) / 2.0).min(target_x - config.min_approach);
        if lane <= rightmost {
            continue;
        }
        for &idx in members {
            hints[idx] = Some(lane);
        }
    }
    hints
}

/// Symmetric approach offsets for edges converging on one target, ordered by
/// source y. All zero when `fan_spacing` is not positive.
pub fn approach_offsets(edges: &[EdgeRouteInput], config: &LayoutConfig) -> Vec<f32> {
    let mut offsets = vec![0.0; edges.len()];
    if config.fan_spacing <= 0.0 {
        return offsets;
    }
    for members in group_by_target(edges).values() {
        if members.len() < 2 {
            continue;
        }
        let mut ordered = members.clone();
        ordered.sort_by(|&a, &b| {
            edges[a]
                .source_point
                .y
                .total_cmp(&edges[b].source_point.y)
                .then(a.cmp(&b))
        });
        let center = (ordered.len() - 1) as f32 / 2.0;
        for (slot, &idx) in ordered.iter().enumerate() {
            offsets[idx] = (slot as f32 - center) * config.fan_spacing;
        }
    }
    offsets
}

pub fn apply_merge_hints(edges: &mut [EdgeRouteInput], config: &LayoutConfig) {
    if config.merge_hints {
        let hints = merge_hints(edges, config);
        for (edge, hint) in edges.iter_mut().zip(hints) {
            edge.preferred_bend_x = hint;
        }
    }
    let offsets = approach_offsets(edges, config);
    for (edge, offset) in edges.iter_mut().zip(offsets) {
        edge.approach_offset = offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::layout::ObstacleSnapshot;

    fn edge(id: &str, target: &str, source_point: (f32, f32), target_point: (f32, f32)) -> EdgeRouteInput {
        EdgeRouteInput {
            id: id.to_string(),
            source: format!("src-{id}"),
            target: target.to_string(),
            source_point: Point::from(source_point),
            target_point: Point::from(target_point),
            hints: Vec::new(),
            obstacles: ObstacleSnapshot::default(),
            preferred_bend_x: None,
            approach_offset: 0.0,
        }
    }

    #[test]
    fn converging_edges_share_one_lane() {
        let config = LayoutConfig::default();
        let edges = vec![
            edge("a", "t", (100.0, 20.0), (300.0, 100.0)),
            edge("b", "t", (140.0, 180.0), (300.0, 100.0)),
            edge("c", "u", (100.0, 20.0), (300.0, 400.0)),
        ];
        let hints = merge_hints(&edges, &config);
        assert_eq!(hints[0], Some(220.0));
        assert_eq!(hints[1], Some(220.0));
        assert_eq!(hints[2], None);
    }

    #[test]
    fn lane_is_capped_at_approach_boundary() {
        let config = LayoutConfig::default();
        let edges = vec![
            edge("a", "t", (250.0, 20.0), (280.0, 100.0)),
            edge("b", "t", (200.0, 180.0), (280.0, 100.0)),
        ];
        // Midpoint 265 is capped to 260, still right of the rightmost source.
        assert_eq!(merge_hints(&edges, &config), vec![Some(260.0), Some(260.0)]);

        let crowded = vec![
            edge("a", "t", (270.0, 20.0), (280.0, 100.0)),
            edge("b", "t", (200.0, 180.0), (280.0, 100.0)),
        ];
        assert_eq!(merge_hints(&crowded, &config), vec![None, None]);
    }

    #[test]
    fn fan_offsets_are_symmetric_by_source_y() {
        let mut config = LayoutConfig::default();
        config.fan_spacing = 10.0;
        let edges = vec![
            edge("low", "t", (100.0, 300.0), (400.0, 150.0)),
            edge("high", "t", (100.0, 0.0), (400.0, 150.0)),
            edge("mid", "t", (100.0, 150.0), (400.0, 150.0)),
            edge("solo", "u", (100.0, 0.0), (400.0, 400.0)),
        ];
        assert_eq!(approach_offsets(&edges, &config), vec![10.0, -10.0, 0.0, 0.0]);
    }

    #[test]
    fn disabled_pass_leaves_edges_untouched() {
        let mut config = LayoutConfig::default();
        config.merge_hints = false;
        let mut edges = vec![
            edge("a", "t", (100.0, 20.0), (300.0, 100.0)),
            edge("b", "t", (140.0, 180.0), (300.0, 100.0)),
        ];
        apply_merge_hints(&mut edges, &config);
        assert!(edges.iter().all(|e| e.preferred_bend_x.is_none() && e.approach_offset == 0.0));
    }
}
