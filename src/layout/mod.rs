pub mod merge;
pub mod ranking;
pub mod routing;

use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::geometry::{Point, Rect};
use crate::model::GraphModel;

pub use merge::{apply_merge_hints, approach_offsets, merge_hints};
pub use ranking::{DagreLayered, LayerInput, LayeredLayout, LayeredOutput, LongestPathLayered};
pub use routing::{RouteRequest, RoutedPath, route_edge};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionSide {
    Left,
    Right,
    Top,
    Bottom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionedNode {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub source_side: ConnectionSide,
    pub target_side: ConnectionSide,
}

impl PositionedNode {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn anchor(&self, side: ConnectionSide) -> Point {
        match side {
            ConnectionSide::Left => Point::new(self.x, self.y + self.height / 2.0),
            ConnectionSide::Right => Point::new(self.x + self.width, self.y + self.height / 2.0),
            ConnectionSide::Top => Point::new(self.x + self.width / 2.0, self.y),
            ConnectionSide::Bottom => Point::new(self.x + self.width / 2.0, self.y + self.height),
        }
    }
}

/// Node rectangles captured once per layout pass. Cloning shares the same
/// allocation, so every edge of a pass routes against the identical list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObstacleSnapshot(Arc<[Rect]>);

impl ObstacleSnapshot {
    pub fn new(rects: Vec<Rect>) -> Self {
        Self(rects.into())
    }

    pub fn rects(&self) -> &[Rect] {
        &self.0
    }

    pub fn ptr_eq(&self, other: &ObstacleSnapshot) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for ObstacleSnapshot {
    type Target = [Rect];

    fn deref(&self) -> &[Rect] {
        &self.0
    }
}

/// Everything the router needs for one edge, fixed by the layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRouteInput {
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_point: Point,
    pub target_point: Point,
    pub hints: Vec<Point>,
    pub obstacles: ObstacleSnapshot,
    pub preferred_bend_x: Option<f32>,
    pub approach_offset: f32,
}

impl EdgeRouteInput {
    pub fn request(&self) -> RouteRequest<'_> {
        RouteRequest {
            source: self.source_point,
            target: self.target_point,
            hints: &self.hints,
            obstacles: self.obstacles.rects(),
            preferred_bend_x: self.preferred_bend_x,
            approach_offset: self.approach_offset,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphLayout {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<EdgeRouteInput>,
    pub obstacles: ObstacleSnapshot,
    pub width: f32,
    pub height: f32,
}

pub fn compute_graph_layout(model: &GraphModel, config: &LayoutConfig) -> GraphLayout {
    compute_graph_layout_with(model, config, &DagreLayered)
}

/// Runs `layering`, falling back to [`LongestPathLayered`] when it cannot
/// place every node, then derives anchors, hints and the obstacle snapshot.
pub fn compute_graph_layout_with(
    model: &GraphModel,
    config: &LayoutConfig,
    layering: &dyn LayeredLayout,
) -> GraphLayout {
    if model.nodes.is_empty() {
        return GraphLayout::default();
    }

    let index = model.node_index();
    let sizes: Vec<(f32, f32)> = model.nodes.iter().map(|n| (n.width, n.height)).collect();
    let mut edge_pairs: Vec<(usize, usize)> = Vec::with_capacity(model.edges.len());
    let mut edge_refs = Vec::with_capacity(model.edges.len());
    for edge in &model.edges {
        let (Some(&from), Some(&to)) = (index.get(edge.source.as_str()), index.get(edge.target.as_str()))
        else {
            continue;
        };
        edge_pairs.push((from, to));
        edge_refs.push(edge);
    }

    let input = LayerInput {
        sizes: &sizes,
        edges: &edge_pairs,
        rank_spacing: config.rank_spacing,
        node_spacing: config.node_spacing,
    };
    let layered = match layering.run(&input) {
        Some(out) => out,
        None => {
            tracing::debug!("layering produced no usable positions; using longest-path fallback");
            LongestPathLayered::default()
                .run(&input)
                .unwrap_or_else(|| LayeredOutput {
                    centers: vec![Point::default(); sizes.len()],
                    edge_points: vec![Vec::new(); edge_pairs.len()],
                })
        }
    };

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    for (center, &(width, height)) in layered.centers.iter().zip(&sizes) {
        min_x = min_x.min(center.x - width / 2.0);
        min_y = min_y.min(center.y - height / 2.0);
    }
    let dx = config.margin - min_x;
    let dy = config.margin - min_y;

    let nodes: Vec<PositionedNode> = model
        .nodes
        .iter()
        .zip(&layered.centers)
        .map(|(node, center)| PositionedNode {
            id: node.id.clone(),
            x: center.x - node.width / 2.0 + dx,
            y: center.y - node.height / 2.0 + dy,
            width: node.width,
            height: node.height,
            source_side: ConnectionSide::Right,
            target_side: ConnectionSide::Left,
        })
        .collect();

    let obstacles = ObstacleSnapshot::new(nodes.iter().map(PositionedNode::rect).collect());
    let width = nodes
        .iter()
        .map(|n| n.x + n.width)
        .fold(0.0f32, f32::max)
        + config.margin;
    let height = nodes
        .iter()
        .map(|n| n.y + n.height)
        .fold(0.0f32, f32::max)
        + config.margin;

    let edges = edge_refs
        .iter()
        .zip(&edge_pairs)
        .enumerate()
        .map(|(idx, (edge, &(from, to)))| {
            let source = &nodes[from];
            let target = &nodes[to];
            let hints = layered
                .edge_points
                .get(idx)
                .map(|points| {
                    points
                        .iter()
                        .map(|p| Point::new(p.x + dx, p.y + dy))
                        .collect()
                })
                .unwrap_or_default();
            EdgeRouteInput {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                source_point: source.anchor(source.source_side),
                target_point: target.anchor(target.target_side),
                hints,
                obstacles: obstacles.clone(),
                preferred_bend_x: None,
                approach_offset: 0.0,
            }
        })
        .collect();

    tracing::debug!(
        nodes = nodes.len(),
        edges = edge_pairs.len(),
        width,
        height,
        "computed graph layout"
    );

    GraphLayout {
        nodes,
        edges,
        obstacles,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Task, TaskStatus};
    use crate::model::build_graph_model;

    fn sample_model(config: &LayoutConfig) -> GraphModel {
        let tasks = vec![
            Task::new("1", "a", TaskStatus::Completed),
            Task::new("2", "b", TaskStatus::Running).with_deps(["a"]),
            Task::new("3", "c", TaskStatus::Pending).with_deps(["a", "b"]),
            Task::new("4", "d", TaskStatus::Pending).with_deps(["a"]),
        ];
        build_graph_model(&tasks, config)
    }

    #[test]
    fn every_edge_shares_one_snapshot() {
        let config = LayoutConfig::default();
        let layout = compute_graph_layout_with(&sample_model(&config), &config, &LongestPathLayered::default());
        assert_eq!(layout.edges.len(), 4);
        assert_eq!(layout.obstacles.len(), 4);
        assert!(layout.edges.iter().all(|e| e.obstacles.ptr_eq(&layout.obstacles)));
    }

    #[test]
    fn anchors_sit_on_connection_sides() {
        let config = LayoutConfig::default();
        let layout = compute_graph_layout_with(&sample_model(&config), &config, &LongestPathLayered::default());
        for edge in &layout.edges {
            let source = layout.nodes.iter().find(|n| n.id == edge.source).unwrap();
            let target = layout.nodes.iter().find(|n| n.id == edge.target).unwrap();
            assert_eq!(edge.source_point.x, source.x + source.width);
            assert_eq!(edge.target_point.x, target.x);
            assert!(edge.source_point.x < edge.target_point.x);
        }
    }

    #[test]
    fn layout_is_translated_into_margin() {
        let config = LayoutConfig::default();
        let layout = compute_graph_layout_with(&sample_model(&config), &config, &LongestPathLayered::default());
        let min_x = layout.nodes.iter().map(|n| n.x).fold(f32::INFINITY, f32::min);
        let min_y = layout.nodes.iter().map(|n| n.y).fold(f32::INFINITY, f32::min);
        assert!((min_x - config.margin).abs() < 1e-3);
        assert!((min_y - config.margin).abs() < 1e-3);
        assert!(layout.width > min_x);
    }

    #[test]
    fn failing_layering_falls_back() {
        struct Broken;
        impl LayeredLayout for Broken {
            fn run(&self, _input: &LayerInput<'_>) -> Option<LayeredOutput> {
                None
            }
        }
        let config = LayoutConfig::default();
        let layout = compute_graph_layout_with(&sample_model(&config), &config, &Broken);
        assert_eq!(layout.nodes.len(), 4);
        assert!(layout.nodes.iter().all(|n| n.x.is_finite() && n.y.is_finite()));
    }

    #[test]
    fn empty_model_yields_empty_layout() {
        let layout = compute_graph_layout(&GraphModel::default(), &LayoutConfig::default());
        assert!(layout.nodes.is_empty());
        assert!(layout.edges.is_empty());
    }
}
