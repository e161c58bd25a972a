use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Config;
use crate::ir::{DependencyStatus, Task};
use crate::layout::{
    DagreLayered, EdgeRouteInput, GraphLayout, LayeredLayout, RoutedPath, apply_merge_hints,
    compute_graph_layout_with, route_edge,
};
use crate::model::{GraphModel, build_graph_model};
use crate::output::{RenderEdge, RenderGraph, RenderNode};
use crate::theme::{EdgeStroke, ThemeMode, edge_stroke};

/// How often each stage actually ran, for checking the caches do their job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub layout_runs: usize,
    pub route_runs: usize,
    pub style_runs: usize,
}

#[derive(Debug, Clone)]
struct StyleSet {
    blocked: EdgeStroke,
    unblocked: EdgeStroke,
    failed: EdgeStroke,
}

impl StyleSet {
    fn get(&self, status: DependencyStatus) -> &EdgeStroke {
        match status {
            DependencyStatus::Blocked => &self.blocked,
            DependencyStatus::Unblocked => &self.unblocked,
            DependencyStatus::Failed => &self.failed,
        }
    }
}

/// Bit-exact fingerprint of everything that feeds one routing call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RouteKey {
    generation: u64,
    bits: Vec<u32>,
}

impl RouteKey {
    fn new(generation: u64, edge: &EdgeRouteInput) -> Self {
        let mut bits = Vec::with_capacity(7 + edge.hints.len() * 2);
        bits.extend([
            edge.source_point.x.to_bits(),
            edge.source_point.y.to_bits(),
            edge.target_point.x.to_bits(),
            edge.target_point.y.to_bits(),
            edge.approach_offset.to_bits(),
        ]);
        match edge.preferred_bend_x {
            Some(x) => bits.extend([1, x.to_bits()]),
            None => bits.push(0),
        }
        for hint in &edge.hints {
            bits.extend([hint.x.to_bits(), hint.y.to_bits()]);
        }
        Self { generation, bits }
    }
}

/// Staged layout: the layering step reruns only when the topology changes,
/// routes are reused while their positioned inputs are unchanged and strokes
/// are computed once per theme.
pub struct LayoutPipeline {
    config: Config,
    layering: Box<dyn LayeredLayout>,
    layout: Option<(u64, Arc<GraphLayout>)>,
    generation: u64,
    routes: HashMap<RouteKey, RoutedPath>,
    styles: HashMap<ThemeMode, StyleSet>,
    stats: PipelineStats,
}

impl Default for LayoutPipeline {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl LayoutPipeline {
    pub fn new(config: Config) -> Self {
        Self::with_layering(config, Box::new(DagreLayered))
    }

    pub fn with_layering(config: Config, layering: Box<dyn LayeredLayout>) -> Self {
        Self {
            config,
            layering,
            layout: None,
            generation: 0,
            routes: HashMap::new(),
            styles: HashMap::new(),
            stats: PipelineStats::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replaces the config and drops every cached stage.
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
        self.invalidate();
    }

    pub fn invalidate(&mut self) {
        self.layout = None;
        self.routes.clear();
        self.styles.clear();
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Positioned layout for `model`, recomputed only when its topology
    /// fingerprint differs from the cached one.
    pub fn layout_for(&mut self, model: &GraphModel) -> Arc<GraphLayout> {
        let key = model.topology_key();
        if let Some((cached_key, layout)) = &self.layout {
            if *cached_key == key {
                return Arc::clone(layout);
            }
        }

        let mut layout = compute_graph_layout_with(model, &self.config.layout, self.layering.as_ref());
        apply_merge_hints(&mut layout.edges, &self.config.layout);
        let layout = Arc::new(layout);
        self.stats.layout_runs += 1;
        self.generation += 1;
        self.routes.clear();
        tracing::debug!(
            topology = key,
            generation = self.generation,
            "layout recomputed"
        );
        self.layout = Some((key, Arc::clone(&layout)));
        layout
    }

    fn route(&mut self, edge: &EdgeRouteInput) -> RoutedPath {
        let key = RouteKey::new(self.generation, edge);
        if let Some(routed) = self.routes.get(&key) {
            return routed.clone();
        }
        let routed = route_edge(&edge.request(), &self.config.layout);
        self.stats.route_runs += 1;
        self.routes.insert(key, routed.clone());
        routed
    }

    fn styles(&mut self, mode: ThemeMode) -> StyleSet {
        if let Some(styles) = self.styles.get(&mode) {
            return styles.clone();
        }
        let palette = self.config.palette(mode);
        let styles = StyleSet {
            blocked: edge_stroke(DependencyStatus::Blocked, palette),
            unblocked: edge_stroke(DependencyStatus::Unblocked, palette),
            failed: edge_stroke(DependencyStatus::Failed, palette),
        };
        self.stats.style_runs += 1;
        self.styles.insert(mode, styles.clone());
        styles
    }

    pub fn render(&mut self, tasks: &[Task], mode: ThemeMode) -> RenderGraph {
        let model = build_graph_model(tasks, &self.config.layout);
        let layout = self.layout_for(&model);
        let styles = self.styles(mode);

        let nodes = model
            .nodes
            .iter()
            .zip(&layout.nodes)
            .map(|(node, positioned)| RenderNode {
                id: node.id.clone(),
                task_name: node.task_name.clone(),
                status: node.status,
                x: positioned.x,
                y: positioned.y,
                width: positioned.width,
                height: positioned.height,
                source_side: positioned.source_side,
                target_side: positioned.target_side,
                has_upstream_deps: node.has_upstream_deps,
                has_downstream_deps: node.has_downstream_deps,
            })
            .collect();

        // Layout edges are in model emission order. Ids may collide, so pair
        // by position.
        let mut edges = Vec::with_capacity(model.edges.len());
        for (edge, input) in model.edges.iter().zip(&layout.edges) {
            debug_assert!(edge.source == input.source && edge.target == input.target);
            let routed = self.route(input);
            edges.push(RenderEdge {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                path: routed.path,
                points: routed.points,
                style: styles.get(edge.dependency_status).clone(),
                animated: edge.animated,
                dependency_status: edge.dependency_status,
            });
        }

        RenderGraph {
            width: layout.width,
            height: layout.height,
            nodes,
            edges,
        }
    }
}

/// One-shot convenience without caching across calls.
pub fn layout_tasks(tasks: &[Task], config: &Config, mode: ThemeMode) -> RenderGraph {
    LayoutPipeline::new(config.clone()).render(tasks, mode)
}
