use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};

use dagre_rust::{
    GraphConfig as DagreConfig, GraphEdge as DagreEdge, GraphNode as DagreNode,
    layout as dagre_layout,
};
use graphlib_rust::{Graph as DagreGraph, GraphOption};

use crate::geometry::Point;

/// Sizes and edges handed to a layering algorithm. Edges index into `sizes`.
#[derive(Debug, Clone, Copy)]
pub struct LayerInput<'a> {
    pub sizes: &'a [(f32, f32)],
    pub edges: &'a [(usize, usize)],
    pub rank_spacing: f32,
    pub node_spacing: f32,
}

/// Node centers plus one suggested polyline per input edge, in the
/// algorithm's own coordinate space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayeredOutput {
    pub centers: Vec<Point>,
    pub edge_points: Vec<Vec<Point>>,
}

impl LayeredOutput {
    fn is_usable(&self, node_count: usize, edge_count: usize) -> bool {
        self.centers.len() == node_count
            && self.edge_points.len() == edge_count
            && self.centers.iter().all(|p| p.x.is_finite() && p.y.is_finite())
    }
}

/// Left-to-right layered layout of a DAG.
pub trait LayeredLayout {
    /// Returns `None` when the algorithm could not place every node.
    fn run(&self, input: &LayerInput<'_>) -> Option<LayeredOutput>;
}

/// Sugiyama layering through `dagre_rust`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DagreLayered;

impl LayeredLayout for DagreLayered {
    fn run(&self, input: &LayerInput<'_>) -> Option<LayeredOutput> {
        if input.sizes.is_empty() {
            return Some(LayeredOutput::default());
        }

        let mut dagre_graph: DagreGraph<DagreConfig, DagreNode, DagreEdge> =
            DagreGraph::new(Some(GraphOption {
                directed: Some(true),
                multigraph: Some(false),
                compound: Some(false),
            }));

        let mut graph_config = DagreConfig::default();
        graph_config.rankdir = Some("lr".to_string());
        graph_config.nodesep = Some(input.node_spacing);
        graph_config.ranksep = Some(input.rank_spacing);
        graph_config.marginx = Some(0.0);
        graph_config.marginy = Some(0.0);
        dagre_graph.set_graph(graph_config);

        let ids: Vec<String> = (0..input.sizes.len()).map(|idx| idx.to_string()).collect();
        for (idx, &(width, height)) in input.sizes.iter().enumerate() {
            let mut node = DagreNode::default();
            node.width = width;
            node.height = height;
            node.order = Some(idx);
            dagre_graph.set_node(ids[idx].clone(), Some(node));
        }

        let mut edge_set: HashSet<(usize, usize)> = HashSet::new();
        for &(from, to) in input.edges {
            if from >= ids.len() || to >= ids.len() || from == to {
                continue;
            }
            if !edge_set.insert((from, to)) {
                continue;
            }
            let _ = dagre_graph.set_edge(&ids[from], &ids[to], Some(DagreEdge::default()), None);
        }

        dagre_layout::run_layout(&mut dagre_graph);

        let mut centers = Vec::with_capacity(ids.len());
        for id in &ids {
            let dagre_node = dagre_graph.node(id)?;
            centers.push(Point::new(dagre_node.x, dagre_node.y));
        }

        let edge_points = input
            .edges
            .iter()
            .zip(gap_hints(&centers, input))
            .map(|(&(from, to), fallback)| {
                let (Some(v), Some(w)) = (ids.get(from), ids.get(to)) else {
                    return fallback;
                };
                let points: Vec<Point> = dagre_graph
                    .edge(v, w, None)
                    .and_then(|edge| edge.points.as_ref())
                    .map(|points| {
                        points
                            .iter()
                            .map(|p| Point::new(p.x, p.y))
                            .filter(|p| p.x.is_finite() && p.y.is_finite())
                            .collect()
                    })
                    .unwrap_or_default();
                if points.is_empty() { fallback } else { points }
            })
            .collect();
        let output = LayeredOutput {
            centers,
            edge_points,
        };
        output
            .is_usable(input.sizes.len(), input.edges.len())
            .then_some(output)
    }
}

/// Longest-path ranks with median ordering inside each rank. No external
/// dependency; used as fallback and for fully predictable coordinates.
#[derive(Debug, Clone, Copy)]
pub struct LongestPathLayered {
    pub order_passes: usize,
}

impl Default for LongestPathLayered {
    fn default() -> Self {
        Self { order_passes: 4 }
    }
}

impl LayeredLayout for LongestPathLayered {
    fn run(&self, input: &LayerInput<'_>) -> Option<LayeredOutput> {
        let count = input.sizes.len();
        if count == 0 {
            return Some(LayeredOutput::default());
        }
        let ranks = compute_ranks(count, input.edges);
        let rank_count = ranks.iter().copied().max().unwrap_or(0) + 1;

        let mut rank_nodes: Vec<Vec<usize>> = vec![Vec::new(); rank_count];
        for (idx, &rank) in ranks.iter().enumerate() {
            rank_nodes[rank].push(idx);
        }
        order_rank_nodes(&mut rank_nodes, count, input.edges, self.order_passes);

        let mut rank_x = Vec::with_capacity(rank_count);
        let mut cursor = 0.0f32;
        for bucket in &rank_nodes {
            let width = bucket
                .iter()
                .map(|&idx| input.sizes[idx].0)
                .fold(0.0f32, f32::max);
            rank_x.push(cursor + width / 2.0);
            cursor += width + input.rank_spacing;
        }

        let mut centers = vec![Point::default(); count];
        for (rank, bucket) in rank_nodes.iter().enumerate() {
            let total: f32 = bucket.iter().map(|&idx| input.sizes[idx].1).sum::<f32>()
                + input.node_spacing * bucket.len().saturating_sub(1) as f32;
            let mut y = -total / 2.0;
            for &idx in bucket {
                let height = input.sizes[idx].1;
                centers[idx] = Point::new(rank_x[rank], y + height / 2.0);
                y += height + input.node_spacing;
            }
        }

        let edge_points = gap_hints(&centers, input);

        Some(LayeredOutput {
            centers,
            edge_points,
        })
    }
}

/// Suggested polyline per edge whose vertical lane sits in the middle of the
/// rank gap right after the source. Dagre uses it for edges it returned no
/// points for.
fn gap_hints(centers: &[Point], input: &LayerInput<'_>) -> Vec<Vec<Point>> {
    input
        .edges
        .iter()
        .map(|&(from, to)| {
            let (Some(source), Some(target)) = (centers.get(from), centers.get(to)) else {
                return Vec::new();
            };
            let half_width = input.sizes[from].0 / 2.0;
            let gap_x = source.x + half_width + input.rank_spacing / 2.0;
            vec![
                Point::new(source.x + half_width, source.y),
                Point::new(gap_x, source.y),
                Point::new(gap_x, target.y),
                Point::new(target.x - input.sizes[to].0 / 2.0, target.y),
            ]
        })
        .collect()
}

fn compute_ranks(count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut indeg = vec![0usize; count];
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); count];
    for &(from, to) in edges {
        if from < count && to < count && from != to {
            adj[from].push(to);
            indeg[to] += 1;
        }
    }

    let mut queue: VecDeque<usize> = (0..count).filter(|&idx| indeg[idx] == 0).collect();
    let mut ranks = vec![0usize; count];
    let mut visited = 0usize;
    while let Some(node) = queue.pop_front() {
        visited += 1;
        for &next in &adj[node] {
            ranks[next] = ranks[next].max(ranks[node] + 1);
            indeg[next] -= 1;
            if indeg[next] == 0 {
                queue.push_back(next);
            }
        }
    }
    if visited < count {
        tracing::debug!(
            unvisited = count - visited,
            "cycle in layering input; leftover nodes keep partial ranks"
        );
    }
    ranks
}

fn order_rank_nodes(
    rank_nodes: &mut [Vec<usize>],
    count: usize,
    edges: &[(usize, usize)],
    passes: usize,
) {
    if rank_nodes.len() <= 1 {
        return;
    }
    let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); count];
    for &(from, to) in edges {
        if from < count && to < count {
            outgoing[from].push(to);
            incoming[to].push(from);
        }
    }

    let mut positions = vec![0usize; count];
    update_positions(rank_nodes, &mut positions);

    for _ in 0..passes.max(1) {
        for rank in 1..rank_nodes.len() {
            if rank_nodes[rank].len() > 1 {
                sort_bucket(&mut rank_nodes[rank], &incoming, &positions);
                update_positions(rank_nodes, &mut positions);
            }
        }
        for rank in (0..rank_nodes.len() - 1).rev() {
            if rank_nodes[rank].len() > 1 {
                sort_bucket(&mut rank_nodes[rank], &outgoing, &positions);
                update_positions(rank_nodes, &mut positions);
            }
        }
    }
}

fn update_positions(rank_nodes: &[Vec<usize>], positions: &mut [usize]) {
    for bucket in rank_nodes {
        for (pos, &idx) in bucket.iter().enumerate() {
            positions[idx] = pos;
        }
    }
}

fn sort_bucket(bucket: &mut [usize], neighbors: &[Vec<usize>], positions: &[usize]) {
    bucket.sort_by(|&a, &b| {
        let a_score = median_position(a, neighbors, positions);
        let b_score = median_position(b, neighbors, positions);
        match a_score.partial_cmp(&b_score) {
            Some(Ordering::Equal) | None => positions[a].cmp(&positions[b]).then(a.cmp(&b)),
            Some(ordering) => ordering,
        }
    });
}

fn median_position(node: usize, neighbors: &[Vec<usize>], positions: &[usize]) -> f32 {
    let mut values: Vec<usize> = neighbors[node].iter().map(|&n| positions[n]).collect();
    if values.is_empty() {
        return positions[node] as f32;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid] as f32
    } else {
        (values[mid - 1] + values[mid]) as f32 / 2.0
    }
}
