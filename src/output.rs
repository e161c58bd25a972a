use crate::error::Result;
use crate::geometry::Point;
use crate::ir::{DependencyStatus, TaskStatus};
use crate::layout::ConnectionSide;
use crate::theme::EdgeStroke;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    pub id: String,
    pub task_name: String,
    pub status: TaskStatus,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub source_side: ConnectionSide,
    pub target_side: ConnectionSide,
    pub has_upstream_deps: bool,
    pub has_downstream_deps: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub path: String,
    pub points: Vec<Point>,
    pub style: EdgeStroke,
    pub animated: bool,
    pub dependency_status: DependencyStatus,
}

/// Plain data handed to the diagram renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderGraph {
    pub width: f32,
    pub height: f32,
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
}

impl RenderGraph {
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

pub fn write_render_graph(path: Option<&Path>, graph: &RenderGraph, pretty: bool) -> Result<()> {
    match path {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            if pretty {
                serde_json::to_writer_pretty(&mut writer, graph)?;
            } else {
                serde_json::to_writer(&mut writer, graph)?;
            }
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(graph.to_json(pretty)?.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
