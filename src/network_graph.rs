//! Network graph for the network dispersal kernel: nodes snapped to grid
//! cells, symmetric adjacency, edges carrying an ordered polyline.
//!
//! Grounded in the data model's "Network graph" section and the CSV input
//! formats of SPEC_FULL.md §6. Node/segment parsing lives here rather than
//! in the kernel itself, matching the source's separation of network
//! construction from the kernel that walks it.

use std::collections::HashMap;

use crate::error::{PopsError, Result};
use crate::raster::BBox;

pub type NodeId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLocation {
    pub row: i32,
    pub col: i32,
}

/// One segment: an ordered polyline of intermediate cells connecting two
/// nodes, plus its per-cell travel cost (fixed at 1.0 per cell; scaling is
/// the caller's concern via `network_min_time`/`network_max_time`).
#[derive(Debug, Clone)]
pub struct Segment {
    pub to: NodeId,
    pub polyline: Vec<(i32, i32)>,
}

#[derive(Default)]
pub struct Network {
    nodes: HashMap<NodeId, NodeLocation>,
    /// node -> cell, for eligibility lookups.
    cell_to_node: HashMap<(i32, i32), NodeId>,
    adjacency: HashMap<NodeId, Vec<Segment>>,
}

impl Network {
    pub fn new() -> Self {
        Network::default()
    }

    /// Parse `id,x,y` lines. Points outside `bbox` are skipped silently.
    /// Node ids `< 1` are a network error.
    pub fn load_nodes(&mut self, csv: &str, bbox: &BBox, ns_res: f64, ew_res: f64) -> Result<()> {
        for (lineno, line) in csv.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.split(',');
            let id: i64 = parts
                .next()
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(|| PopsError::Network(format!("malformed node id on line {lineno}")))?;
            if id < 1 {
                return Err(PopsError::Network(format!("node id must be >= 1, got {id} on line {lineno}")));
            }
            let x: f64 = parts
                .next()
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(|| PopsError::Network(format!("malformed node x on line {lineno}")))?;
            let y: f64 = parts
                .next()
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(|| PopsError::Network(format!("malformed node y on line {lineno}")))?;
            if !bbox.contains(x, y) {
                continue;
            }
            let row = ((bbox.north - y) / ns_res).floor() as i32;
            let col = ((x - bbox.west) / ew_res).floor() as i32;
            let node_id = id as NodeId;
            self.nodes.insert(node_id, NodeLocation { row, col });
            self.cell_to_node.insert((row, col), node_id);
        }
        Ok(())
    }

    /// Parse `node_id_1,node_id_2,x1;y1;x2;y2;...` lines. Segments whose
    /// endpoints are not both loaded nodes are skipped.
    pub fn load_segments(&mut self, csv: &str, bbox: &BBox, ns_res: f64, ew_res: f64) -> Result<()> {
        for line in csv.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.splitn(3, ',');
            let a: Option<NodeId> = parts.next().and_then(|s| s.trim().parse().ok());
            let b: Option<NodeId> = parts.next().and_then(|s| s.trim().parse().ok());
            let coords = match parts.next() {
                Some(c) => c,
                None => continue,
            };
            let (a, b) = match (a, b) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };
            if !self.nodes.contains_key(&a) || !self.nodes.contains_key(&b) {
                continue;
            }
            let mut polyline = Vec::new();
            let values: Vec<f64> = coords.split(';').filter_map(|s| s.trim().parse().ok()).collect();
            for pair in values.chunks(2) {
                if let [x, y] = pair {
                    let row = ((bbox.north - y) / ns_res).floor() as i32;
                    let col = ((x - bbox.west) / ew_res).floor() as i32;
                    polyline.push((row, col));
                }
            }
            self.adjacency.entry(a).or_default().push(Segment { to: b, polyline: polyline.clone() });
            self.adjacency
                .entry(b)
                .or_default()
                .push(Segment { to: a, polyline: polyline.into_iter().rev().collect() });
        }
        Ok(())
    }

    /// Fails unless `allow_empty` when no nodes were loaded inside the bbox.
    pub fn finalize(&self, allow_empty: bool) -> Result<()> {
        if self.nodes.is_empty() && !allow_empty {
            return Err(PopsError::Network("no nodes inside bbox".into()));
        }
        Ok(())
    }

    pub fn node_at(&self, row: i32, col: i32) -> Option<NodeId> {
        self.cell_to_node.get(&(row, col)).copied()
    }

    pub fn neighbors(&self, node: NodeId) -> &[Segment] {
        self.adjacency.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
