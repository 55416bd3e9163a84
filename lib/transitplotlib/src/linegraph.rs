//! The input model: an undirected graph of stations and junctions whose
//! edges carry ordered sets of transit line occurrences.

use crate::geo::{self, BBox, Pt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type NodeRef = usize;
pub type EdgeRef = usize;
pub type LineRef = usize;

/// A transit line. Compared by identity (`id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub id: String,
    pub label: String,
    pub color: String,
}

/// A line riding on an edge, together with an optional direction anchor:
/// the node the line travels toward on this edge. `None` means the line
/// runs in both directions.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LineOcc {
    pub line: LineRef,
    pub direction: Option<NodeRef>,
}

impl LineOcc {
    /// Whether this occurrence continues into `other` across the shared
    /// node: toward the node on one side, away from it on the other.
    pub fn continues_into(&self, shared: NodeRef, other: &LineOcc) -> bool {
        if self.line != other.line {
            return false;
        }
        match (self.direction, other.direction) {
            (Some(a), Some(b)) => (a == shared) != (b == shared),
            _ => true,
        }
    }
}

/// One side of a node: the adjacent edge together with the outgoing
/// tangent angle of its geometry at this node.
#[derive(Debug, Clone)]
pub struct NodeFront {
    pub edge: EdgeRef,
    pub out_angle: f64,
}

#[derive(Debug, Clone)]
pub struct LineNode {
    pub id: String,
    pub pos: Pt,
    /// Station label; junctions without a stop have none.
    pub station: Option<String>,
    pub adj: Vec<EdgeRef>,
    pub fronts: Vec<NodeFront>,
}

#[derive(Debug, Clone)]
pub struct LineEdge {
    pub from: NodeRef,
    pub to: NodeRef,
    pub polyline: Vec<Pt>,
    pub lines: Vec<LineOcc>,
}

impl LineEdge {
    pub fn other(&self, n: NodeRef) -> NodeRef {
        if self.from == n { self.to } else { self.from }
    }
}

/// Undirected transit graph. Nodes and edges live in arenas addressed by
/// index; deletions leave tombstones so references stay stable.
#[derive(Debug, Clone, Default)]
pub struct LineGraph {
    pub nodes: Vec<Option<LineNode>>,
    pub edges: Vec<Option<LineEdge>>,
    pub lines: Vec<Line>,
}

impl LineGraph {
    pub fn new() -> LineGraph {
        Default::default()
    }

    pub fn add_line(&mut self, line: Line) -> LineRef {
        if let Some(i) = self.lines.iter().position(|l| l.id == line.id) {
            return i;
        }
        self.lines.push(line);
        self.lines.len() - 1
    }

    pub fn add_node(&mut self, id: &str, pos: Pt, station: Option<String>) -> NodeRef {
        self.nodes.push(Some(LineNode {
            id: id.to_string(),
            pos,
            station,
            adj: Vec::new(),
            fronts: Vec::new(),
        }));
        self.nodes.len() - 1
    }

    pub fn add_edge(
        &mut self,
        from: NodeRef,
        to: NodeRef,
        polyline: Vec<Pt>,
        lines: Vec<LineOcc>,
    ) -> EdgeRef {
        let polyline = if polyline.len() >= 2 {
            polyline
        } else {
            vec![self.node(from).pos, self.node(to).pos]
        };
        let e = self.edges.len();
        self.edges.push(Some(LineEdge { from, to, polyline, lines }));
        self.nodes[from].as_mut().unwrap().adj.push(e);
        self.nodes[to].as_mut().unwrap().adj.push(e);
        e
    }

    pub fn node(&self, n: NodeRef) -> &LineNode {
        self.nodes[n].as_ref().unwrap()
    }

    pub fn edge(&self, e: EdgeRef) -> &LineEdge {
        self.edges[e].as_ref().unwrap()
    }

    pub fn node_refs(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.nodes.iter().enumerate().filter(|(_, n)| n.is_some()).map(|(i, _)| i)
    }

    pub fn edge_refs(&self) -> impl Iterator<Item = EdgeRef> + '_ {
        self.edges.iter().enumerate().filter(|(_, e)| e.is_some()).map(|(i, _)| i)
    }

    pub fn num_nodes(&self) -> usize {
        self.node_refs().count()
    }

    pub fn num_edges(&self) -> usize {
        self.edge_refs().count()
    }

    pub fn bbox(&self) -> BBox {
        let mut b = BBox::empty();
        for n in self.node_refs() {
            b.expand(self.node(n).pos);
        }
        for e in self.edge_refs() {
            for &p in &self.edge(e).polyline {
                b.expand(p);
            }
        }
        b
    }

    /// Out-angle of an edge's geometry at one of its endpoints.
    pub fn out_angle(&self, e: EdgeRef, at: NodeRef) -> f64 {
        let edge = self.edge(e);
        let pl = &edge.polyline;
        if at == edge.from {
            geo::angle(pl[0], pl[1])
        } else {
            geo::angle(pl[pl.len() - 1], pl[pl.len() - 2])
        }
    }

    /// Recompute the node fronts from the edge geometries.
    pub fn build_fronts(&mut self) {
        for n in 0..self.nodes.len() {
            if self.nodes[n].is_none() {
                continue;
            }
            let adj = self.node(n).adj.clone();
            let fronts = adj
                .iter()
                .map(|&e| NodeFront { edge: e, out_angle: self.out_angle(e, n) })
                .collect();
            self.nodes[n].as_mut().unwrap().fronts = fronts;
        }
    }

    pub fn lines_served(&self, n: NodeRef) -> BTreeSet<LineRef> {
        let mut out = BTreeSet::new();
        for &e in &self.node(n).adj {
            for occ in &self.edge(e).lines {
                out.insert(occ.line);
            }
        }
        out
    }

    /// Maximum number of line occurrences on any edge incident to `n`.
    pub fn max_line_num(&self, n: NodeRef) -> usize {
        self.node(n).adj.iter().map(|&e| self.edge(e).lines.len()).max().unwrap_or(0)
    }

    /// Merge node `b` into node `a`: reattach b's edges, drop edges that
    /// collapse onto themselves, remove b. The caller fixes geometry.
    pub fn merge_nds(&mut self, a: NodeRef, b: NodeRef) {
        let b_adj = self.node(b).adj.clone();
        for e in b_adj {
            let collapses = {
                let edge = self.edge(e);
                edge.other(b) == a
            };
            if collapses {
                self.remove_edge(e);
                continue;
            }
            {
                let edge = self.edges[e].as_mut().unwrap();
                if edge.from == b {
                    edge.from = a;
                } else {
                    edge.to = a;
                }
            }
            self.nodes[a].as_mut().unwrap().adj.push(e);
        }
        // keep a station label if either side had one
        if self.node(a).station.is_none() {
            let st = self.node(b).station.clone();
            self.nodes[a].as_mut().unwrap().station = st;
        }
        self.nodes[b] = None;
    }

    pub fn remove_edge(&mut self, e: EdgeRef) {
        let (from, to) = {
            let edge = self.edge(e);
            (edge.from, edge.to)
        };
        for n in [from, to].iter() {
            if let Some(nd) = self.nodes[*n].as_mut() {
                nd.adj.retain(|&x| x != e);
            }
        }
        self.edges[e] = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: &str) -> Line {
        Line { id: id.to_string(), label: id.to_string(), color: "#000".to_string() }
    }

    #[test]
    fn test_continues_into() {
        let a = LineOcc { line: 0, direction: Some(5) };
        let b = LineOcc { line: 0, direction: Some(7) };
        // a travels toward node 5; through node 5 it must leave away from it
        assert!(a.continues_into(5, &b));
        // both anchored away from the shared node: not a continuation
        assert!(!a.continues_into(3, &b));
        // bidirectional always continues
        let c = LineOcc { line: 0, direction: None };
        assert!(a.continues_into(3, &c));
        let d = LineOcc { line: 1, direction: None };
        assert!(!a.continues_into(5, &d));
    }

    #[test]
    fn test_merge_nds() {
        let mut g = LineGraph::new();
        let l = g.add_line(line("1"));
        let a = g.add_node("a", (0.0, 0.0), None);
        let b = g.add_node("b", (1.0, 0.0), None);
        let c = g.add_node("c", (2.0, 0.0), Some("C".to_string()));
        g.add_edge(a, b, vec![], vec![LineOcc { line: l, direction: None }]);
        let e2 = g.add_edge(b, c, vec![], vec![LineOcc { line: l, direction: None }]);

        g.merge_nds(b, c);
        assert_eq!(g.num_nodes(), 2);
        assert_eq!(g.num_edges(), 1);
        assert!(g.edges[e2].is_none());
        assert_eq!(g.node(b).station.as_deref(), Some("C"));
    }
}
