//! Contraction of the input graph: maximal degree-2 chains become single
//! combinatorial edges carrying their concatenated geographic course. The
//! comb graph is the unit of grid embedding.

use crate::geo::{self, Pt};
use crate::linegraph::{EdgeRef, LineGraph, NodeRef};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

pub type CombNdRef = usize;
pub type CombEdgRef = usize;

#[derive(Debug, Clone)]
pub struct CombNode {
    /// The underlying line graph node.
    pub parent: NodeRef,
    pub pos: Pt,
    /// Adjacent comb edges, clockwise by geographic out-angle.
    pub adj: Vec<CombEdgRef>,
}

#[derive(Debug, Clone)]
pub struct CombEdge {
    pub from: CombNdRef,
    pub to: CombNdRef,
    /// Underlying line edges, in order from `from` to `to`. The flag is
    /// true when the line edge's own orientation agrees with that order.
    pub chain: Vec<(EdgeRef, bool)>,
    /// Concatenated course from `from` to `to`.
    pub polyline: Vec<Pt>,
    /// Highest line count among the chain members.
    pub max_lines: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CombGraph {
    pub nodes: Vec<CombNode>,
    pub edges: Vec<CombEdge>,
}

impl CombGraph {
    /// Build from a line graph. With `deg2_heur`, maximal chains of
    /// degree-2 nodes are contracted into single comb edges; otherwise the
    /// comb graph is one-to-one.
    pub fn new(g: &LineGraph, deg2_heur: bool) -> CombGraph {
        let n_slots = g.nodes.len();
        let mut is_junction = vec![false; n_slots];
        for n in g.node_refs() {
            let deg = g.node(n).adj.len();
            is_junction[n] = !deg2_heur || deg != 2;
        }

        // degree-2 cycles have no natural junction; anchor two nodes so
        // the cycle splits into two proper edges
        if deg2_heur {
            let mut seen = vec![false; n_slots];
            for start in g.node_refs() {
                if is_junction[start] || seen[start] {
                    continue;
                }
                let mut cur = start;
                let mut members = Vec::new();
                loop {
                    seen[cur] = true;
                    members.push(cur);
                    let next = g
                        .node(cur)
                        .adj
                        .iter()
                        .map(|&e| g.edge(e).other(cur))
                        .find(|&m| !seen[m] && !is_junction[m]);
                    match next {
                        Some(m) => cur = m,
                        None => break,
                    }
                }
                // reached a junction through one of the ends? then this
                // chain is handled by the junction walk below
                let touches_junction = members.iter().any(|&m| {
                    g.node(m).adj.iter().any(|&e| is_junction[g.edge(e).other(m)])
                });
                if !touches_junction {
                    is_junction[members[0]] = true;
                    if members.len() > 1 {
                        is_junction[members[1]] = true;
                    }
                }
            }
        }

        let mut nd_map = vec![usize::MAX; n_slots];
        let mut cg = CombGraph::default();
        for n in g.node_refs() {
            if is_junction[n] {
                nd_map[n] = cg.nodes.len();
                cg.nodes.push(CombNode { parent: n, pos: g.node(n).pos, adj: Vec::new() });
            }
        }

        let mut used = vec![false; g.edges.len()];
        for n in g.node_refs() {
            if !is_junction[n] {
                continue;
            }
            for &e0 in &g.node(n).adj {
                if used[e0] {
                    continue;
                }
                // walk the chain away from n until the next junction
                let mut chain = Vec::new();
                let mut via = Vec::new();
                let mut cur_nd = n;
                let mut cur_e = e0;
                let end = loop {
                    used[cur_e] = true;
                    let edge = g.edge(cur_e);
                    chain.push((cur_e, edge.from == cur_nd));
                    let nxt = edge.other(cur_nd);
                    if is_junction[nxt] {
                        break nxt;
                    }
                    via.push(nxt);
                    cur_nd = nxt;
                    cur_e = *g
                        .node(nxt)
                        .adj
                        .iter()
                        .find(|&&e| e != chain.last().unwrap().0)
                        .expect("degree-2 chain node without continuation");
                };

                if end == n && chain.len() >= 2 {
                    // a loop back to its only junction: split at the
                    // middle so both halves are proper edges
                    let mid = chain.len() / 2;
                    let mid_nd = via[mid - 1];
                    nd_map[mid_nd] = cg.nodes.len();
                    cg.nodes.push(CombNode {
                        parent: mid_nd,
                        pos: g.node(mid_nd).pos,
                        adj: Vec::new(),
                    });
                    cg.emit(g, nd_map[n], nd_map[mid_nd], chain[..mid].to_vec(), n);
                    cg.emit(g, nd_map[mid_nd], nd_map[end], chain[mid..].to_vec(), mid_nd);
                } else {
                    cg.emit(g, nd_map[n], nd_map[end], chain, n);
                }
            }
        }

        cg.order_adjacency(g);
        cg
    }

    /// Register a comb edge for a chain of line edges starting at the
    /// line node `start`.
    fn emit(
        &mut self,
        g: &LineGraph,
        from: CombNdRef,
        to: CombNdRef,
        chain: Vec<(EdgeRef, bool)>,
        start: NodeRef,
    ) {
        let mut pl: Vec<Pt> = Vec::new();
        let mut max_lines = 0;
        let mut cur = start;
        for &(le, _) in &chain {
            let edge = g.edge(le);
            max_lines = max_lines.max(edge.lines.len());
            let mut part = edge.polyline.clone();
            if edge.from != cur {
                part.reverse();
            }
            if pl.is_empty() {
                pl = part;
            } else {
                pl.extend(part.into_iter().skip(1));
            }
            cur = edge.other(cur);
        }
        self.add_edge(from, to, chain, pl, max_lines);
    }

    fn add_edge(
        &mut self,
        from: CombNdRef,
        to: CombNdRef,
        chain: Vec<(EdgeRef, bool)>,
        polyline: Vec<Pt>,
        max_lines: usize,
    ) {
        let e = self.edges.len();
        self.edges.push(CombEdge { from, to, chain, polyline, max_lines });
        self.nodes[from].adj.push(e);
        if to != from {
            self.nodes[to].adj.push(e);
        }
    }

    /// Sort each node's adjacency clockwise by the out-angle of the edge
    /// course, ties broken by input order.
    fn order_adjacency(&mut self, _g: &LineGraph) {
        use ordered_float::OrderedFloat;
        use std::f64::consts::PI;
        for n in 0..self.nodes.len() {
            let mut keyed: Vec<(OrderedFloat<f64>, usize, CombEdgRef)> = self.nodes[n]
                .adj
                .iter()
                .enumerate()
                .map(|(i, &e)| {
                    let k = (self.out_angle(e, n) + 1.5 * PI) % (2.0 * PI);
                    (OrderedFloat(-k), i, e)
                })
                .collect();
            keyed.sort();
            self.nodes[n].adj = keyed.into_iter().map(|(_, _, e)| e).collect();
        }
    }

    pub fn out_angle(&self, e: CombEdgRef, at: CombNdRef) -> f64 {
        let edge = &self.edges[e];
        let pl = &edge.polyline;
        if at == edge.from {
            geo::angle(pl[0], pl[1])
        } else {
            geo::angle(pl[pl.len() - 1], pl[pl.len() - 2])
        }
    }

    pub fn other(&self, e: CombEdgRef, n: CombNdRef) -> CombNdRef {
        let edge = &self.edges[e];
        if edge.from == n { edge.to } else { edge.from }
    }

    pub fn deg(&self, n: CombNdRef) -> usize {
        self.nodes[n].adj.len()
    }
}

/// Routing order for the embedding engine: seed a BFS from the node of
/// highest degree and emit every comb edge the first time it is seen,
/// following the clockwise adjacency (shuffled when `randomize`).
pub fn ordering(cg: &CombGraph, randomize: bool, rng: &mut StdRng) -> Vec<CombEdgRef> {
    let mut global: BinaryHeap<(usize, Reverse<CombNdRef>)> = cg
        .nodes
        .iter()
        .enumerate()
        .map(|(i, nd)| (nd.adj.len(), Reverse(i)))
        .collect();

    let mut settled = vec![false; cg.nodes.len()];
    let mut done = vec![false; cg.edges.len()];
    let mut order = Vec::with_capacity(cg.edges.len());

    while let Some((_, Reverse(seed))) = global.pop() {
        let mut dangling: BinaryHeap<(usize, Reverse<CombNdRef>)> = BinaryHeap::new();
        dangling.push((cg.deg(seed), Reverse(seed)));

        while let Some((_, Reverse(n))) = dangling.pop() {
            if settled[n] {
                continue;
            }
            let mut od = cg.nodes[n].adj.clone();
            if randomize {
                od.shuffle(rng);
            }
            for e in od {
                if done[e] {
                    continue;
                }
                done[e] = true;
                let m = cg.other(e, n);
                dangling.push((cg.deg(m), Reverse(m)));
                order.push(e);
            }
            settled[n] = true;
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linegraph::{Line, LineOcc};
    use rand::SeedableRng;

    fn grid_line(id: &str) -> Line {
        Line { id: id.to_string(), label: id.to_string(), color: "#000".to_string() }
    }

    fn occ(l: usize) -> LineOcc {
        LineOcc { line: l, direction: None }
    }

    #[test]
    fn test_deg2_contraction() {
        // a - b - c - d with a junction leg at c:
        //
        //   a---b---c---d
        //           |
        //           e
        let mut g = LineGraph::new();
        let l = g.add_line(grid_line("1"));
        let a = g.add_node("a", (0.0, 0.0), None);
        let b = g.add_node("b", (1.0, 0.0), None);
        let c = g.add_node("c", (2.0, 0.0), None);
        let d = g.add_node("d", (3.0, 0.0), None);
        let e = g.add_node("e", (2.0, -1.0), None);
        g.add_edge(a, b, vec![], vec![occ(l)]);
        g.add_edge(b, c, vec![], vec![occ(l)]);
        g.add_edge(c, d, vec![], vec![occ(l)]);
        g.add_edge(c, e, vec![], vec![occ(l)]);

        let cg = CombGraph::new(&g, true);
        // junctions: a, c, d, e; b contracted away
        assert_eq!(cg.nodes.len(), 4);
        assert_eq!(cg.edges.len(), 3);
        let ab = cg.edges.iter().find(|e| e.chain.len() == 2).unwrap();
        assert_eq!(ab.polyline.len(), 3);

        let cg1 = CombGraph::new(&g, false);
        assert_eq!(cg1.nodes.len(), 5);
        assert_eq!(cg1.edges.len(), 4);
    }

    #[test]
    fn test_clockwise_adjacency() {
        // edges east, north, west, south of a cross junction; clockwise
        // from north reads north, east, south, west
        let mut g = LineGraph::new();
        let l = g.add_line(grid_line("1"));
        let c = g.add_node("c", (0.0, 0.0), None);
        let e = g.add_node("e", (1.0, 0.0), None);
        let n = g.add_node("n", (0.0, 1.0), None);
        let w = g.add_node("w", (-1.0, 0.0), None);
        let s = g.add_node("s", (0.0, -1.0), None);
        let ee = g.add_edge(c, e, vec![], vec![occ(l)]);
        let en = g.add_edge(c, n, vec![], vec![occ(l)]);
        let ew = g.add_edge(c, w, vec![], vec![occ(l)]);
        let es = g.add_edge(c, s, vec![], vec![occ(l)]);

        let cg = CombGraph::new(&g, false);
        let cn = cg.nodes.iter().position(|nd| nd.parent == c).unwrap();
        let adj_parents: Vec<EdgeRef> =
            cg.nodes[cn].adj.iter().map(|&ce| cg.edges[ce].chain[0].0).collect();
        // clockwise starting just past north: east, south, west, north
        assert_eq!(adj_parents, vec![ee, es, ew, en]);
    }

    #[test]
    fn test_loop_line_splits() {
        // a circle line hanging off a single junction must not collapse
        // into a self loop
        let mut g = LineGraph::new();
        let l = g.add_line(grid_line("1"));
        let n = g.add_node("n", (0.0, 0.0), None);
        let x = g.add_node("x", (-1.0, 0.0), None);
        let p = g.add_node("p", (1.0, 0.0), None);
        let q = g.add_node("q", (1.0, 1.0), None);
        let r = g.add_node("r", (0.0, 1.0), None);
        g.add_edge(n, x, vec![], vec![occ(l)]);
        g.add_edge(n, p, vec![], vec![occ(l)]);
        g.add_edge(p, q, vec![], vec![occ(l)]);
        g.add_edge(q, r, vec![], vec![occ(l)]);
        g.add_edge(r, n, vec![], vec![occ(l)]);

        let cg = CombGraph::new(&g, true);
        assert_eq!(cg.nodes.len(), 3);
        assert_eq!(cg.edges.len(), 3);
        for e in &cg.edges {
            assert_ne!(e.from, e.to);
        }
    }

    #[test]
    fn test_ordering_covers_all_edges() {
        let mut g = LineGraph::new();
        let l = g.add_line(grid_line("1"));
        let a = g.add_node("a", (0.0, 0.0), None);
        let b = g.add_node("b", (1.0, 0.0), None);
        let c = g.add_node("c", (2.0, 0.0), None);
        let d = g.add_node("d", (1.0, 1.0), None);
        g.add_edge(a, b, vec![], vec![occ(l)]);
        g.add_edge(b, c, vec![], vec![occ(l)]);
        g.add_edge(b, d, vec![], vec![occ(l)]);

        let cg = CombGraph::new(&g, true);
        let mut rng = StdRng::seed_from_u64(0);
        let ord = ordering(&cg, false, &mut rng);
        assert_eq!(ord.len(), cg.edges.len());
        let mut sorted = ord.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), cg.edges.len());

        // the highest-degree node seeds the order: its first clockwise
        // edge is emitted first
        assert!(cg.edges[ord[0]].from == 1 || cg.edges[ord[0]].to == 1);
    }
}
