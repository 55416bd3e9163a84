//! The optimization graph for line ordering: a rewritten view of the
//! line graph. Degree-2 nodes with equal directed line sets are
//! contracted, and untangling rewrites pull crossing and splitting lines
//! apart into parallel edges, shrinking the permutation search space
//! while preserving every line continuation.

use crate::geo::Pt;
use crate::linegraph::{EdgeRef, LineGraph, LineOcc, LineRef, NodeRef};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

pub type OptNdRef = usize;
pub type OptEdgRef = usize;

/// One underlying line edge inside an opt edge. `dir` is true when the
/// line edge's own orientation agrees with the opt edge's.
#[derive(Debug, Clone)]
pub struct EtgPart {
    pub edge: EdgeRef,
    pub dir: bool,
    pub order: usize,
}

#[derive(Debug, Clone)]
pub struct OptEdge {
    pub from: OptNdRef,
    pub to: OptNdRef,
    /// All underlying line edges, equal in terms of directed lines.
    pub etgs: Vec<EtgPart>,
    /// The line occurrences actually routed through this edge.
    pub lines: Vec<LineOcc>,
}

impl OptEdge {
    pub fn other(&self, n: OptNdRef) -> OptNdRef {
        if self.from == n { self.to } else { self.from }
    }
}

#[derive(Debug, Clone)]
pub struct OptNode {
    /// The underlying line node; artificial nodes from rewrites may keep
    /// pointing at the node they were exploded from.
    pub node: Option<NodeRef>,
    pub pos: Pt,
    /// Incident edges, clockwise by geographic out-angle.
    pub edges: Vec<OptEdgRef>,
}

#[derive(Debug, Clone, Default)]
pub struct OptGraph {
    pub nodes: Vec<Option<OptNode>>,
    pub edges: Vec<Option<OptEdge>>,
}

impl OptGraph {
    /// One-to-one copy of the line graph.
    pub fn new(g: &LineGraph) -> OptGraph {
        let mut og = OptGraph::default();
        let mut nd_map = vec![usize::MAX; g.nodes.len()];

        for n in g.node_refs() {
            nd_map[n] = og.nodes.len();
            og.nodes.push(Some(OptNode {
                node: Some(n),
                pos: g.node(n).pos,
                edges: Vec::new(),
            }));
        }

        for e in g.edge_refs() {
            let edge = g.edge(e);
            let oe = og.edges.len();
            og.edges.push(Some(OptEdge {
                from: nd_map[edge.from],
                to: nd_map[edge.to],
                etgs: vec![EtgPart { edge: e, dir: true, order: 0 }],
                lines: edge.lines.clone(),
            }));
            og.nodes[nd_map[edge.from]].as_mut().unwrap().edges.push(oe);
            og.nodes[nd_map[edge.to]].as_mut().unwrap().edges.push(oe);
        }

        // clockwise adjacency, from the line graph's node fronts
        use ordered_float::OrderedFloat;
        use std::f64::consts::PI;
        for n in g.node_refs() {
            let on = nd_map[n];
            let mut keyed: Vec<(OrderedFloat<f64>, usize, OptEdgRef)> = og.nodes[on]
                .as_ref()
                .unwrap()
                .edges
                .iter()
                .enumerate()
                .map(|(i, &oe)| {
                    let le = og.edges[oe].as_ref().unwrap().etgs[0].edge;
                    let k = (g.out_angle(le, n) + 1.5 * PI) % (2.0 * PI);
                    (OrderedFloat(-k), i, oe)
                })
                .collect();
            keyed.sort();
            og.nodes[on].as_mut().unwrap().edges =
                keyed.into_iter().map(|(_, _, e)| e).collect();
        }

        og
    }

    pub fn node(&self, n: OptNdRef) -> &OptNode {
        self.nodes[n].as_ref().unwrap()
    }

    pub fn edge(&self, e: OptEdgRef) -> &OptEdge {
        self.edges[e].as_ref().unwrap()
    }

    pub fn node_refs(&self) -> Vec<OptNdRef> {
        self.nodes.iter().enumerate().filter(|(_, n)| n.is_some()).map(|(i, _)| i).collect()
    }

    pub fn edge_refs(&self) -> Vec<OptEdgRef> {
        self.edges.iter().enumerate().filter(|(_, e)| e.is_some()).map(|(i, _)| i).collect()
    }

    pub fn deg(&self, n: OptNdRef) -> usize {
        self.node(n).edges.len()
    }

    pub fn max_cardinality(&self) -> usize {
        self.edge_refs().iter().map(|&e| self.edge(e).lines.len()).max().unwrap_or(0)
    }

    /// The underlying line edge of `e` adjacent to node `n`.
    pub fn adj_line_edge(&self, e: OptEdgRef, n: OptNdRef) -> EdgeRef {
        let edge = self.edge(e);
        if edge.from == n {
            edge.etgs.first().unwrap().edge
        } else {
            edge.etgs.last().unwrap().edge
        }
    }

    fn continues_through(&self, oa: &LineOcc, n: OptNdRef, ob: &LineOcc) -> bool {
        match self.node(n).node {
            Some(m) => oa.continues_into(m, ob),
            None => oa.line == ob.line,
        }
    }

    /// Whether a line occurrence of `e` continues into edge `f` at `n`.
    pub fn line_continues_into(&self, occ: &LineOcc, n: OptNdRef, f: OptEdgRef) -> bool {
        self.edge(f).lines.iter().any(|ob| self.continues_through(occ, n, ob))
    }

    fn dir_line_equal_in(&self, a: OptEdgRef, b: OptEdgRef, n: OptNdRef) -> bool {
        let ea = self.edge(a);
        let eb = self.edge(b);
        if ea.lines.len() != eb.lines.len() {
            return false;
        }
        ea.lines.iter().all(|oa| eb.lines.iter().any(|ob| self.continues_through(oa, n, ob)))
    }

    fn line_ids(&self, e: OptEdgRef) -> BTreeSet<LineRef> {
        self.edge(e).lines.iter().map(|o| o.line).collect()
    }

    /// Contract degree-2 nodes whose two edges carry the same directed
    /// line set, until nothing is left to contract. Returns whether
    /// anything changed.
    pub fn simplify(&mut self) -> bool {
        let mut any = false;
        while self.simplify_step() {
            any = true;
        }
        any
    }

    fn simplify_step(&mut self) -> bool {
        for n in self.node_refs() {
            if self.deg(n) != 2 {
                continue;
            }
            let (a, b) = (self.node(n).edges[0], self.node(n).edges[1]);
            if a == b {
                continue;
            }
            let u = self.edge(a).other(n);
            let w = self.edge(b).other(n);
            if u == w || u == n || w == n {
                continue;
            }
            if !self.dir_line_equal_in(a, b, n) {
                continue;
            }

            // merged edge runs u -> n -> w
            let mut etgs = self.oriented_etgs(a, u);
            etgs.extend(self.oriented_etgs(b, n));
            for (i, p) in etgs.iter_mut().enumerate() {
                p.order = i;
            }
            let lines = self.edge(a).lines.clone();

            let ne = self.edges.len();
            self.edges.push(Some(OptEdge { from: u, to: w, etgs, lines }));

            self.replace_adj(u, a, ne);
            self.replace_adj(w, b, ne);
            self.edges[a] = None;
            self.edges[b] = None;
            self.nodes[n] = None;
            return true;
        }
        false
    }

    /// The etgs of `e` as seen when traveling out of `from_nd`.
    fn oriented_etgs(&self, e: OptEdgRef, from_nd: OptNdRef) -> Vec<EtgPart> {
        let edge = self.edge(e);
        let mut etgs = edge.etgs.clone();
        if edge.from != from_nd {
            etgs.reverse();
            for p in etgs.iter_mut() {
                p.dir = !p.dir;
            }
        }
        etgs
    }

    fn replace_adj(&mut self, n: OptNdRef, old: OptEdgRef, new: OptEdgRef) {
        for e in self.nodes[n].as_mut().unwrap().edges.iter_mut() {
            if *e == old {
                *e = new;
            }
        }
    }

    fn detach(&mut self, n: OptNdRef, e: OptEdgRef) {
        self.nodes[n].as_mut().unwrap().edges.retain(|&x| x != e);
    }

    fn move_endpoint(&mut self, e: OptEdgRef, from: OptNdRef, to: OptNdRef) {
        {
            let edge = self.edges[e].as_mut().unwrap();
            if edge.from == from {
                edge.from = to;
            } else {
                edge.to = to;
            }
        }
        self.detach(from, e);
        self.nodes[to].as_mut().unwrap().edges.push(e);
    }

    /// Replacement nodes colinear with the local tangent at `nd`.
    fn explode_node_along(&mut self, nd: OptNdRef, along: Pt, k: usize) -> Vec<OptNdRef> {
        let base = self.node(nd).pos;
        let node = self.node(nd).node;
        let len = (along.0 * along.0 + along.1 * along.1).sqrt().max(1e-12);
        let step = (along.0 / len * 1e-3, along.1 / len * 1e-3);
        (0..k)
            .map(|i| {
                let id = self.nodes.len();
                self.nodes.push(Some(OptNode {
                    node,
                    pos: (base.0 + i as f64 * step.0, base.1 + i as f64 * step.1),
                    edges: Vec::new(),
                }));
                id
            })
            .collect()
    }

    fn tangent_at(&self, n: OptNdRef) -> Pt {
        let e = self.node(n).edges[0];
        let o = self.edge(e).other(n);
        let (px, py) = self.node(o).pos;
        let (nx, ny) = self.node(n).pos;
        (px - nx, py - ny)
    }

    /// Map each line of `e` to the unique other edge at `n` it continues
    /// into. `None` when some line continues into zero or several edges.
    fn unique_continuations(
        &self,
        e: OptEdgRef,
        n: OptNdRef,
    ) -> Option<BTreeMap<OptEdgRef, Vec<LineOcc>>> {
        let mut out: BTreeMap<OptEdgRef, Vec<LineOcc>> = BTreeMap::new();
        for occ in &self.edge(e).lines {
            let mut tgt = None;
            for &f in &self.node(n).edges {
                if f == e {
                    continue;
                }
                if self.line_continues_into(occ, n, f) {
                    if tgt.is_some() {
                        return None;
                    }
                    tgt = Some(f);
                }
            }
            match tgt {
                Some(f) => out.entry(f).or_insert_with(Vec::new).push(*occ),
                None => return None,
            }
        }
        Some(out)
    }

    /// Apply untangling rewrites until none fires. Interleaves
    /// simplification after every pass.
    pub fn untangle(&mut self) {
        self.simplify();
        for _ in 0..100 {
            let changed = self.untangle_pass();
            let simplified = self.simplify();
            if !changed && !simplified {
                break;
            }
        }
    }

    /// One pass over the six rewrites. Returns whether any fired.
    fn untangle_pass(&mut self) -> bool {
        let mut any = false;
        if self.untangle_full_cross_step() {
            any = true;
        }
        if self.untangle_y_step() {
            any = true;
        }
        if self.untangle_partial_y_step() {
            any = true;
        }
        if self.untangle_dog_bone_step() {
            any = true;
        }
        if self.untangle_partial_dog_bone_step() {
            any = true;
        }
        if self.untangle_stump_step() {
            any = true;
        }
        any
    }

    /// Two edges meeting at a node with identical isolated line sets are
    /// pulled out onto their own node.
    fn untangle_full_cross_step(&mut self) -> bool {
        for n in self.node_refs() {
            if self.deg(n) < 3 {
                continue;
            }
            let edges = self.node(n).edges.clone();
            for i in 0..edges.len() {
                for j in (i + 1)..edges.len() {
                    let (a, b) = (edges[i], edges[j]);
                    if a == b || !self.dir_line_equal_in(a, b, n) {
                        continue;
                    }
                    // the pair's lines must not touch any other edge here
                    let pair_lines = self.line_ids(a);
                    let isolated = edges.iter().all(|&f| {
                        f == a || f == b || self.line_ids(f).is_disjoint(&pair_lines)
                    });
                    if !isolated {
                        continue;
                    }

                    debug!("untangling full cross at node {}", n);
                    let tang = self.tangent_at(n);
                    let parts = self.explode_node_along(n, tang, 2);
                    self.move_endpoint(a, n, parts[0]);
                    self.move_endpoint(b, n, parts[0]);
                    for &f in &edges {
                        if f != a && f != b {
                            self.move_endpoint(f, n, parts[1]);
                        }
                    }
                    self.nodes[n] = None;
                    return true;
                }
            }
        }
        false
    }

    /// A trunk whose lines split cleanly onto all branches at a node,
    /// with a terminus at the far end, is cloned into one copy per
    /// branch.
    fn untangle_y_step(&mut self) -> bool {
        for e in self.edge_refs() {
            let (f, t) = {
                let edge = self.edge(e);
                (edge.from, edge.to)
            };
            for &(n, u) in &[(f, t), (t, f)] {
                if self.deg(u) != 1 || self.deg(n) < 3 {
                    continue;
                }
                let groups = match self.unique_continuations(e, n) {
                    Some(g) => g,
                    None => continue,
                };
                if groups.len() < 2 || groups.len() != self.deg(n) - 1 {
                    continue;
                }
                // every branch must carry exactly its group
                if !groups.iter().all(|(&b, g)| self.edge(b).lines.len() == g.len()) {
                    continue;
                }

                debug!("untangling Y at node {}", n);
                // branches in clockwise order
                let branches: Vec<OptEdgRef> =
                    self.node(n).edges.iter().cloned().filter(|&x| x != e).collect();
                let k = branches.len();
                let tang = self.tangent_at(u);
                let new_ns = self.explode_node_along(n, tang, k);
                let new_us = self.explode_node_along(u, tang, k);

                for (i, &b) in branches.iter().enumerate() {
                    let g = groups[&b].clone();
                    let mut etgs = self.oriented_etgs(e, n);
                    for (o, p) in etgs.iter_mut().enumerate() {
                        p.order = o;
                    }
                    let ne = self.edges.len();
                    self.edges.push(Some(OptEdge {
                        from: new_ns[i],
                        to: new_us[i],
                        etgs,
                        lines: g,
                    }));
                    self.move_endpoint(b, n, new_ns[i]);
                    self.nodes[new_ns[i]].as_mut().unwrap().edges.push(ne);
                    self.nodes[new_us[i]].as_mut().unwrap().edges.push(ne);
                }

                self.edges[e] = None;
                self.nodes[n] = None;
                self.nodes[u] = None;
                return true;
            }
        }
        false
    }

    /// Y pattern where only part of the trunk's lines separates cleanly:
    /// clone off the separable portion.
    fn untangle_partial_y_step(&mut self) -> bool {
        for e in self.edge_refs() {
            let (f, t) = {
                let edge = self.edge(e);
                (edge.from, edge.to)
            };
            for &(n, u) in &[(f, t), (t, f)] {
                if self.deg(u) != 1 || self.deg(n) < 3 {
                    continue;
                }
                let others = self.node(n).edges.clone();
                for &b in others.iter().filter(|&&x| x != e) {
                    // lines of e that continue into b and only into b
                    let shared: Vec<LineOcc> = self
                        .edge(e)
                        .lines
                        .iter()
                        .filter(|occ| {
                            self.line_continues_into(occ, n, b)
                                && others.iter().all(|&f2| {
                                    f2 == e || f2 == b || !self.line_continues_into(occ, n, f2)
                                })
                        })
                        .cloned()
                        .collect();
                    if shared.is_empty() || shared.len() == self.edge(e).lines.len() {
                        continue;
                    }
                    if self.edge(b).lines.len() != shared.len() {
                        continue;
                    }

                    debug!("untangling partial Y at node {}", n);
                    let tang = self.tangent_at(u);
                    let nu = self.explode_node_along(u, tang, 1)[0];
                    let mut etgs = self.oriented_etgs(e, n);
                    for (o, p) in etgs.iter_mut().enumerate() {
                        p.order = o;
                    }
                    let ne = self.edges.len();
                    self.edges.push(Some(OptEdge {
                        from: n,
                        to: nu,
                        etgs,
                        lines: shared.clone(),
                    }));
                    self.nodes[n].as_mut().unwrap().edges.push(ne);
                    self.nodes[nu].as_mut().unwrap().edges.push(ne);

                    let shared_ids: BTreeSet<LineRef> =
                        shared.iter().map(|o| o.line).collect();
                    self.edges[e]
                        .as_mut()
                        .unwrap()
                        .lines
                        .retain(|o| !shared_ids.contains(&o.line));
                    return true;
                }
            }
        }
        false
    }

    /// An edge between two junctions whose lines split disjointly at both
    /// ends is duplicated into parallel bones, one group at a time.
    fn untangle_dog_bone_step(&mut self) -> bool {
        for e in self.edge_refs() {
            let (u, v) = {
                let edge = self.edge(e);
                (edge.from, edge.to)
            };
            if u == v || self.deg(u) < 3 || self.deg(v) < 3 {
                continue;
            }
            let gu = match self.unique_continuations(e, u) {
                Some(g) => g,
                None => continue,
            };
            let gv = match self.unique_continuations(e, v) {
                Some(g) => g,
                None => continue,
            };
            if gu.len() < 2 || gv.len() < 2 {
                continue;
            }
            // legs must carry exactly their groups
            if !gu.iter().all(|(&l, g)| self.edge(l).lines.len() == g.len()) {
                continue;
            }
            if !gv.iter().all(|(&l, g)| self.edge(l).lines.len() == g.len()) {
                continue;
            }
            // the groups must pair up between the two ends
            let su: BTreeSet<BTreeSet<LineRef>> =
                gu.values().map(|g| g.iter().map(|o| o.line).collect()).collect();
            let sv: BTreeSet<BTreeSet<LineRef>> =
                gv.values().map(|g| g.iter().map(|o| o.line).collect()).collect();
            if su != sv {
                continue;
            }

            // peel the first group into its own bone
            let (&fu, g) = gu.iter().next().unwrap();
            let g = g.clone();
            let gset: BTreeSet<LineRef> = g.iter().map(|o| o.line).collect();
            let fv = *gv
                .iter()
                .find(|(_, gg)| {
                    gg.iter().map(|o| o.line).collect::<BTreeSet<_>>() == gset
                })
                .unwrap()
                .0;

            debug!("untangling dog bone on edge {}", e);
            let nu = self.explode_node_along(u, self.tangent_at(u), 1)[0];
            let nv = self.explode_node_along(v, self.tangent_at(v), 1)[0];
            self.move_endpoint(fu, u, nu);
            self.move_endpoint(fv, v, nv);

            let mut etgs = self.oriented_etgs(e, u);
            for (o, p) in etgs.iter_mut().enumerate() {
                p.order = o;
            }
            let ne = self.edges.len();
            self.edges.push(Some(OptEdge { from: nu, to: nv, etgs, lines: g }));
            self.nodes[nu].as_mut().unwrap().edges.push(ne);
            self.nodes[nv].as_mut().unwrap().edges.push(ne);

            self.edges[e].as_mut().unwrap().lines.retain(|o| !gset.contains(&o.line));
            if self.edge(e).lines.is_empty() {
                self.detach(u, e);
                self.detach(v, e);
                self.edges[e] = None;
            }
            return true;
        }
        false
    }

    /// Dog bone where only one end splits cleanly: peel at that end and
    /// keep the other end shared.
    fn untangle_partial_dog_bone_step(&mut self) -> bool {
        for e in self.edge_refs() {
            let (f, t) = {
                let edge = self.edge(e);
                (edge.from, edge.to)
            };
            if f == t {
                continue;
            }
            for &(u, v) in &[(f, t), (t, f)] {
                if self.deg(u) < 3 || self.deg(v) < 3 {
                    continue;
                }
                let gu = match self.unique_continuations(e, u) {
                    Some(g) => g,
                    None => continue,
                };
                if gu.len() < 2 {
                    continue;
                }
                if !gu.iter().all(|(&l, g)| self.edge(l).lines.len() == g.len()) {
                    continue;
                }
                // the other end must not split cleanly, else the full
                // dog bone applies
                if self.unique_continuations(e, v).map_or(false, |g| g.len() >= 2) {
                    continue;
                }

                let (&fu, g) = gu.iter().next().unwrap();
                let g = g.clone();
                let gset: BTreeSet<LineRef> = g.iter().map(|o| o.line).collect();

                debug!("untangling partial dog bone on edge {}", e);
                let nu = self.explode_node_along(u, self.tangent_at(u), 1)[0];
                self.move_endpoint(fu, u, nu);

                let mut etgs = self.oriented_etgs(e, u);
                for (o, p) in etgs.iter_mut().enumerate() {
                    p.order = o;
                }
                let ne = self.edges.len();
                self.edges.push(Some(OptEdge { from: nu, to: v, etgs, lines: g }));
                self.nodes[nu].as_mut().unwrap().edges.push(ne);
                self.nodes[v].as_mut().unwrap().edges.push(ne);

                self.edges[e].as_mut().unwrap().lines.retain(|o| !gset.contains(&o.line));
                return true;
            }
        }
        false
    }

    /// Remove single-line stubs whose line ends at both sides: they carry
    /// no ordering decision and no continuation.
    fn untangle_stump_step(&mut self) -> bool {
        for e in self.edge_refs() {
            if self.edge(e).lines.len() > 1 {
                continue;
            }
            let (f, t) = {
                let edge = self.edge(e);
                (edge.from, edge.to)
            };
            for &(stub, n) in &[(f, t), (t, f)] {
                if self.deg(stub) != 1 || stub == n {
                    continue;
                }
                let continues = self.edge(e).lines.iter().any(|occ| {
                    self.node(n)
                        .edges
                        .iter()
                        .any(|&f2| f2 != e && self.line_continues_into(occ, n, f2))
                });
                if continues {
                    continue;
                }

                debug!("removing stump edge {}", e);
                self.detach(n, e);
                self.nodes[stub] = None;
                self.edges[e] = None;
                return true;
            }
        }
        false
    }
}
