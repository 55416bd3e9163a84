//! Scores a line ordering configuration on the optimization graph:
//! crossings between line pairs at nodes (same-segment and
//! different-segment) and separations of adjacent line pairs.

use crate::linegraph::{LineGraph, LineOcc, LineRef};
use crate::optgraph::{OptEdgRef, OptGraph, OptNdRef};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Permutation of `lines` per opt edge, read left-to-right when
/// traveling from the edge's `from` to its `to`.
pub type OptOrderCfg = HashMap<OptEdgRef, Vec<LineOcc>>;

#[derive(Debug, Copy, Clone)]
pub struct OrderPens {
    pub same_seg: f64,
    pub diff_seg: f64,
    pub split: f64,
    /// Multiplier applied at station nodes.
    pub station_factor: f64,
}

impl Default for OrderPens {
    fn default() -> OrderPens {
        OrderPens { same_seg: 4.0, diff_seg: 1.0, split: 3.0, station_factor: 3.0 }
    }
}

pub struct OptGraphScorer<'a> {
    pub og: &'a OptGraph,
    pub lg: &'a LineGraph,
    pub pens: OrderPens,
}

impl<'a> OptGraphScorer<'a> {
    pub fn new(og: &'a OptGraph, lg: &'a LineGraph, pens: OrderPens) -> OptGraphScorer<'a> {
        OptGraphScorer { og, lg, pens }
    }

    fn station_factor(&self, n: OptNdRef) -> f64 {
        match self.og.node(n).node {
            Some(m) if self.lg.node(m).station.is_some() => self.pens.station_factor,
            _ => 1.0,
        }
    }

    pub fn same_seg_pen(&self, n: OptNdRef) -> f64 {
        self.pens.same_seg * self.station_factor(n)
    }

    pub fn diff_seg_pen(&self, n: OptNdRef) -> f64 {
        self.pens.diff_seg * self.station_factor(n)
    }

    pub fn split_pen(&self, n: OptNdRef) -> f64 {
        self.pens.split * self.station_factor(n)
    }

    pub fn score(&self, nodes: &BTreeSet<OptNdRef>, cfg: &OptOrderCfg) -> f64 {
        self.crossing_score(nodes, cfg) + self.splitting_score(nodes, cfg)
    }

    pub fn crossing_score(&self, nodes: &BTreeSet<OptNdRef>, cfg: &OptOrderCfg) -> f64 {
        nodes
            .iter()
            .map(|&n| {
                let (same, diff) = self.num_crossings(n, cfg);
                same as f64 * self.same_seg_pen(n) + diff as f64 * self.diff_seg_pen(n)
            })
            .sum()
    }

    pub fn splitting_score(&self, nodes: &BTreeSet<OptNdRef>, cfg: &OptOrderCfg) -> f64 {
        nodes.iter().map(|&n| self.num_separations(n, cfg) as f64 * self.split_pen(n)).sum()
    }

    /// Position of a line on an edge as seen from node `n`: reading
    /// direction is normalized so that flipping the edge's orientation
    /// (and its configured order with it) leaves the value unchanged.
    fn rel_pos(&self, cfg: &OptOrderCfg, e: OptEdgRef, n: OptNdRef, line: LineRef) -> usize {
        let order = &cfg[&e];
        let idx = order
            .iter()
            .position(|o| o.line == line)
            .expect("line missing from ordering configuration");
        if self.og.edge(e).from == n {
            idx
        } else {
            order.len() - 1 - idx
        }
    }

    fn idx_pos(&self, cfg: &OptOrderCfg, e: OptEdgRef, line: LineRef) -> usize {
        cfg[&e].iter().position(|o| o.line == line).expect("line missing from configuration")
    }

    /// Unordered pairs of distinct lines on an edge.
    pub fn line_pairs(&self, e: OptEdgRef) -> Vec<(LineOcc, LineOcc)> {
        let lines = &self.og.edge(e).lines;
        let mut out = Vec::new();
        for i in 0..lines.len() {
            for j in (i + 1)..lines.len() {
                if lines[i].line == lines[j].line {
                    continue;
                }
                // stable pair identity regardless of edge orientation
                if lines[i].line < lines[j].line {
                    out.push((lines[i], lines[j]));
                } else {
                    out.push((lines[j], lines[i]));
                }
            }
        }
        out
    }

    /// Edges at `n` both pair lines continue into.
    pub fn edge_partners(
        &self,
        n: OptNdRef,
        ea: OptEdgRef,
        lp: (LineOcc, LineOcc),
    ) -> Vec<OptEdgRef> {
        self.og
            .node(n)
            .edges
            .iter()
            .cloned()
            .filter(|&eb| {
                eb != ea
                    && self.og.line_continues_into(&lp.0, n, eb)
                    && self.og.line_continues_into(&lp.1, n, eb)
            })
            .collect()
    }

    /// Distinct target pairs: the first line continues into one edge, the
    /// second into another.
    pub fn edge_partner_pairs(
        &self,
        n: OptNdRef,
        ea: OptEdgRef,
        lp: (LineOcc, LineOcc),
    ) -> Vec<(OptEdgRef, OptEdgRef)> {
        let mut out = Vec::new();
        for &eb in &self.og.node(n).edges {
            if eb == ea || !self.og.line_continues_into(&lp.0, n, eb) {
                continue;
            }
            for &ec in &self.og.node(n).edges {
                if ec == ea || ec == eb || !self.og.line_continues_into(&lp.1, n, ec) {
                    continue;
                }
                out.push((eb, ec));
            }
        }
        out
    }

    /// Clockwise rank of `e` counted from `base` at node `n`.
    fn rank_from(&self, n: OptNdRef, base: OptEdgRef, e: OptEdgRef) -> usize {
        let edges = &self.og.node(n).edges;
        let pb = edges.iter().position(|&x| x == base).unwrap();
        let pe = edges.iter().position(|&x| x == e).unwrap();
        (pe + edges.len() - pb) % edges.len()
    }

    /// Whether the pair keeps or inverts its relative order across two
    /// edges sharing `n`; equal orders seen from the node mean a
    /// crossing.
    pub fn crosses_same(
        &self,
        n: OptNdRef,
        ea: OptEdgRef,
        eb: OptEdgRef,
        lp: (LineOcc, LineOcc),
        cfg: &OptOrderCfg,
    ) -> bool {
        let a = self.rel_pos(cfg, ea, n, lp.0.line) < self.rel_pos(cfg, ea, n, lp.1.line);
        let b = self.rel_pos(cfg, eb, n, lp.0.line) < self.rel_pos(cfg, eb, n, lp.1.line);
        a == b
    }

    /// The pair fans out into two distinct edges; crossing when the
    /// lateral order on `ea` disagrees with the clockwise order of the
    /// targets.
    pub fn crosses_diff(
        &self,
        n: OptNdRef,
        ea: OptEdgRef,
        targets: (OptEdgRef, OptEdgRef),
        lp: (LineOcc, LineOcc),
        cfg: &OptOrderCfg,
    ) -> bool {
        let a = self.rel_pos(cfg, ea, n, lp.0.line) < self.rel_pos(cfg, ea, n, lp.1.line);
        let r = self.rank_from(n, ea, targets.0) < self.rank_from(n, ea, targets.1);
        a == r
    }

    /// Same-segment and different-segment crossings at a node. Every
    /// unordered edge pair is counted exactly once.
    pub fn num_crossings(&self, n: OptNdRef, cfg: &OptOrderCfg) -> (usize, usize) {
        if self.og.node(n).node.is_none() {
            return (0, 0);
        }
        let mut same = 0;
        let mut diff = 0;
        let mut proced: HashMap<(LineRef, LineRef), HashSet<OptEdgRef>> = HashMap::new();

        for &ea in &self.og.node(n).edges {
            for lp in self.line_pairs(ea) {
                let key = (lp.0.line, lp.1.line);
                proced.entry(key).or_insert_with(HashSet::new).insert(ea);

                for eb in self.edge_partners(n, ea, lp) {
                    if proced.get(&key).map_or(false, |s| s.contains(&eb)) {
                        continue;
                    }
                    if self.crosses_same(n, ea, eb, lp, cfg) {
                        same += 1;
                    }
                }

                for (eb, ec) in self.edge_partner_pairs(n, ea, lp) {
                    if self.crosses_diff(n, ea, (eb, ec), lp, cfg) {
                        diff += 1;
                    }
                }
            }
        }

        (same, diff)
    }

    /// A separation: the pair is adjacent on `ea` but no longer adjacent
    /// on a partner edge.
    pub fn num_separations(&self, n: OptNdRef, cfg: &OptOrderCfg) -> usize {
        if self.og.node(n).node.is_none() {
            return 0;
        }
        let mut seps = 0;
        for &ea in &self.og.node(n).edges {
            for lp in self.line_pairs(ea) {
                for eb in self.edge_partners(n, ea, lp) {
                    let a_adj = (self.idx_pos(cfg, ea, lp.0.line) as isize
                        - self.idx_pos(cfg, ea, lp.1.line) as isize)
                        .abs()
                        == 1;
                    let b_adj = (self.idx_pos(cfg, eb, lp.0.line) as isize
                        - self.idx_pos(cfg, eb, lp.1.line) as isize)
                        .abs()
                        == 1;
                    if a_adj && !b_adj {
                        seps += 1;
                    }
                }
            }
        }
        seps
    }
}

/// The identity configuration: every edge keeps its input line order.
pub fn identity_cfg(og: &OptGraph) -> OptOrderCfg {
    og.edge_refs().into_iter().map(|e| (e, og.edge(e).lines.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linegraph::{Line, LineGraph};

    fn mkline(g: &mut LineGraph, id: &str) -> LineRef {
        g.add_line(Line { id: id.to_string(), label: id.to_string(), color: "#0a0".to_string() })
    }

    fn occ(l: LineRef) -> LineOcc {
        LineOcc { line: l, direction: None }
    }

    /// Straight two-edge corridor carrying two lines.
    fn corridor() -> (LineGraph, OptGraph, LineRef, LineRef) {
        let mut g = LineGraph::new();
        let l1 = mkline(&mut g, "1");
        let l2 = mkline(&mut g, "2");
        let a = g.add_node("a", (0.0, 0.0), None);
        let n = g.add_node("n", (1.0, 0.0), None);
        let b = g.add_node("b", (2.0, 0.0), None);
        g.add_edge(a, n, vec![], vec![occ(l1), occ(l2)]);
        // deliberately reversed orientation for the second edge
        g.add_edge(b, n, vec![], vec![occ(l1), occ(l2)]);
        let og = OptGraph::new(&g);
        (g, og, l1, l2)
    }

    #[test]
    fn test_same_seg_crossing() {
        let (g, og, _l1, _l2) = corridor();
        let pens = OrderPens { station_factor: 1.0, ..Default::default() };
        let scorer = OptGraphScorer::new(&og, &g, pens);
        let n = og.node_refs().into_iter().find(|&n| og.deg(n) == 2).unwrap();

        // edge 0 runs a->n, edge 1 runs b->n; keeping the same index
        // order on both means the pair swaps sides at n
        let mut cfg = identity_cfg(&og);
        assert_eq!(scorer.num_crossings(n, &cfg), (1, 0));

        // flipping one side resolves it
        cfg.get_mut(&1).unwrap().reverse();
        assert_eq!(scorer.num_crossings(n, &cfg), (0, 0));
        assert_eq!(scorer.num_separations(n, &cfg), 0);
    }

    #[test]
    fn test_orientation_symmetry() {
        // reversing an edge's orientation together with its configured
        // order leaves all counts unchanged
        let (g, mut og, _l1, _l2) = corridor();
        let n = og.node_refs().into_iter().find(|&n| og.deg(n) == 2).unwrap();

        let cfg = identity_cfg(&og);
        let before = {
            let scorer = OptGraphScorer::new(&og, &g, OrderPens::default());
            (scorer.num_crossings(n, &cfg), scorer.num_separations(n, &cfg))
        };

        // flip edge 1: swap endpoints and reverse the configured order
        let mut cfg2 = cfg.clone();
        {
            let e = og.edges[1].as_mut().unwrap();
            std::mem::swap(&mut e.from, &mut e.to);
            e.lines.reverse();
        }
        cfg2.get_mut(&1).unwrap().reverse();

        let scorer = OptGraphScorer::new(&og, &g, OrderPens::default());
        let after = (scorer.num_crossings(n, &cfg2), scorer.num_separations(n, &cfg2));
        assert_eq!(before, after);
    }

    #[test]
    fn test_separation() {
        // three lines through a corridor; the partner side pulls the
        // middle line out
        let mut g = LineGraph::new();
        let l1 = mkline(&mut g, "1");
        let l2 = mkline(&mut g, "2");
        let l3 = mkline(&mut g, "3");
        let a = g.add_node("a", (0.0, 0.0), None);
        let n = g.add_node("n", (1.0, 0.0), None);
        let b = g.add_node("b", (2.0, 0.0), None);
        g.add_edge(a, n, vec![], vec![occ(l1), occ(l2), occ(l3)]);
        g.add_edge(n, b, vec![], vec![occ(l1), occ(l2), occ(l3)]);
        let og = OptGraph::new(&g);
        let pens = OrderPens { station_factor: 1.0, ..Default::default() };
        let scorer = OptGraphScorer::new(&og, &g, pens);

        let mut cfg = identity_cfg(&og);
        // [1,2,3] vs [1,3,2]: the pair (1,2) is adjacent on the first
        // edge only, (2,3) stays adjacent on both, (1,3) becomes
        // adjacent on the second edge only
        let order = vec![occ(l1), occ(l3), occ(l2)];
        cfg.insert(1, order);

        // separations seen from the first edge: (1,2); seen from the
        // second: (1,2) is the broken one there too... count both
        // directions
        let seps = scorer.num_separations(n, &cfg);
        assert_eq!(seps, 2);

        let (same, _diff) = scorer.num_crossings(n, &cfg);
        // exactly one inversion between the two orders as seen from n
        assert_eq!(same, 1);
    }

    #[test]
    fn test_diff_seg_crossing() {
        // two lines fanning out of a trunk into two branches; the trunk
        // order either matches the clockwise branch order or crosses
        let mut g = LineGraph::new();
        let l1 = mkline(&mut g, "1");
        let l2 = mkline(&mut g, "2");
        let a = g.add_node("a", (-1.0, 0.0), None);
        let n = g.add_node("n", (0.0, 0.0), None);
        let up = g.add_node("up", (1.0, 1.0), None);
        let dn = g.add_node("dn", (1.0, -1.0), None);
        g.add_edge(a, n, vec![], vec![occ(l1), occ(l2)]);
        g.add_edge(n, up, vec![], vec![occ(l1)]);
        g.add_edge(n, dn, vec![], vec![occ(l2)]);
        let og = OptGraph::new(&g);
        let pens = OrderPens { station_factor: 1.0, ..Default::default() };
        let scorer = OptGraphScorer::new(&og, &g, pens);
        let cfg = identity_cfg(&og);

        let (_, diff_a) = scorer.num_crossings(1, &cfg);
        let mut cfg2 = cfg.clone();
        cfg2.get_mut(&0).unwrap().reverse();
        let (_, diff_b) = scorer.num_crossings(1, &cfg2);

        // exactly one of the two orders crosses
        assert_eq!(diff_a + diff_b, 1);
    }
}
