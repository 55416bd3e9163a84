//! The mutable embedding state: which grid cell every comb node sits on,
//! which grid path every comb edge follows, and the accumulated score.

use crate::basegraph::GridGraph;
use crate::combgraph::{CombEdgRef, CombNdRef};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct EdgePath {
    /// Cell sequence oriented from the comb edge's `from` to its `to`.
    pub cells: Vec<usize>,
    /// Canonical hop edge keys.
    pub hops: Vec<(usize, u8)>,
}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Score {
    pub hop: f64,
    pub bend: f64,
    pub mv: f64,
    pub dense: f64,
}

impl Score {
    pub fn total(&self) -> f64 {
        self.hop + self.bend + self.mv + self.dense
    }
}

/// A drawing starts out infeasible (infinite score) and becomes scoreable
/// with the first recorded edge. `crumble` resets it.
#[derive(Debug, Clone, Default)]
pub struct Drawing {
    nd_pos: HashMap<CombNdRef, usize>,
    paths: HashMap<CombEdgRef, EdgePath>,
    edge_hop_costs: HashMap<CombEdgRef, f64>,
    edge_bend_costs: HashMap<CombEdgRef, f64>,
    nd_move_costs: HashMap<CombNdRef, f64>,
    nd_dense_costs: HashMap<CombNdRef, f64>,
    empty: bool,
}

impl Drawing {
    pub fn new() -> Drawing {
        Drawing { empty: true, ..Default::default() }
    }

    pub fn score(&self) -> f64 {
        if self.empty {
            return std::f64::INFINITY;
        }
        self.full_score().total()
    }

    pub fn full_score(&self) -> Score {
        Score {
            hop: self.edge_hop_costs.values().sum(),
            bend: self.edge_bend_costs.values().sum(),
            mv: self.nd_move_costs.values().sum(),
            dense: self.nd_dense_costs.values().sum(),
        }
    }

    pub fn grid_pos(&self, nd: CombNdRef) -> Option<usize> {
        self.nd_pos.get(&nd).cloned()
    }

    pub fn path(&self, e: CombEdgRef) -> Option<&EdgePath> {
        self.paths.get(&e)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (CombNdRef, usize)> + '_ {
        self.nd_pos.iter().map(|(&n, &c)| (n, c))
    }

    pub fn record_edge(&mut self, e: CombEdgRef, path: EdgePath, hop_cost: f64, bend_cost: f64) {
        self.empty = false;
        self.paths.insert(e, path);
        self.edge_hop_costs.insert(e, hop_cost);
        self.edge_bend_costs.insert(e, bend_cost);
    }

    pub fn record_nd(&mut self, nd: CombNdRef, cell: usize, mv: f64, dense: f64) {
        self.empty = false;
        if self.nd_pos.insert(nd, cell).is_none() {
            self.nd_move_costs.insert(nd, mv);
            self.nd_dense_costs.insert(nd, dense);
        }
    }

    pub fn erase_edge(&mut self, e: CombEdgRef) {
        self.paths.remove(&e);
        self.edge_hop_costs.remove(&e);
        self.edge_bend_costs.remove(&e);
    }

    pub fn erase_nd(&mut self, nd: CombNdRef) {
        self.nd_pos.remove(&nd);
        self.nd_move_costs.remove(&nd);
        self.nd_dense_costs.remove(&nd);
    }

    /// Reset to the initial infeasible state.
    pub fn crumble(&mut self) {
        self.nd_pos.clear();
        self.paths.clear();
        self.edge_hop_costs.clear();
        self.edge_bend_costs.clear();
        self.nd_move_costs.clear();
        self.nd_dense_costs.clear();
        self.empty = true;
    }

    pub fn apply_to_grid(&self, gg: &mut GridGraph) {
        for (&nd, &c) in &self.nd_pos {
            gg.settle_nd(c, nd);
        }
        for (&e, _) in &self.paths {
            self.apply_edge_to_grid(e, gg);
        }
    }

    pub fn erase_from_grid(&self, gg: &mut GridGraph) {
        for (&e, _) in &self.paths {
            self.erase_edge_from_grid(e, gg);
        }
        for (&nd, _) in &self.nd_pos {
            gg.unsettle_nd(nd);
        }
    }

    pub fn apply_edge_to_grid(&self, e: CombEdgRef, gg: &mut GridGraph) {
        if let Some(path) = self.paths.get(&e) {
            for w in path.cells.windows(2) {
                gg.settle_edg(w[0], w[1], e);
            }
        }
    }

    pub fn erase_edge_from_grid(&self, e: CombEdgRef, gg: &mut GridGraph) {
        if let Some(path) = self.paths.get(&e) {
            for w in path.cells.windows(2) {
                gg.unsettle_edg(w[0], w[1]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basegraph::{BaseGraphType, GridGraph, Penalties};
    use crate::geo::BBox;

    fn grid() -> GridGraph {
        let bbox = BBox { min: (0.0, 0.0), max: (50.0, 50.0) };
        GridGraph::new(BaseGraphType::Octi, bbox, 10.0, 0.5, Penalties::default())
    }

    #[test]
    fn test_score_is_component_sum() {
        let mut d = Drawing::new();
        assert_eq!(d.score(), std::f64::INFINITY);
        d.record_edge(0, EdgePath { cells: vec![0, 1], hops: vec![(0, 2)] }, 2.0, 1.5);
        d.record_nd(0, 0, 0.25, 0.0);
        d.record_nd(1, 1, 0.5, 2.0);
        let fs = d.full_score();
        assert_eq!(fs.hop, 2.0);
        assert_eq!(fs.bend, 1.5);
        assert_eq!(fs.mv, 0.75);
        assert_eq!(fs.dense, 2.0);
        assert_eq!(d.score(), fs.hop + fs.bend + fs.mv + fs.dense);

        d.crumble();
        assert_eq!(d.score(), std::f64::INFINITY);
    }

    #[test]
    fn test_erase_apply_roundtrip() {
        let mut gg = grid();
        let c1 = gg.nearest_cell((10.0, 10.0));
        let c2 = gg.neighbor(c1, 2).unwrap();
        let c3 = gg.neighbor(c2, 1).unwrap();

        let mut d = Drawing::new();
        d.record_nd(0, c1, 0.0, 0.0);
        d.record_nd(1, c3, 0.0, 0.0);
        d.record_edge(
            0,
            EdgePath { cells: vec![c1, c2, c3], hops: vec![] },
            0.0,
            0.0,
        );
        d.apply_to_grid(&mut gg);

        assert_eq!(gg.hop(c1, 2).unwrap().resident(), Some(0));
        assert_eq!(gg.hop(c2, 1).unwrap().resident(), Some(0));
        assert!(gg.is_cell_settled(c1));

        d.erase_from_grid(&mut gg);
        assert_eq!(gg.hop(c1, 2).unwrap().resident(), None);
        assert!(!gg.is_cell_settled(c1));
        assert!(!gg.is_cell_settled(c3));

        d.apply_to_grid(&mut gg);
        assert_eq!(gg.hop(c1, 2).unwrap().resident(), Some(0));
        assert_eq!(gg.hop(c2, 1).unwrap().resident(), Some(0));
    }
}
