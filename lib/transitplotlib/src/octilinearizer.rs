//! The grid embedding engine. Phase 1 routes every comb edge onto the
//! grid with repeated A* tries over shuffled routing orders; phase 2
//! refines the embedding by reseating each node among its grid neighbors
//! with per-worker grid copies.

use crate::basegraph::{BaseGraphType, GeoPensMap, GridGraph, Penalties};
use crate::combgraph::{self, CombEdgRef, CombGraph, CombNdRef};
use crate::dijkstra;
use crate::drawing::{Drawing, EdgePath, Score};
use crate::error::PlotError;
use crate::geo::{self, Pt};
use crate::linegraph::LineGraph;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};

const TRIES: usize = 100;
const ITERS: usize = 100;
const JOBS: usize = 4;

/// Pre-assigned cells for nodes the caller wants fixed during routing,
/// used by the local search to probe reseat positions.
pub type SettledPos = HashMap<CombNdRef, usize>;

#[derive(Debug, Clone)]
pub struct DrawCfg {
    pub grid_size: f64,
    pub border_rad: f64,
    pub deg2_heur: bool,
    pub max_gr_dist: f64,
    pub restr_loc_search: bool,
    pub enf_geo_pen: f64,
    pub obstacles: Vec<Vec<Pt>>,
    pub pens: Penalties,
    pub seed: u64,
}

impl Default for DrawCfg {
    fn default() -> DrawCfg {
        DrawCfg {
            grid_size: 100.0,
            border_rad: 0.5,
            deg2_heur: true,
            max_gr_dist: 3.0,
            restr_loc_search: false,
            enf_geo_pen: 0.0,
            obstacles: Vec::new(),
            pens: Penalties::default(),
            seed: 0,
        }
    }
}

#[derive(Debug)]
pub struct DrawOutput {
    /// The input graph with every edge's course replaced by its embedded
    /// polyline.
    pub graph: LineGraph,
    pub score: Score,
}

pub struct Octilinearizer {
    pub base_graph_type: BaseGraphType,
}

impl Octilinearizer {
    pub fn new(base_graph_type: BaseGraphType) -> Octilinearizer {
        Octilinearizer { base_graph_type }
    }

    pub fn draw(&self, tg: &mut LineGraph, cfg: &DrawCfg) -> Result<DrawOutput, PlotError> {
        if tg.num_nodes() == 0 {
            return Ok(DrawOutput { graph: tg.clone(), score: Score::default() });
        }

        contract_short_edges(tg, cfg.grid_size / 2.0);
        tg.build_fronts();
        let cg = CombGraph::new(tg, cfg.deg2_heur);

        let bbox = tg.bbox().pad(cfg.grid_size + 1.0);

        info!("Creating {} grid graphs...", JOBS);
        let mut ggs: Vec<GridGraph> = (0..JOBS)
            .into_par_iter()
            .map(|_| {
                let mut gg = GridGraph::new(
                    self.base_graph_type,
                    bbox,
                    cfg.grid_size,
                    cfg.border_rad,
                    cfg.pens,
                );
                for obst in &cfg.obstacles {
                    gg.add_obstacle(obst);
                }
                gg
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(cfg.seed);
        let init_order = combgraph::ordering(&cg, false, &mut rng);

        let geo_pens: Option<GeoPensMap> = if cfg.enf_geo_pen > 0.0 {
            info!("Writing geo course penalties...");
            Some(
                init_order
                    .iter()
                    .map(|&e| {
                        (e, ggs[0].write_geo_course_pens(&cg.edges[e].polyline, cfg.enf_geo_pen))
                    })
                    .collect(),
            )
        } else {
            None
        };

        // phase 1: initial embedding
        let mut drawing = Drawing::new();
        let mut found = false;
        for i in 0..TRIES {
            let order = if i == 0 {
                init_order.clone()
            } else {
                combgraph::ordering(&cg, true, &mut rng)
            };

            let cutoff = drawing.score();
            let loc_found = draw_order(
                &order,
                &SettledPos::new(),
                &cg,
                &mut ggs[0],
                &mut drawing,
                cutoff,
                cfg.max_gr_dist,
                geo_pens.as_ref(),
            );

            if loc_found {
                info!(" ++ try {}, score {}", i, drawing.score());
                found = true;
            } else {
                info!(" ++ try {}, score <inf>", i);
            }

            drawing.erase_from_grid(&mut ggs[0]);
            if found {
                break;
            }
            drawing.crumble();
        }

        if !found {
            return Err(PlotError::NoEmbeddingFound(TRIES));
        }

        for gg in ggs.iter_mut() {
            drawing.apply_to_grid(gg);
        }

        // isolated nodes are not part of any routing order; pin them to
        // their nearest free cell
        for nd in 0..cg.nodes.len() {
            if cg.deg(nd) > 0 {
                continue;
            }
            let cell = free_cell_near(&ggs[0], cg.nodes[nd].pos, cfg.grid_size * cfg.max_gr_dist);
            if let Some(cell) = cell {
                let mv = ggs[0].nd_move_pen(cg.nodes[nd].pos, cell);
                let dense = ggs[0].nd_dense_pen(cell);
                drawing.record_nd(nd, cell, mv, dense);
                for gg in ggs.iter_mut() {
                    gg.settle_nd(cell, nd);
                }
            }
        }

        // phase 2: local search
        let mut batches: Vec<Vec<CombNdRef>> = vec![Vec::new(); JOBS];
        let mut c = 0;
        for nd in 0..cg.nodes.len() {
            if cg.deg(nd) == 0 {
                continue;
            }
            batches[c % JOBS].push(nd);
            c += 1;
        }

        info!("Iterating...");
        for iter in 0..ITERS {
            let incumbent = &drawing;
            let best_per_worker: Vec<Drawing> = ggs
                .par_iter_mut()
                .zip(batches.par_iter())
                .map(|(gg, batch)| {
                    local_search_batch(gg, batch, incumbent, &cg, cfg, geo_pens.as_ref())
                })
                .collect();

            let mut best_core = 0;
            let mut best_score = std::f64::INFINITY;
            for (i, d) in best_per_worker.iter().enumerate() {
                if d.score() < best_score {
                    best_score = d.score();
                    best_core = i;
                }
            }
            if best_score.is_infinite() {
                // no worker produced a finite reseat: no improvement
                break;
            }

            let imp = drawing.score() - best_score;
            info!(
                " ++ iter {}, prev {}, next {} ({}{})",
                iter,
                drawing.score(),
                best_score,
                if imp >= 0.0 { "+" } else { "" },
                imp
            );

            for gg in ggs.iter_mut() {
                drawing.erase_from_grid(gg);
                best_per_worker[best_core].apply_to_grid(gg);
            }
            drawing = best_per_worker[best_core].clone();

            if imp < 0.05 {
                break;
            }
        }

        let score = drawing.full_score();
        info!(
            "Hop costs: {}, bend costs: {}, mv costs: {}, dense costs: {}",
            score.hop, score.bend, score.mv, score.dense
        );

        let graph = build_output(tg, &cg, &drawing, &ggs[0]);
        Ok(DrawOutput { graph, score })
    }
}

/// One pass of the phase-2 local search over a worker's batch. The
/// worker's grid mirrors the incumbent on entry and is restored on exit.
fn local_search_batch(
    gg: &mut GridGraph,
    batch: &[CombNdRef],
    incumbent: &Drawing,
    cg: &CombGraph,
    cfg: &DrawCfg,
    geo_pens: Option<&GeoPensMap>,
) -> Drawing {
    let mut best = Drawing::new();

    for &a in batch {
        let cur_cell = match incumbent.grid_pos(a) {
            Some(c) => c,
            None => continue,
        };

        let mut dcp = incumbent.clone();
        for &ce in &cg.nodes[a].adj {
            dcp.erase_edge_from_grid(ce, gg);
            dcp.erase_edge(ce);
        }
        dcp.erase_nd(a);
        gg.unsettle_nd(a);

        for pos in 0..=gg.num_neighbors() {
            let n = match gg.get_neighbor(cur_cell, pos) {
                Some(n) => n,
                None => continue,
            };
            if n != cur_cell && gg.is_cell_settled(n) {
                continue;
            }

            if cfg.restr_loc_search {
                // stay inside the move radius, for consistency with the
                // candidate search
                let gd = geo::dist(cg.nodes[a].pos, gg.center(n));
                if gd >= gg.cell_size * cfg.max_gr_dist {
                    continue;
                }
            }

            let mut run = dcp.clone();
            let mut pre = SettledPos::new();
            pre.insert(a, n);

            // the incumbent best score is a valid A* cutoff: anything
            // above it cannot win
            let found = draw_order(
                &cg.nodes[a].adj,
                &pre,
                cg,
                gg,
                &mut run,
                best.score(),
                cfg.max_gr_dist,
                geo_pens,
            );

            if found && best.score() > run.score() {
                best = run.clone();
            }

            for &ce in &cg.nodes[a].adj {
                run.erase_edge_from_grid(ce, gg);
            }
            if gg.is_settled(a) {
                gg.unsettle_nd(a);
            }
        }

        // restore the incumbent state on this worker's grid
        gg.settle_nd(cur_cell, a);
        for &ce in &cg.nodes[a].adj {
            incumbent.apply_edge_to_grid(ce, gg);
        }
    }

    best
}

/// Route the given comb edges in order. Returns false as soon as one edge
/// cannot be routed within the cutoff; successfully routed edges stay
/// recorded in the drawing (the caller erases or crumbles).
#[allow(clippy::too_many_arguments)]
fn draw_order(
    order: &[CombEdgRef],
    pre_settled: &SettledPos,
    cg: &CombGraph,
    gg: &mut GridGraph,
    drawing: &mut Drawing,
    glob_cutoff: f64,
    max_gr_dist: f64,
    geo_pens: Option<&GeoPensMap>,
) -> bool {
    for &ce in order {
        let cutoff = if drawing.score().is_infinite() {
            std::f64::INFINITY
        } else {
            glob_cutoff - drawing.score()
        };

        let mut fr = cg.edges[ce].from;
        let mut to = cg.edges[ce].to;
        if fr == to {
            // degenerate self loop; keeps its geographic course
            continue;
        }

        let (fr_nds, to_nds) = rt_pair(fr, to, pre_settled, cg, gg, max_gr_dist);
        let (mut fr_nds, mut to_nds) = (fr_nds, to_nds);
        if fr_nds.is_empty() || to_nds.is_empty() {
            return false;
        }

        // orient toward the smaller candidate set: the heuristic is
        // one-to-many toward the targets
        let mut rev = false;
        if to_nds.len() > fr_nds.len() {
            std::mem::swap(&mut fr, &mut to);
            std::mem::swap(&mut fr_nds, &mut to_nds);
            rev = true;
        }

        // sink offsets keep turn penalties undistorted; the displacement
        // penalty is charged here so A* trades it off against path cost
        let mut cost_offset_from = 0.0;
        let mut cost_offset_to = 0.0;
        for &n in &fr_nds {
            if gg.is_settled(fr) {
                gg.open_sink_fr(n, 0.0);
            } else {
                cost_offset_from = gg.pens.p_45 - gg.pens.p_135;
                let mv = gg.nd_move_pen(cg.nodes[fr].pos, n);
                gg.open_sink_fr(n, cost_offset_from + mv);
            }
        }
        for &n in &to_nds {
            if gg.is_settled(to) {
                gg.open_sink_to(n, 0.0);
            } else {
                cost_offset_to = gg.pens.p_45 - gg.pens.p_135;
                let mv = gg.nd_move_pen(cg.nodes[to].pos, n);
                gg.open_sink_to(n, cost_offset_to + mv);
            }
        }

        // node costs only exist between two or more settled edges; a
        // settled endpoint is always a single candidate
        let mut wrote = Vec::new();
        if fr_nds.len() == 1 && gg.is_settled(fr) {
            let n = *fr_nds.iter().next().unwrap();
            write_nd_costs(n, fr, ce, cg, gg);
            wrote.push(n);
        }
        if to_nds.len() == 1 && gg.is_settled(to) {
            let n = *to_nds.iter().next().unwrap();
            write_nd_costs(n, to, ce, cg, gg);
            wrote.push(n);
        }

        let res = dijkstra::shortest_path(
            gg,
            &fr_nds,
            &to_nds,
            cutoff + cost_offset_from + cost_offset_to,
            geo_pens.and_then(|m| m.get(&ce)),
        );

        for &n in &to_nds {
            gg.close_sink_to(n);
        }
        for &n in &fr_nds {
            gg.close_sink_fr(n);
        }
        for n in wrote {
            gg.reset_cost_vec(n);
        }

        let res = match res {
            Some(r) => r,
            None => {
                debug!("no path found for comb edge {}", ce);
                return false;
            }
        };

        let fr_cell = res.cells[0];
        let to_cell = *res.cells.last().unwrap();

        let mut path = EdgePath { cells: res.cells, hops: res.hops };
        if rev {
            path.cells.reverse();
            path.hops.reverse();
        }
        drawing.record_edge(ce, path, res.hop_cost, res.bend_cost);

        settle_res(fr_cell, to_cell, fr, to, ce, cg, gg, drawing);
    }

    true
}

/// Settle both endpoints and mark every hop edge of the path as occupied.
#[allow(clippy::too_many_arguments)]
fn settle_res(
    fr_cell: usize,
    to_cell: usize,
    fr: CombNdRef,
    to: CombNdRef,
    ce: CombEdgRef,
    cg: &CombGraph,
    gg: &mut GridGraph,
    drawing: &mut Drawing,
) {
    for &(nd, cell) in &[(to, to_cell), (fr, fr_cell)] {
        if gg.is_settled(nd) {
            drawing.record_nd(nd, cell, 0.0, 0.0);
        } else {
            let mv = gg.nd_move_pen(cg.nodes[nd].pos, cell);
            let dense = gg.nd_dense_pen(cell);
            gg.settle_nd(cell, nd);
            drawing.record_nd(nd, cell, mv, dense);
        }
    }
    drawing.apply_edge_to_grid(ce, gg);
}

fn write_nd_costs(n: usize, nd: CombNdRef, e: CombEdgRef, cg: &CombGraph, gg: &mut GridGraph) {
    let mut c = gg.topo_block_pen(n, nd, e, cg);
    c += gg.spacing_pen(n, nd, e, cg);
    c += gg.node_bend_pen(n, nd, e, cg);
    gg.add_cost_vec(n, c);
}

/// Candidate source and target cells for one comb edge. Overlapping
/// candidate sets are split by the nearer geographic endpoint; the search
/// radius grows until both sides have at least one candidate.
fn rt_pair(
    fr: CombNdRef,
    to: CombNdRef,
    pre_settled: &SettledPos,
    cg: &CombGraph,
    gg: &GridGraph,
    max_gr_dist: f64,
) -> (BTreeSet<usize>, BTreeSet<usize>) {
    if gg.is_settled(fr) && gg.is_settled(to) {
        return (cands(fr, pre_settled, cg, gg, 0.0), cands(to, pre_settled, cg, gg, 0.0));
    }

    let mut max_dis = gg.cell_size * max_gr_dist;
    let mut fr_out = BTreeSet::new();
    let mut to_out = BTreeSet::new();

    let mut i = 0;
    while (fr_out.is_empty() || to_out.is_empty()) && i < 10 {
        let fr_cands = cands(fr, pre_settled, cg, gg, max_dis);
        let to_cands = cands(to, pre_settled, cg, gg, max_dis);

        let isect: BTreeSet<usize> = fr_cands.intersection(&to_cands).cloned().collect();
        fr_out = fr_cands.difference(&isect).cloned().collect();
        to_out = to_cands.difference(&isect).cloned().collect();

        // split the overlap by the nearer endpoint
        for c in isect {
            if geo::dist(gg.center(c), cg.nodes[fr].pos)
                < geo::dist(gg.center(c), cg.nodes[to].pos)
            {
                fr_out.insert(c);
            } else {
                to_out.insert(c);
            }
        }

        max_dis += i as f64 * 2.0;
        i += 1;
    }

    (fr_out, to_out)
}

fn cands(
    nd: CombNdRef,
    pre_settled: &SettledPos,
    cg: &CombGraph,
    gg: &GridGraph,
    max_dis: f64,
) -> BTreeSet<usize> {
    let mut out = BTreeSet::new();
    if let Some(c) = gg.get_settled(nd) {
        out.insert(c);
    } else if let Some(&c) = pre_settled.get(&nd) {
        if !gg.is_closed(c) {
            out.insert(c);
        }
    } else {
        out = gg.gr_nd_cands(cg.nodes[nd].pos, max_dis);
    }
    out
}

fn free_cell_near(gg: &GridGraph, p: Pt, max_dis: f64) -> Option<usize> {
    use ordered_float::OrderedFloat;
    let mut r = max_dis.max(gg.cell_size);
    for _ in 0..10 {
        let cands = gg.gr_nd_cands(p, r);
        if let Some(&c) = cands.iter().min_by_key(|&&c| OrderedFloat(geo::dist(gg.center(c), p))) {
            return Some(c);
        }
        r *= 2.0;
    }
    None
}

/// Contract edges shorter than `d`, merging their endpoints at the
/// midpoint. Stations absorb plain junctions; two stations never merge.
pub fn contract_short_edges(g: &mut LineGraph, d: f64) {
    let mut changed = true;
    while changed {
        changed = false;
        for e in g.edge_refs().collect::<Vec<_>>() {
            if g.edges[e].is_none() {
                continue;
            }
            let (n1, n2, len) = {
                let ed = g.edge(e);
                (ed.from, ed.to, geo::polyline_len(&ed.polyline))
            };
            if len >= d || n1 == n2 {
                continue;
            }
            if g.node(n1).adj.len() <= 1 || g.node(n2).adj.len() <= 1 {
                continue;
            }
            if g.node(n1).station.is_some() && g.node(n2).station.is_some() {
                continue;
            }

            let p1 = g.node(n1).pos;
            let p2 = g.node(n2).pos;
            let mid = geo::lerp(p1, p2, 0.5);
            let (keep, gone) = if g.node(n2).station.is_some() { (n2, n1) } else { (n1, n2) };

            g.remove_edge(e);
            g.merge_nds(keep, gone);
            g.nodes[keep].as_mut().unwrap().pos = mid;

            changed = true;
            break;
        }
    }
}

/// Replace each line edge's course by its slice of the embedded grid
/// path, and move the nodes onto their grid positions.
fn build_output(tg: &LineGraph, cg: &CombGraph, drawing: &Drawing, gg: &GridGraph) -> LineGraph {
    let mut out = tg.clone();

    for (nd, cell) in drawing.nodes() {
        if nd < cg.nodes.len() {
            out.nodes[cg.nodes[nd].parent].as_mut().unwrap().pos = gg.center(cell);
        }
    }

    for (ce_idx, ce) in cg.edges.iter().enumerate() {
        let path = match drawing.path(ce_idx) {
            Some(p) => p,
            None => continue,
        };
        let pl: Vec<Pt> = path.cells.iter().map(|&c| gg.center(c)).collect();

        let total: f64 = ce
            .chain
            .iter()
            .map(|&(le, _)| geo::polyline_len(&tg.edge(le).polyline))
            .sum();

        let mut cum = 0.0;
        for (i, &(le, fwd)) in ce.chain.iter().enumerate() {
            let len = geo::polyline_len(&tg.edge(le).polyline);
            let (a, b) = if total > 1e-12 {
                (cum / total, (cum + len) / total)
            } else {
                (i as f64 / ce.chain.len() as f64, (i + 1) as f64 / ce.chain.len() as f64)
            };
            cum += len;

            let mut slice = geo::polyline_slice(&pl, a, b);
            if !fwd {
                slice.reverse();
            }

            // intermediate chain nodes move onto the path
            let inner = if fwd { tg.edge(le).to } else { tg.edge(le).from };
            if i + 1 < ce.chain.len() {
                out.nodes[inner].as_mut().unwrap().pos = geo::point_at(&pl, b);
            }

            out.edges[le].as_mut().unwrap().polyline = slice;
        }
    }

    out.build_fronts();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linegraph::{Line, LineOcc};

    fn mkline(g: &mut LineGraph, id: &str) -> usize {
        g.add_line(Line { id: id.to_string(), label: id.to_string(), color: "#e00".to_string() })
    }

    fn occ(l: usize) -> LineOcc {
        LineOcc { line: l, direction: None }
    }

    fn test_pens() -> Penalties {
        Penalties {
            p_0: 0.0,
            p_45: 1.0,
            p_90: 1.5,
            p_135: 2.5,
            hop: 1.0,
            vertical_pen: 0.0,
            horizontal_pen: 0.0,
            diagonal_pen: 0.5,
            density_pen: 0.0,
            displacement_pen: 0.2,
            sink_pen: 0.0,
        }
    }

    fn cfg() -> DrawCfg {
        DrawCfg {
            grid_size: 10.0,
            border_rad: 0.0,
            pens: test_pens(),
            ..Default::default()
        }
    }

    #[test]
    fn test_two_node_straight_line() {
        //  a ---------- b   expected: one straight horizontal run
        let mut g = LineGraph::new();
        let l = mkline(&mut g, "1");
        let a = g.add_node("a", (0.0, 0.0), None);
        let b = g.add_node("b", (100.0, 0.0), None);
        g.add_edge(a, b, vec![], vec![occ(l)]);

        let oct = Octilinearizer::new(BaseGraphType::Octi);
        let out = oct.draw(&mut g, &cfg()).unwrap();

        assert_eq!(out.score.bend, 0.0);
        assert!((out.score.hop - 10.0).abs() < 1e-9, "hop = {}", out.score.hop);
        // both endpoints land on their nearest cells
        assert!(out.score.mv < 1.0);
    }

    #[test]
    fn test_l_shape_one_bend() {
        //  a ---- b
        //         |
        //         c
        let mut g = LineGraph::new();
        let l = mkline(&mut g, "1");
        let a = g.add_node("a", (0.0, 0.0), None);
        let b = g.add_node("b", (100.0, 0.0), None);
        let c = g.add_node("c", (100.0, 100.0), None);
        g.add_edge(a, b, vec![], vec![occ(l)]);
        g.add_edge(b, c, vec![], vec![occ(l)]);

        // keep b a junction so the corner is pinned there
        let mut c2 = cfg();
        c2.deg2_heur = false;

        let oct = Octilinearizer::new(BaseGraphType::Octi);
        let out = oct.draw(&mut g, &c2).unwrap();

        let p = test_pens();
        assert!((out.score.hop - 20.0).abs() < 1e-9, "hop = {}", out.score.hop);
        assert!((out.score.bend - p.p_90).abs() < 1e-9, "bend = {}", out.score.bend);
    }

    #[test]
    fn test_obstacle_detour() {
        // a straight route covered by an obstacle must detour and bend
        let mut g = LineGraph::new();
        let l = mkline(&mut g, "1");
        let a = g.add_node("a", (0.0, 0.0), None);
        let b = g.add_node("b", (100.0, 0.0), None);
        g.add_edge(a, b, vec![], vec![occ(l)]);

        let mut c = cfg();
        c.obstacles = vec![vec![(35.0, -15.0), (65.0, -15.0), (65.0, 15.0), (35.0, 15.0)]];
        // keep the endpoints pinned near their geographic positions
        c.pens.displacement_pen = 1.0;

        let oct = Octilinearizer::new(BaseGraphType::Octi);
        let out = oct.draw(&mut g, &c).unwrap();

        // longer than the straight 10-hop route, with at least one bend
        assert!(out.score.hop >= 10.0);
        assert!(out.score.bend > 0.0);
        let e = out.graph.edge_refs().next().unwrap();
        assert!(geo::polyline_len(&out.graph.edge(e).polyline) >= 100.0);
    }

    #[test]
    fn test_geo_course_penalty_pulls_route() {
        // same two nodes, but the edge's geographic course makes a wide
        // detour over the top; with the course penalty on, the route
        // follows it instead of running straight
        let mut g = LineGraph::new();
        let l = mkline(&mut g, "1");
        let a = g.add_node("a", (0.0, 0.0), None);
        let b = g.add_node("b", (100.0, 0.0), None);
        g.add_edge(
            a,
            b,
            vec![(0.0, 0.0), (0.0, 60.0), (100.0, 60.0), (100.0, 0.0)],
            vec![occ(l)],
        );

        let mut c = cfg();
        c.enf_geo_pen = 10.0;

        let oct = Octilinearizer::new(BaseGraphType::Octi);
        let out = oct.draw(&mut g, &c).unwrap();
        let e = out.graph.edge_refs().next().unwrap();
        let len = geo::polyline_len(&out.graph.edge(e).polyline);
        assert!(len > 140.0, "drawn length = {}", len);
    }

    #[test]
    fn test_empty_graph() {
        let mut g = LineGraph::new();
        let oct = Octilinearizer::new(BaseGraphType::Octi);
        let out = oct.draw(&mut g, &cfg()).unwrap();
        assert_eq!(out.score.total(), 0.0);
    }

    #[test]
    fn test_single_node() {
        let mut g = LineGraph::new();
        g.add_node("a", (50.0, 50.0), Some("A".to_string()));
        let oct = Octilinearizer::new(BaseGraphType::Octi);
        let out = oct.draw(&mut g, &cfg()).unwrap();
        assert_eq!(out.score.hop, 0.0);
        assert_eq!(out.score.bend, 0.0);
    }

    #[test]
    fn test_contract_short_edges() {
        //  a --- b - c --- d    with b-c much shorter than the cell
        let mut g = LineGraph::new();
        let l = mkline(&mut g, "1");
        let a = g.add_node("a", (0.0, 0.0), None);
        let b = g.add_node("b", (50.0, 0.0), None);
        let c = g.add_node("c", (51.0, 0.0), Some("C".to_string()));
        let d = g.add_node("d", (100.0, 0.0), None);
        g.add_edge(a, b, vec![], vec![occ(l)]);
        g.add_edge(b, c, vec![], vec![occ(l)]);
        g.add_edge(c, d, vec![], vec![occ(l)]);

        contract_short_edges(&mut g, 5.0);
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.num_edges(), 2);
        // the station survives the merge
        let merged = g.node_refs().find(|&n| g.node(n).station.is_some()).unwrap();
        assert_eq!(g.node(merged).station.as_deref(), Some("C"));
        assert!((g.node(merged).pos.0 - 50.5).abs() < 1e-9);
    }

    #[test]
    fn test_4_grid_restriction() {
        let mut g = LineGraph::new();
        let l = mkline(&mut g, "1");
        let a = g.add_node("a", (0.0, 0.0), None);
        let b = g.add_node("b", (100.0, 100.0), None);
        g.add_edge(a, b, vec![], vec![occ(l)]);

        let oct = Octilinearizer::new(BaseGraphType::Grid);
        let out = oct.draw(&mut g, &cfg()).unwrap();
        // no diagonals available: a manhattan staircase of 20 hops
        assert!((out.score.hop - 20.0).abs() < 1e-9, "hop = {}", out.score.hop);
        assert!(out.score.bend > 0.0);
    }
}
