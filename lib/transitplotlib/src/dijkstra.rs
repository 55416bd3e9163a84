//! A* shortest path over the port graph of a [`GridGraph`], from a set of
//! open source cells to a set of open target cells, with a cost cutoff.

use crate::basegraph::{opp, GeoPens, GridGraph, NDIRS};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

const CENTER: u8 = NDIRS as u8;

fn enc(c: usize, role: u8) -> u32 {
    (c as u32) * 16 + role as u32
}

fn dec(n: u32) -> (usize, u8) {
    ((n / 16) as usize, (n % 16) as u8)
}

#[derive(Debug, Clone)]
pub struct RouteResult {
    /// Cell sequence from the chosen source to the chosen target.
    pub cells: Vec<usize>,
    /// Canonical hop edge keys, in path order.
    pub hops: Vec<(usize, u8)>,
    /// Raw hop costs plus geo-course penalties.
    pub hop_cost: f64,
    /// Turn-edge costs plus the injected port biases at the endpoints.
    pub bend_cost: f64,
}

/// Run the search. `cutoff` bounds the f-value: once every open node
/// exceeds it the search aborts. Costs charged on the first and last sink
/// edges (the opening offsets) are part of the search but not of the
/// returned cost components.
pub fn shortest_path(
    gg: &GridGraph,
    sources: &BTreeSet<usize>,
    targets: &BTreeSet<usize>,
    cutoff: f64,
    geo_pens: Option<&GeoPens>,
) -> Option<RouteResult> {
    debug_assert!(sources.is_disjoint(targets));

    let heur = gg.heur(targets);
    let mut dist: HashMap<u32, f64> = HashMap::new();
    let mut prev: HashMap<u32, u32> = HashMap::new();
    let mut pq: BinaryHeap<(Reverse<OrderedFloat<f64>>, u32)> = BinaryHeap::new();

    for &s in sources {
        let n = enc(s, CENTER);
        dist.insert(n, 0.0);
        pq.push((Reverse(OrderedFloat(heur.h(gg.latt_of(s)))), n));
    }

    while let Some((Reverse(OrderedFloat(f)), n)) = pq.pop() {
        if f > cutoff {
            return None;
        }
        let (c, role) = dec(n);
        let g = dist[&n];
        if f - heur.h(gg.latt_of(c)) > g + 1e-9 {
            continue; // stale heap entry
        }

        if role == CENTER && targets.contains(&c) && prev.contains_key(&n) {
            return Some(reconstruct(gg, &prev, n, geo_pens));
        }

        let mut relax = |m: u32, w: f64, dist: &mut HashMap<u32, f64>,
                         prev: &mut HashMap<u32, u32>,
                         pq: &mut BinaryHeap<(Reverse<OrderedFloat<f64>>, u32)>| {
            if w == std::f64::INFINITY {
                return;
            }
            let ng = g + w;
            if ng < *dist.get(&m).unwrap_or(&std::f64::INFINITY) - 1e-12 {
                dist.insert(m, ng);
                prev.insert(m, n);
                let (mc, _) = dec(m);
                pq.push((Reverse(OrderedFloat(ng + heur.h(gg.latt_of(mc)))), m));
            }
        };

        if role == CENTER {
            // leaving a source through its sink edges
            if let Some(off) = gg.sink_fr(c) {
                for d in gg.dirs() {
                    relax(
                        enc(c, d),
                        off + gg.port_bias(c, d),
                        &mut dist,
                        &mut prev,
                        &mut pq,
                    );
                }
            }
            continue;
        }

        let d = role;

        // hop to the facing port of the neighbor cell
        if let Some(hop) = gg.hop(c, d) {
            if !hop.is_blocked() && hop.resident().is_none() {
                let nb = gg.neighbor(c, d).unwrap();
                if !gg.is_closed(nb) {
                    let geo = geo_pens
                        .and_then(|m| gg.canonical_hop(c, d).and_then(|k| m.get(&k)))
                        .cloned()
                        .unwrap_or(0.0);
                    relax(
                        enc(nb, opp(d)),
                        hop.raw_cost() + geo,
                        &mut dist,
                        &mut prev,
                        &mut pq,
                    );
                }
            }
        }

        // turn edges; closed while the cell is settled
        if !gg.is_cell_settled(c) && !gg.is_closed(c) {
            for d2 in gg.dirs() {
                if d2 == d {
                    continue;
                }
                relax(enc(c, d2), gg.turn_cost(d, d2), &mut dist, &mut prev, &mut pq);
            }
        }

        // sink edge into a target center
        if let Some(off) = gg.sink_to(c) {
            relax(
                enc(c, CENTER),
                off + gg.port_bias(c, d),
                &mut dist,
                &mut prev,
                &mut pq,
            );
        }
    }

    None
}

fn reconstruct(
    gg: &GridGraph,
    prev: &HashMap<u32, u32>,
    target: u32,
    geo_pens: Option<&GeoPens>,
) -> RouteResult {
    let mut chain = vec![target];
    let mut cur = target;
    while let Some(&p) = prev.get(&cur) {
        chain.push(p);
        cur = p;
    }
    chain.reverse();

    let mut cells = Vec::new();
    let mut hops = Vec::new();
    let mut hop_cost = 0.0;
    let mut bend_cost = 0.0;

    for w in chain.windows(2) {
        let (c1, r1) = dec(w[0]);
        let (c2, r2) = dec(w[1]);
        if r1 == CENTER {
            cells.push(c1);
            // source sink edge: only the injected bias counts
            bend_cost += gg.port_bias(c1, r2);
        } else if r2 == CENTER {
            bend_cost += gg.port_bias(c1, r1);
        } else if c1 != c2 {
            // hop edge
            cells.push(c2);
            let key = gg.canonical_hop(c1, r1).unwrap();
            hops.push(key);
            hop_cost += gg.hop(c1, r1).unwrap().raw_cost();
            if let Some(m) = geo_pens {
                hop_cost += m.get(&key).cloned().unwrap_or(0.0);
            }
        } else {
            // turn edge
            bend_cost += gg.turn_cost(r1, r2);
        }
    }

    RouteResult { cells, hops, hop_cost, bend_cost }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basegraph::{BaseGraphType, GridGraph, Penalties};
    use crate::geo::BBox;

    fn grid() -> GridGraph {
        let bbox = BBox { min: (0.0, 0.0), max: (100.0, 100.0) };
        GridGraph::new(BaseGraphType::Octi, bbox, 10.0, 0.5, Penalties::default())
    }

    #[test]
    fn test_straight_route() {
        let mut gg = grid();
        let s = gg.nearest_cell((0.0, 50.0));
        let t = gg.nearest_cell((40.0, 50.0));
        gg.open_sink_fr(s, 0.0);
        gg.open_sink_to(t, 0.0);
        let (src, tgt): (BTreeSet<_>, BTreeSet<_>) =
            (Some(s).into_iter().collect(), Some(t).into_iter().collect());

        let res = shortest_path(&gg, &src, &tgt, std::f64::INFINITY, None).unwrap();
        assert_eq!(res.cells.len(), 5);
        assert_eq!(res.hops.len(), 4);
        assert_eq!(res.bend_cost, 0.0);
        let p = Penalties::default();
        assert!((res.hop_cost - 4.0 * (p.hop + p.horizontal_pen)).abs() < 1e-9);
    }

    #[test]
    fn test_cutoff_aborts() {
        let mut gg = grid();
        let s = gg.nearest_cell((0.0, 50.0));
        let t = gg.nearest_cell((40.0, 50.0));
        gg.open_sink_fr(s, 0.0);
        gg.open_sink_to(t, 0.0);
        let (src, tgt): (BTreeSet<_>, BTreeSet<_>) =
            (Some(s).into_iter().collect(), Some(t).into_iter().collect());

        assert!(shortest_path(&gg, &src, &tgt, 0.5, None).is_none());
    }

    #[test]
    fn test_no_route_through_settled_cell() {
        let mut gg = grid();
        let s = gg.nearest_cell((20.0, 50.0));
        let t = gg.nearest_cell((40.0, 50.0));
        // a station occupies the cell in between: its turn edges are
        // closed, so the path has to go around
        let mid = gg.nearest_cell((30.0, 50.0));
        gg.settle_nd(mid, 9);

        gg.open_sink_fr(s, 0.0);
        gg.open_sink_to(t, 0.0);
        let (src, tgt): (BTreeSet<_>, BTreeSet<_>) =
            (Some(s).into_iter().collect(), Some(t).into_iter().collect());

        let res = shortest_path(&gg, &src, &tgt, std::f64::INFINITY, None).unwrap();
        assert!(!res.cells.contains(&mid));
    }

    #[test]
    fn test_detour_around_resident() {
        let mut gg = grid();
        let s = gg.nearest_cell((20.0, 50.0));
        let t = gg.nearest_cell((30.0, 50.0));
        // the direct hop is taken by another comb edge
        gg.settle_edg(s, t, 7);

        gg.open_sink_fr(s, 0.0);
        gg.open_sink_to(t, 0.0);
        let (src, tgt): (BTreeSet<_>, BTreeSet<_>) =
            (Some(s).into_iter().collect(), Some(t).into_iter().collect());

        let res = shortest_path(&gg, &src, &tgt, std::f64::INFINITY, None).unwrap();
        assert!(res.hops.len() >= 2);
        assert!(res.bend_cost > 0.0);
        for &(c, d) in &res.hops {
            assert!(gg.hop(c, d).unwrap().resident().is_none());
        }
    }
}
