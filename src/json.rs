//! JSON reader and writer for line graphs: topology, per-edge line
//! lists, per-node geographic points, plus the score report on output.

use failure::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};
use transitplotlib::drawing::Score;
use transitplotlib::error::PlotError;
use transitplotlib::geo::Pt;
use transitplotlib::linegraph::{Line, LineGraph, LineOcc};
use transitplotlib::optimizer::LineOrdering;

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonGraph {
    #[serde(default)]
    pub lines: Vec<Line>,
    pub nodes: Vec<JsonNode>,
    pub edges: Vec<JsonEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<JsonScore>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonEdge {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub polyline: Vec<(f64, f64)>,
    pub lines: Vec<JsonOcc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOcc {
    pub line: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonScore {
    pub hop: f64,
    pub bend: f64,
    pub mv: f64,
    pub dense: f64,
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crossings: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separations: Option<usize>,
}

pub fn read_line_graph(mut r: impl Read) -> Result<LineGraph, Error> {
    let mut buf = String::new();
    r.read_to_string(&mut buf)?;
    let jg: JsonGraph = serde_json::from_str(&buf)
        .map_err(|e| PlotError::InvalidInput(format!("bad JSON: {}", e)))?;

    let mut g = LineGraph::new();
    for l in jg.lines {
        g.add_line(l);
    }

    let mut nd_ids = HashMap::new();
    for n in &jg.nodes {
        let r = g.add_node(&n.id, (n.x, n.y), n.station.clone());
        nd_ids.insert(n.id.clone(), r);
    }

    for e in &jg.edges {
        let from = *nd_ids
            .get(&e.from)
            .ok_or_else(|| PlotError::InvalidInput(format!("unknown node '{}'", e.from)))?;
        let to = *nd_ids
            .get(&e.to)
            .ok_or_else(|| PlotError::InvalidInput(format!("unknown node '{}'", e.to)))?;
        let mut lines = Vec::new();
        for o in &e.lines {
            let line = g
                .lines
                .iter()
                .position(|l| l.id == o.line)
                .ok_or_else(|| PlotError::InvalidInput(format!("unknown line '{}'", o.line)))?;
            let direction = match &o.direction {
                Some(d) => Some(*nd_ids.get(d).ok_or_else(|| {
                    PlotError::InvalidInput(format!("unknown direction node '{}'", d))
                })?),
                None => None,
            };
            lines.push(LineOcc { line, direction });
        }
        let pl: Vec<Pt> = e.polyline.clone();
        g.add_edge(from, to, pl, lines);
    }

    g.build_fronts();
    Ok(g)
}

pub fn write_line_graph(
    mut w: impl Write,
    g: &LineGraph,
    score: Option<&Score>,
    ordering: Option<&LineOrdering>,
) -> Result<(), Error> {
    let nodes: Vec<JsonNode> = g
        .node_refs()
        .map(|n| {
            let nd = g.node(n);
            JsonNode { id: nd.id.clone(), x: nd.pos.0, y: nd.pos.1, station: nd.station.clone() }
        })
        .collect();

    let edges: Vec<JsonEdge> = g
        .edge_refs()
        .map(|e| {
            let ed = g.edge(e);
            let occs = match ordering.and_then(|o| o.edge_orders.get(&e)) {
                Some(ord) => ord.clone(),
                None => ed.lines.clone(),
            };
            JsonEdge {
                from: g.node(ed.from).id.clone(),
                to: g.node(ed.to).id.clone(),
                polyline: ed.polyline.clone(),
                lines: occs
                    .iter()
                    .map(|o| JsonOcc {
                        line: g.lines[o.line].id.clone(),
                        direction: o.direction.map(|d| g.node(d).id.clone()),
                    })
                    .collect(),
            }
        })
        .collect();

    let jg = JsonGraph {
        lines: g.lines.clone(),
        nodes,
        edges,
        score: score.map(|s| JsonScore {
            hop: s.hop,
            bend: s.bend,
            mv: s.mv,
            dense: s.dense,
            total: s.total(),
            crossings: ordering.map(|o| o.same_seg_crossings + o.diff_seg_crossings),
            separations: ordering.map(|o| o.separations),
        }),
    };

    serde_json::to_writer_pretty(&mut w, &jg)?;
    writeln!(w)?;
    Ok(())
}

/// Obstacle input: an array of polygons, each an array of [x, y] pairs.
pub fn read_obstacles(mut r: impl Read) -> Result<Vec<Vec<Pt>>, Error> {
    let mut buf = String::new();
    r.read_to_string(&mut buf)?;
    let polys: Vec<Vec<(f64, f64)>> = serde_json::from_str(&buf)
        .map_err(|e| PlotError::InvalidInput(format!("bad obstacles JSON: {}", e)))?;
    Ok(polys)
}
