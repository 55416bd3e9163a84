//! SVG writer for embedded drawings. Parallel lines on an edge are
//! offset sideways in their configured order.

use failure::Error;
use std::io::Write;
use transitplotlib::geo::Pt;
use transitplotlib::linegraph::{LineGraph, LineOcc};
use transitplotlib::optimizer::LineOrdering;

const LINE_WIDTH: f64 = 4.0;
const LINE_SPACING: f64 = 6.0;
const STATION_RADIUS: f64 = 6.0;

fn offset_polyline(pl: &[Pt], off: f64) -> Vec<Pt> {
    if pl.len() < 2 {
        return pl.to_vec();
    }
    let mut out = Vec::with_capacity(pl.len());
    for i in 0..pl.len() {
        let (a, b) = if i == 0 {
            (pl[0], pl[1])
        } else if i == pl.len() - 1 {
            (pl[i - 1], pl[i])
        } else {
            (pl[i - 1], pl[i + 1])
        };
        let (dx, dy) = (b.0 - a.0, b.1 - a.1);
        let len = (dx * dx + dy * dy).sqrt().max(1e-12);
        // normal to the left of the travel direction
        let (nx, ny) = (-dy / len, dx / len);
        out.push((pl[i].0 + off * nx, pl[i].1 + off * ny));
    }
    out
}

fn path_d(pl: &[Pt], h: f64) -> String {
    let mut d = String::new();
    for (i, (x, y)) in pl.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        d.push_str(&format!("{} {:.2} {:.2} ", cmd, x, h - y));
    }
    d.trim_end().to_string()
}

pub fn write_svg(
    mut w: impl Write,
    g: &LineGraph,
    ordering: Option<&LineOrdering>,
) -> Result<(), Error> {
    let bbox = g.bbox();
    if bbox.is_empty() {
        writeln!(w, "<svg xmlns=\"http://www.w3.org/2000/svg\"/>")?;
        return Ok(());
    }
    let pad = 4.0 * LINE_SPACING;
    let width = bbox.max.0 - bbox.min.0 + 2.0 * pad;
    let height = bbox.max.1 - bbox.min.1 + 2.0 * pad;

    writeln!(
        w,
        "<svg width=\"{:.0}\" height=\"{:.0}\" viewBox=\"{:.2} {:.2} {:.2} {:.2}\" \
         xmlns=\"http://www.w3.org/2000/svg\">",
        width,
        height,
        bbox.min.0 - pad,
        bbox.min.1 - pad,
        width,
        height
    )?;

    // y grows upward in world space; flip inside the box
    let h = bbox.max.1 + bbox.min.1;

    for e in g.edge_refs() {
        let edge = g.edge(e);
        let occs: Vec<LineOcc> = match ordering.and_then(|o| o.edge_orders.get(&e)) {
            Some(ord) => ord.clone(),
            None => edge.lines.clone(),
        };
        let m = occs.len() as f64;
        for (k, occ) in occs.iter().enumerate() {
            let off = (k as f64 - (m - 1.0) / 2.0) * LINE_SPACING;
            let pl = offset_polyline(&edge.polyline, off);
            writeln!(
                w,
                "  <path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>",
                path_d(&pl, h),
                g.lines[occ.line].color,
                LINE_WIDTH
            )?;
        }
    }

    for n in g.node_refs() {
        let nd = g.node(n);
        if nd.station.is_none() {
            continue;
        }
        writeln!(
            w,
            "  <circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{}\" fill=\"white\" stroke=\"black\" \
             stroke-width=\"2\"/>",
            nd.pos.0,
            h - nd.pos.1,
            STATION_RADIUS
        )?;
        writeln!(
            w,
            "  <text x=\"{:.2}\" y=\"{:.2}\" font-size=\"12\">{}</text>",
            nd.pos.0 + 2.0 * STATION_RADIUS,
            h - nd.pos.1,
            nd.station.as_deref().unwrap()
        )?;
    }

    writeln!(w, "</svg>")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use transitplotlib::linegraph::Line;

    #[test]
    fn test_svg_contains_paths_and_stations() {
        let mut g = LineGraph::new();
        let l = g.add_line(Line {
            id: "1".to_string(),
            label: "U1".to_string(),
            color: "#e2001a".to_string(),
        });
        let a = g.add_node("a", (0.0, 0.0), Some("A".to_string()));
        let b = g.add_node("b", (100.0, 0.0), None);
        g.add_edge(a, b, vec![], vec![LineOcc { line: l, direction: None }]);

        let mut out = Vec::new();
        write_svg(&mut out, &g, None).unwrap();
        let svg = String::from_utf8(out).unwrap();
        assert!(svg.contains("<path"));
        assert!(svg.contains("#e2001a"));
        assert!(svg.contains("<circle"));
        assert!(svg.contains(">A</text>"));
    }
}
