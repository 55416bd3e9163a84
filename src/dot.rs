//! Minimal DOT reader for line graphs. Understands node statements with
//! a `pos` attribute and edge statements with a `lines` attribute:
//!
//! ```text
//! graph {
//!   a [pos="0,0"];
//!   b [pos="100,0", station="Main St"];
//!   a -- b [lines="1,2"];
//! }
//! ```

use failure::Error;
use std::collections::HashMap;
use std::io::Read;
use transitplotlib::error::PlotError;
use transitplotlib::linegraph::{Line, LineGraph, LineOcc};

const LINE_COLORS: &[&str] =
    &["#e2001a", "#0065ae", "#ffcc00", "#00a650", "#9c27b0", "#ff6a00", "#6d6e71"];

fn err(msg: &str) -> Error {
    PlotError::InvalidInput(msg.to_string()).into()
}

/// Strip comments and the surrounding `graph { ... }` shell, returning
/// the statement list.
fn statements(src: &str) -> Result<Vec<String>, Error> {
    let no_comments: String = src
        .lines()
        .map(|l| match l.find("//") {
            Some(i) => &l[..i],
            None => l,
        })
        .collect::<Vec<_>>()
        .join("\n");

    let open = no_comments.find('{').ok_or_else(|| err("missing '{'"))?;
    let close = no_comments.rfind('}').ok_or_else(|| err("missing '}'"))?;
    if close < open {
        return Err(err("malformed graph block"));
    }

    Ok(no_comments[open + 1..close]
        .split(';')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Parse a `[k="v", ...]` attribute block.
fn attrs(stmt: &str) -> Result<(String, HashMap<String, String>), Error> {
    let mut map = HashMap::new();
    let head = match stmt.find('[') {
        None => return Ok((stmt.trim().to_string(), map)),
        Some(i) => {
            let end = stmt.rfind(']').ok_or_else(|| err("missing ']'"))?;
            for kv in stmt[i + 1..end].split(',') {
                let kv = kv.trim();
                if kv.is_empty() {
                    continue;
                }
                let eq = kv.find('=').ok_or_else(|| err("bad attribute"))?;
                let key = kv[..eq].trim().to_string();
                let val = kv[eq + 1..].trim().trim_matches('"').to_string();
                map.insert(key, val);
            }
            stmt[..i].trim().to_string()
        }
    };
    Ok((head, map))
}

pub fn read_line_graph(mut r: impl Read) -> Result<LineGraph, Error> {
    let mut buf = String::new();
    r.read_to_string(&mut buf)?;

    let mut g = LineGraph::new();
    let mut nd_ids: HashMap<String, usize> = HashMap::new();

    // nodes first: edges may reference nodes in any statement order
    let stmts = statements(&buf)?;
    for stmt in stmts.iter().filter(|s| !s.contains("--")) {
        let (id, a) = attrs(stmt)?;
        if id == "graph" || id == "node" || id == "edge" {
            continue;
        }
        let pos = a.get("pos").ok_or_else(|| err("node without pos"))?;
        let xy: Vec<&str> = pos.split(',').collect();
        if xy.len() != 2 {
            return Err(err("pos must be \"x,y\""));
        }
        let x: f64 = xy[0].trim().parse().map_err(|_| err("bad x coordinate"))?;
        let y: f64 = xy[1].trim().parse().map_err(|_| err("bad y coordinate"))?;
        let nd = g.add_node(&id, (x, y), a.get("station").cloned());
        nd_ids.insert(id, nd);
    }

    for stmt in stmts.iter().filter(|s| s.contains("--")) {
        let (head, a) = attrs(stmt)?;
        let ends: Vec<&str> = head.split("--").map(|s| s.trim()).collect();
        if ends.len() != 2 {
            return Err(err("edge must have exactly two endpoints"));
        }
        let from = *nd_ids
            .get(ends[0])
            .ok_or_else(|| PlotError::InvalidInput(format!("unknown node '{}'", ends[0])))?;
        let to = *nd_ids
            .get(ends[1])
            .ok_or_else(|| PlotError::InvalidInput(format!("unknown node '{}'", ends[1])))?;

        let mut occs = Vec::new();
        if let Some(ls) = a.get("lines") {
            for lid in ls.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
                let line = g.add_line(Line {
                    id: lid.to_string(),
                    label: lid.to_string(),
                    color: LINE_COLORS[g.lines.len() % LINE_COLORS.len()].to_string(),
                });
                occs.push(LineOcc { line, direction: None });
            }
        }
        g.add_edge(from, to, vec![], occs);
    }

    if g.num_nodes() == 0 {
        return Err(err("empty graph"));
    }

    g.build_fronts();
    Ok(g)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_small_graph() {
        let src = r#"
        // a tiny corridor
        graph {
          a [pos="0,0"];
          b [pos="100,0", station="Mid"];
          c [pos="200,0"];
          a -- b [lines="1,2"];
          b -- c [lines="1"];
        }"#;

        let g = read_line_graph(src.as_bytes()).unwrap();
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.num_edges(), 2);
        assert_eq!(g.lines.len(), 2);
        assert_eq!(g.edge(0).lines.len(), 2);
        assert_eq!(g.node(1).station.as_deref(), Some("Mid"));
        // the same line id resolves to the same line
        assert_eq!(g.edge(0).lines[0].line, g.edge(1).lines[0].line);
    }

    #[test]
    fn test_rejects_unknown_node() {
        let src = r#"graph { a [pos="0,0"]; a -- b [lines="1"]; }"#;
        assert!(read_line_graph(src.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_empty() {
        assert!(read_line_graph("graph { }".as_bytes()).is_err());
    }
}
