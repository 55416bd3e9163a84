//! transitplot is a command line tool for computing octilinear
//! schematic drawings of transit maps. It reads a line graph from JSON
//! or DOT, embeds it onto a 4- or 8-direction grid, optimizes the order
//! of the lines sharing each edge, and writes the result as JSON or SVG.
//!
//! ```shell
//! transitplot -f json -t svg network.json map.svg
//! ```

mod dot;
mod json;
mod svg_output;

use failure::Error;
use log::info;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use structopt::StructOpt;
use transitplotlib::basegraph::{BaseGraphType, Penalties};
use transitplotlib::error::PlotError;
use transitplotlib::octilinearizer::{DrawCfg, Octilinearizer};
use transitplotlib::optimizer::{CombOptimizer, OptimCfg};

#[derive(Debug)]
enum InputFormat {
    Json,
    Dot,
}

#[derive(Debug)]
enum OutputFormat {
    Json,
    Svg,
}

fn parse_input_format(src: &str) -> Result<InputFormat, String> {
    match src {
        "json" => Ok(InputFormat::Json),
        "dot" => Ok(InputFormat::Dot),
        _ => Err(format!("unrecognized input format: {}", src)),
    }
}

fn parse_output_format(src: &str) -> Result<OutputFormat, String> {
    match src {
        "json" => Ok(OutputFormat::Json),
        "svg" => Ok(OutputFormat::Svg),
        _ => Err(format!("unrecognized output format: {}", src)),
    }
}

fn parse_base_graph(src: &str) -> Result<BaseGraphType, String> {
    match src {
        "grid" => Ok(BaseGraphType::Grid),
        "octigrid" => Ok(BaseGraphType::Octi),
        _ => Err(format!("unrecognized base graph type: {}", src)),
    }
}

#[derive(Debug, StructOpt)]
#[structopt(about = "Octilinear schematic transit maps")]
struct Opt {
    /// Input format (json, dot)
    #[structopt(short = "f", long = "from", default_value = "json",
                parse(try_from_str = parse_input_format))]
    input_format: InputFormat,

    /// Output format (json, svg)
    #[structopt(short = "t", long = "to", default_value = "json",
                parse(try_from_str = parse_output_format))]
    output_format: OutputFormat,

    /// Base grid type (grid = 4 directions, octigrid = 8)
    #[structopt(long = "base-graph", default_value = "octigrid",
                parse(try_from_str = parse_base_graph))]
    base_graph: BaseGraphType,

    /// Grid cell size in world units
    #[structopt(long = "grid-size", default_value = "100")]
    grid_size: f64,

    /// Port spacing factor around the grid cells
    #[structopt(long = "border-rad", default_value = "0.5")]
    border_rad: f64,

    /// Maximum node displacement, in grid cells
    #[structopt(long = "max-gr-dist", default_value = "3")]
    max_gr_dist: f64,

    /// Keep degree-2 chains uncontracted
    #[structopt(long = "no-deg2-heur")]
    no_deg2_heur: bool,

    /// Apply the displacement cap during the local search too
    #[structopt(long = "restr-loc-search")]
    restr_loc_search: bool,

    /// Weight pulling edges toward their geographic course; 0 disables
    #[structopt(long = "geo-pen", default_value = "0")]
    enf_geo_pen: f64,

    /// Obstacle polygons (JSON array of point arrays)
    #[structopt(long = "obstacles", parse(from_os_str))]
    obstacles: Option<PathBuf>,

    /// ILP time limit in seconds
    #[structopt(long = "time-lim", default_value = "60")]
    time_lim: u64,

    /// ILP back-end for the line ordering
    #[structopt(long = "solver", default_value = "cbc")]
    solver: String,

    /// Skip the line ordering step
    #[structopt(long = "no-order")]
    no_order: bool,

    /// Random seed for the routing order shuffles
    #[structopt(long = "seed", default_value = "0")]
    seed: u64,

    /// 45 degree bend penalty
    #[structopt(long = "pen-45", default_value = "1")]
    pen_45: f64,

    /// 90 degree bend penalty
    #[structopt(long = "pen-90", default_value = "1.5")]
    pen_90: f64,

    /// 135 degree bend penalty
    #[structopt(long = "pen-135", default_value = "2.5")]
    pen_135: f64,

    /// Per-cell hop cost
    #[structopt(long = "pen-hop", default_value = "1")]
    pen_hop: f64,

    /// Extra cost of diagonal hops
    #[structopt(long = "pen-diag", default_value = "0.5")]
    pen_diag: f64,

    /// Displacement penalty per world unit
    #[structopt(long = "pen-move", default_value = "0.5")]
    pen_move: f64,

    /// Crowded-neighborhood penalty per settled neighbor
    #[structopt(long = "pen-dense", default_value = "2")]
    pen_dense: f64,

    /// Input file, stdin if not present
    #[structopt(parse(from_os_str))]
    input: Option<PathBuf>,

    /// Output file, stdout if not present
    #[structopt(parse(from_os_str))]
    output: Option<PathBuf>,
}

fn run(opt: &Opt) -> Result<(), Error> {
    let mut g = match (&opt.input, &opt.input_format) {
        (Some(p), InputFormat::Json) => json::read_line_graph(File::open(p)?)?,
        (Some(p), InputFormat::Dot) => dot::read_line_graph(File::open(p)?)?,
        (None, InputFormat::Json) => json::read_line_graph(io::stdin())?,
        (None, InputFormat::Dot) => dot::read_line_graph(io::stdin())?,
    };

    let obstacles = match &opt.obstacles {
        Some(p) => json::read_obstacles(File::open(p)?)?,
        None => Vec::new(),
    };

    let cfg = DrawCfg {
        grid_size: opt.grid_size,
        border_rad: opt.border_rad,
        deg2_heur: !opt.no_deg2_heur,
        max_gr_dist: opt.max_gr_dist,
        restr_loc_search: opt.restr_loc_search,
        enf_geo_pen: opt.enf_geo_pen,
        obstacles,
        pens: Penalties {
            p_45: opt.pen_45,
            p_90: opt.pen_90,
            p_135: opt.pen_135,
            hop: opt.pen_hop,
            diagonal_pen: opt.pen_diag,
            displacement_pen: opt.pen_move,
            density_pen: opt.pen_dense,
            ..Penalties::default()
        },
        seed: opt.seed,
    };

    info!("embedding {} nodes, {} edges", g.num_nodes(), g.num_edges());
    let oct = Octilinearizer::new(opt.base_graph);
    let out = oct.draw(&mut g, &cfg)?;

    let ordering = if opt.no_order {
        None
    } else {
        let optim = CombOptimizer::new(OptimCfg {
            solver: opt.solver.clone(),
            time_lim: opt.time_lim,
            ..OptimCfg::default()
        });
        let res = optim.optimize(&out.graph)?;
        info!(
            "line order: {} same-segment and {} different-segment crossings, {} separations",
            res.same_seg_crossings, res.diff_seg_crossings, res.separations
        );
        Some(res)
    };

    let sink: Box<dyn io::Write> = match &opt.output {
        Some(p) => Box::new(File::create(p)?),
        None => Box::new(io::stdout()),
    };

    match opt.output_format {
        OutputFormat::Json => {
            json::write_line_graph(sink, &out.graph, Some(&out.score), ordering.as_ref())?
        }
        OutputFormat::Svg => svg_output::write_svg(sink, &out.graph, ordering.as_ref())?,
    }

    Ok(())
}

fn exit_code(e: &Error) -> i32 {
    match e.downcast_ref::<PlotError>() {
        Some(PlotError::NoEmbeddingFound(_)) => 2,
        Some(PlotError::SolverUnavailable(_))
        | Some(PlotError::SolverInfeasible)
        | Some(PlotError::SolverTimeout(_)) => 3,
        _ => 1,
    }
}

fn main() {
    env_logger::init();
    let opt = Opt::from_args();
    if let Err(e) = run(&opt) {
        eprintln!("error: {}", e);
        std::process::exit(exit_code(&e));
    }
}
