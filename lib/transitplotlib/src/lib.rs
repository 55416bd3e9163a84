//! Library for computing octilinear schematic drawings of transit maps.
//!
//! The pipeline has two halves: the grid embedding engine
//! ([`octilinearizer`]), which routes a contracted transit graph onto a
//! regular 4- or 8-direction grid, and the line ordering optimizer
//! ([`optimizer`]), which decides the lateral order of the lines sharing
//! each drawn edge.

pub mod basegraph;
pub mod combgraph;
pub mod dijkstra;
pub mod drawing;
pub mod error;
pub mod geo;
pub mod linegraph;
pub mod octilinearizer;
pub mod optgraph;
pub mod optimizer;
pub mod scorer;
