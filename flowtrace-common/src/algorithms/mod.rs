// private sub-module defined in other files
mod d8;
mod upstream_elevation;

// exports identifiers from private sub-modules in the current module namespace
pub use self::d8::{
    flows_back, is_diagonal, is_valid_pointer, next_cells, DownstreamCell, DownstreamCells,
    D8_CODES, D8_OFFSETS,
};
pub use self::upstream_elevation::{
    propagate, Propagation, PropagationError, PropagationReport, TraversalMode,
    UpstreamElevation, DEFAULT_MAX_SWEEPS, DEFAULT_STEP_CEILING,
};
