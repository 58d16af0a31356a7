/*
Maximum upstream elevation along D8 flow paths.

Every valid cell starts a downstream trace that carries its elevation along the
flow path. In watershed mode a receiving cell keeps the larger of its own value
and the carried one; in longest-stream mode a receiving cell takes the carried
value only when the trace reaches it along a longer path than any seen before.
Sweeps over the grid repeat until one completes without changing anything, or,
in longest-stream mode, without abandoning any trace at the step ceiling.
*/

use super::d8::{flows_back, is_diagonal, next_cells, DownstreamCell};
use crate::structures::Array2D;
use std::fmt;
use std::io::{Error, ErrorKind};
use std::str::FromStr;

/// Number of cell updates a single trace may make before it is abandoned and
/// another sweep is scheduled.
pub const DEFAULT_STEP_CEILING: usize = 950;

/// Upper bound on the number of sweeps over the grid.
pub const DEFAULT_MAX_SWEEPS: usize = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TraversalMode {
    /// Maximum elevation found anywhere upstream.
    #[default]
    Watershed,
    /// Elevation carried along the longest upstream flow path.
    LongestStream,
}

impl FromStr for TraversalMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<TraversalMode, Error> {
        match s.trim().to_uppercase().as_str() {
            "WATERSHED" | "FALSE" => Ok(TraversalMode::Watershed),
            "LONGEST_STREAM" | "LONGEST" | "TRUE" => Ok(TraversalMode::LongestStream),
            other => Err(Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "Unrecognized traversal mode '{}'; expected WATERSHED or LONGEST_STREAM.",
                    other
                ),
            )),
        }
    }
}

impl fmt::Display for TraversalMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TraversalMode::Watershed => write!(f, "WATERSHED"),
            TraversalMode::LongestStream => write!(f, "LONGEST_STREAM"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropagationError {
    ShapeMismatch {
        elevation: (isize, isize),
        flow_dir: (isize, isize),
    },
}

impl fmt::Display for PropagationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PropagationError::ShapeMismatch {
                elevation,
                flow_dir,
            } => write!(
                f,
                "The elevation grid ({} x {}) and flow direction grid ({} x {}) must have the same number of rows and columns.",
                elevation.0, elevation.1, flow_dir.0, flow_dir.1
            ),
        }
    }
}

impl std::error::Error for PropagationError {}

impl From<PropagationError> for Error {
    fn from(err: PropagationError) -> Error {
        Error::new(ErrorKind::InvalidInput, err.to_string())
    }
}

/// Counters describing how a run went.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropagationReport {
    pub sweeps: usize,
    pub cells_updated: usize,
    pub traces_aborted: usize,
    pub branch_faults: usize,
    pub sweep_cap_reached: bool,
}

/// The result of a run: the propagated elevations and, in longest-stream mode,
/// the flow-path length that reached each cell.
#[derive(Clone, Debug)]
pub struct Propagation {
    pub elevation: Array2D<f64>,
    pub flow_length: Option<Array2D<f64>>,
    pub report: PropagationReport,
}

/// Propagates elevations down a D8 pointer grid.
///
/// The pointer grid uses the ESRI codes 1, 2, 4, ..., 128 (E through NE,
/// clockwise), possibly OR-ed together for split flow. Elevation cells equal to
/// `nodata`, or NaN, are skipped and never written.
///
/// ```
/// use flowtrace_common::algorithms::{TraversalMode, UpstreamElevation};
/// use flowtrace_common::structures::Array2D;
///
/// let elev = Array2D::from_rows(&[vec![10.0], vec![5.0], vec![1.0]], -9999.0).unwrap();
/// let pntr = Array2D::from_rows(&[vec![4], vec![4], vec![0]], -1).unwrap();
/// let out = UpstreamElevation::new(TraversalMode::Watershed)
///     .with_nodata(Some(-9999.0))
///     .propagate(&elev, &pntr)
///     .unwrap();
/// assert_eq!(out.elevation.get_row_data(2), vec![10.0]);
/// ```
#[derive(Clone, Debug)]
pub struct UpstreamElevation {
    mode: TraversalMode,
    nodata: Option<f64>,
    cell_size_x: f64,
    cell_size_y: f64,
    step_ceiling: usize,
    max_sweeps: usize,
}

impl UpstreamElevation {
    pub fn new(mode: TraversalMode) -> UpstreamElevation {
        UpstreamElevation {
            mode,
            nodata: None,
            cell_size_x: 1f64,
            cell_size_y: 1f64,
            step_ceiling: DEFAULT_STEP_CEILING,
            max_sweeps: DEFAULT_MAX_SWEEPS,
        }
    }

    /// Sets the elevation no-data sentinel. With `None`, only NaN cells are
    /// outside the valid footprint.
    pub fn with_nodata(mut self, nodata: Option<f64>) -> UpstreamElevation {
        self.nodata = nodata;
        self
    }

    pub fn with_cell_size(mut self, cell_size_x: f64, cell_size_y: f64) -> UpstreamElevation {
        self.cell_size_x = cell_size_x;
        self.cell_size_y = cell_size_y;
        self
    }

    pub fn with_step_ceiling(mut self, step_ceiling: usize) -> UpstreamElevation {
        self.step_ceiling = step_ceiling.max(1);
        self
    }

    pub fn with_max_sweeps(mut self, max_sweeps: usize) -> UpstreamElevation {
        self.max_sweeps = max_sweeps.max(1);
        self
    }

    pub fn mode(&self) -> TraversalMode {
        self.mode
    }

    #[inline]
    fn is_nodata(&self, z: f64) -> bool {
        z.is_nan() || self.nodata == Some(z)
    }

    /// Runs the propagation. `elevation` is left untouched; the result holds a
    /// propagated copy.
    pub fn propagate(
        &self,
        elevation: &Array2D<f64>,
        flow_dir: &Array2D<i32>,
    ) -> Result<Propagation, PropagationError> {
        self.propagate_with_progress(elevation, flow_dir, |_, _, _| {})
    }

    /// As `propagate`, calling `progress(sweep, row, rows)` once each row of a
    /// sweep has been traced. Sweeps are numbered from 1.
    pub fn propagate_with_progress<F>(
        &self,
        elevation: &Array2D<f64>,
        flow_dir: &Array2D<i32>,
        mut progress: F,
    ) -> Result<Propagation, PropagationError>
    where
        F: FnMut(usize, isize, isize),
    {
        if !elevation.same_shape(flow_dir) {
            return Err(PropagationError::ShapeMismatch {
                elevation: elevation.shape(),
                flow_dir: flow_dir.shape(),
            });
        }

        // masked flow-length cells hold the elevation sentinel
        let fl_nodata = self.nodata.unwrap_or(f64::NAN);
        let flow_length = match self.mode {
            TraversalMode::LongestStream => {
                let mut fl = elevation.clone();
                fl.reinitialize_values(0f64);
                fl.nodata = fl_nodata;
                Some(fl)
            }
            TraversalMode::Watershed => None,
        };

        let mut traversal = Traversal {
            settings: self,
            flow_dir,
            elevation: elevation.clone(),
            flow_length,
            diag_cell_size: (self.cell_size_x * self.cell_size_x
                + self.cell_size_y * self.cell_size_y)
                .sqrt(),
            stack: Vec::new(),
            path: Vec::new(),
            steps: 0,
            report: PropagationReport::default(),
        };
        traversal.run(&mut progress);

        let Traversal {
            elevation: mut out,
            mut flow_length,
            report,
            ..
        } = traversal;

        // Only cells inside the input's valid footprint may carry values.
        for row in 0..elevation.rows {
            for col in 0..elevation.columns {
                let z = elevation.get_value(row, col);
                if self.is_nodata(z) {
                    out.set_value(row, col, z);
                    if let Some(fl) = flow_length.as_mut() {
                        fl.set_value(row, col, fl_nodata);
                    }
                }
            }
        }

        Ok(Propagation {
            elevation: out,
            flow_length,
            report,
        })
    }
}

/// Convenience wrapper using unit cell sizes and the default limits.
pub fn propagate(
    elevation: &Array2D<f64>,
    flow_dir: &Array2D<i32>,
    mode: TraversalMode,
    nodata: Option<f64>,
) -> Result<Propagation, PropagationError> {
    UpstreamElevation::new(mode)
        .with_nodata(nodata)
        .propagate(elevation, flow_dir)
}

/// A pending step from `from` into `to`. `depth` is the position of `from` on
/// the current trace path.
#[derive(Clone, Copy, Debug)]
struct Edge {
    from: (isize, isize),
    to: DownstreamCell,
    elevation: f64,
    length: f64,
    depth: usize,
}

enum Step {
    Continue { length: f64 },
    Stop,
    Fault,
}

enum TraceOutcome {
    Completed { updated: bool },
    Aborted,
}

/// Per-run state. Discarded once the run ends.
struct Traversal<'a> {
    settings: &'a UpstreamElevation,
    flow_dir: &'a Array2D<i32>,
    elevation: Array2D<f64>,
    flow_length: Option<Array2D<f64>>,
    diag_cell_size: f64,
    stack: Vec<Edge>,
    path: Vec<(isize, isize)>,
    steps: usize,
    report: PropagationReport,
}

impl<'a> Traversal<'a> {
    fn run(&mut self, progress: &mut dyn FnMut(usize, isize, isize)) {
        let rows = self.elevation.rows;
        let columns = self.elevation.columns;
        loop {
            self.report.sweeps += 1;
            let mut changed = false;
            for row in 0..rows {
                for col in 0..columns {
                    if self.settings.is_nodata(self.elevation.get_value(row, col)) {
                        continue;
                    }
                    match self.trace(row, col) {
                        // longest-stream sweeps only repeat after an aborted trace
                        TraceOutcome::Completed { updated } => {
                            changed |= updated && self.settings.mode == TraversalMode::Watershed
                        }
                        TraceOutcome::Aborted => {
                            self.report.traces_aborted += 1;
                            changed = true;
                        }
                    }
                }
                progress(self.report.sweeps, row, rows);
            }
            if !changed {
                break;
            }
            if self.report.sweeps >= self.settings.max_sweeps {
                self.report.sweep_cap_reached = true;
                break;
            }
        }
    }

    fn push_downstream(&mut self, from: (isize, isize), elevation: f64, length: f64, depth: usize) {
        if let Some(cells) = next_cells(from.0, from.1, self.flow_dir) {
            let first = self.stack.len();
            for to in cells {
                self.stack.push(Edge {
                    from,
                    to,
                    elevation,
                    length,
                    depth,
                });
            }
            // the lowest bit is explored first
            self.stack[first..].reverse();
        }
    }

    fn trace(&mut self, row: isize, col: isize) -> TraceOutcome {
        let z = self.elevation.get_value(row, col);
        let length = match self.flow_length.as_ref() {
            Some(fl) => fl.get_value(row, col),
            None => 0f64,
        };
        self.stack.clear();
        self.path.clear();
        self.path.push((row, col));
        self.steps = 0;
        let cells_before = self.report.cells_updated;

        self.push_downstream((row, col), z, length, 0);
        while let Some(edge) = self.stack.pop() {
            self.path.truncate(edge.depth + 1);
            match self.step(&edge) {
                Step::Continue { length } => {
                    if self.steps > self.settings.step_ceiling {
                        self.stack.clear();
                        return TraceOutcome::Aborted;
                    }
                    let to = (edge.to.row, edge.to.column);
                    self.path.push(to);
                    self.push_downstream(to, edge.elevation, length, edge.depth + 1);
                }
                Step::Stop => {}
                Step::Fault => self.report.branch_faults += 1,
            }
        }
        TraceOutcome::Completed {
            updated: self.report.cells_updated > cells_before,
        }
    }

    fn step(&mut self, edge: &Edge) -> Step {
        let (r, c) = (edge.to.row, edge.to.column);
        if !self.flow_dir.in_bounds(r, c) {
            return Step::Stop;
        }
        let z_next = self.elevation.get_value(r, c);
        if self.settings.is_nodata(z_next) {
            return Step::Stop;
        }
        let is_sink = self.flow_dir.get_value(r, c) == 0;

        match self.settings.mode {
            TraversalMode::Watershed => {
                if edge.elevation <= z_next {
                    return Step::Stop;
                }
                self.elevation.set_value(r, c, edge.elevation);
                self.record_update();
                if is_sink {
                    return Step::Stop;
                }
                Step::Continue {
                    length: edge.length,
                }
            }
            TraversalMode::LongestStream => {
                if self.path.contains(&(r, c)) {
                    return Step::Stop;
                }
                let step_length = if is_diagonal(edge.to.code) {
                    self.diag_cell_size
                } else {
                    self.settings.cell_size_x
                };
                let length = edge.length + step_length;
                if !length.is_finite() {
                    return Step::Fault;
                }
                let fl = match self.flow_length.as_mut() {
                    Some(fl) => fl,
                    None => return Step::Fault,
                };
                if length <= fl.get_value(r, c) {
                    return Step::Stop;
                }
                fl.set_value(r, c, length);
                self.elevation.set_value(r, c, edge.elevation);
                self.record_update();
                if flows_back(self.flow_dir, edge.from, (r, c)) {
                    return Step::Stop;
                }
                Step::Continue { length }
            }
        }
    }

    #[inline]
    fn record_update(&mut self) {
        self.steps += 1;
        self.report.cells_updated += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const NODATA: f64 = -9999.0;

    fn elev(rows: &[Vec<f64>]) -> Array2D<f64> {
        Array2D::from_rows(rows, NODATA).unwrap()
    }

    fn pntr(rows: &[Vec<i32>]) -> Array2D<i32> {
        Array2D::from_rows(rows, -1).unwrap()
    }

    fn run(e: &Array2D<f64>, p: &Array2D<i32>, mode: TraversalMode) -> Propagation {
        UpstreamElevation::new(mode)
            .with_nodata(Some(NODATA))
            .propagate(e, p)
            .unwrap()
    }

    fn rows_of(a: &Array2D<f64>) -> Vec<Vec<f64>> {
        (0..a.rows).map(|r| a.get_row_data(r)).collect()
    }

    #[test]
    fn test_southward_flow_carries_top_row_down() {
        let e = elev(&[
            vec![10.0, 10.0, 10.0],
            vec![5.0, 5.0, 5.0],
            vec![1.0, 1.0, 1.0],
        ]);
        let p = pntr(&[vec![4, 4, 4], vec![4, 4, 4], vec![0, 0, 0]]);
        let out = run(&e, &p, TraversalMode::Watershed);
        assert_eq!(rows_of(&out.elevation), vec![vec![10.0; 3]; 3]);
        assert!(out.flow_length.is_none());
    }

    #[test]
    fn test_northward_flow_leaves_grid_unchanged() {
        let e = elev(&[
            vec![10.0, 10.0, 10.0],
            vec![5.0, 5.0, 5.0],
            vec![1.0, 1.0, 1.0],
        ]);
        let p = pntr(&[vec![64, 64, 64], vec![64, 64, 64], vec![64, 64, 64]]);
        let out = run(&e, &p, TraversalMode::Watershed);
        assert_eq!(rows_of(&out.elevation), rows_of(&e));
        assert_eq!(out.report.cells_updated, 0);
        assert_eq!(out.report.sweeps, 1);
    }

    #[test]
    fn test_watershed_output_dominates_every_upstream_cell() {
        // a small converging network draining to the bottom-right corner
        let e = elev(&[
            vec![9.0, 3.0, 7.0, 2.0],
            vec![4.0, 8.0, 1.0, 6.0],
            vec![2.0, 5.0, 3.0, 1.0],
            vec![1.0, 2.0, 4.0, 0.5],
        ]);
        let p = pntr(&[
            vec![1, 2, 4, 4],
            vec![2, 1, 2, 4],
            vec![1, 2, 4, 4],
            vec![1, 1, 1, 0],
        ]);
        let out = run(&e, &p, TraversalMode::Watershed);
        for row in 0..e.rows {
            for col in 0..e.columns {
                let z_out = out.elevation.get_value(row, col);
                assert!(z_out >= e.get_value(row, col));
                // walk downstream and check domination all the way
                let (mut r, mut c) = (row, col);
                let mut guard = 0;
                while let Some(mut cells) = next_cells(r, c, &p) {
                    let next = cells.next().unwrap();
                    r = next.row;
                    c = next.column;
                    if !p.in_bounds(r, c) {
                        break;
                    }
                    assert!(out.elevation.get_value(r, c) >= e.get_value(row, col));
                    guard += 1;
                    assert!(guard < 32);
                }
            }
        }
        // the outlet sees the highest cell of the grid
        assert_eq!(out.elevation.get_value(3, 3), 9.0);
    }

    #[test]
    fn test_nodata_cells_are_preserved_and_block_flow() {
        let e = elev(&[vec![10.0], vec![NODATA], vec![1.0]]);
        let p = pntr(&[vec![4], vec![4], vec![0]]);
        let out = run(&e, &p, TraversalMode::Watershed);
        assert_eq!(out.elevation.get_value(1, 0), NODATA);
        assert_eq!(out.elevation.get_value(2, 0), 1.0);
    }

    #[test]
    fn test_undefined_sentinel_uses_nan_footprint() {
        let e = Array2D::from_rows(&[vec![10.0, f64::NAN], vec![1.0, 2.0]], f64::NAN).unwrap();
        let p = pntr(&[vec![4, 4], vec![0, 0]]);
        let out = UpstreamElevation::new(TraversalMode::Watershed)
            .propagate(&e, &p)
            .unwrap();
        assert_eq!(out.elevation.get_value(1, 0), 10.0);
        assert!(out.elevation.get_value(0, 1).is_nan());
        assert_eq!(out.elevation.get_value(1, 1), 2.0);
    }

    #[test]
    fn test_watershed_is_idempotent() {
        let e = elev(&[
            vec![3.0, 8.0, 2.0],
            vec![6.0, 1.0, 5.0],
            vec![4.0, 7.0, 0.0],
        ]);
        let p = pntr(&[vec![2, 4, 8], vec![1, 2, 4], vec![1, 1, 0]]);
        let first = run(&e, &p, TraversalMode::Watershed);
        let second = run(&first.elevation, &p, TraversalMode::Watershed);
        assert_eq!(rows_of(&second.elevation), rows_of(&first.elevation));
        assert_eq!(second.report.cells_updated, 0);
    }

    #[test]
    fn test_split_flow_reaches_every_receiver() {
        // top-middle splits SE | S | SW
        let e = elev(&[vec![1.0, 20.0, 1.0], vec![2.0, 3.0, 4.0]]);
        let p = pntr(&[vec![0, 2 | 4 | 8, 0], vec![0, 0, 0]]);
        let out = run(&e, &p, TraversalMode::Watershed);
        assert_eq!(out.elevation.get_row_data(1), vec![20.0, 20.0, 20.0]);
        assert_eq!(out.elevation.get_row_data(0), vec![1.0, 20.0, 1.0]);
    }

    #[test]
    fn test_shape_mismatch_is_an_error() {
        let e = elev(&[vec![1.0, 2.0]]);
        let p = pntr(&[vec![1], vec![1]]);
        let err = UpstreamElevation::new(TraversalMode::Watershed)
            .propagate(&e, &p)
            .unwrap_err();
        assert_eq!(
            err,
            PropagationError::ShapeMismatch {
                elevation: (1, 2),
                flow_dir: (2, 1)
            }
        );
    }

    #[test]
    fn test_two_cell_loop_terminates_in_longest_stream_mode() {
        // (0,0) drains east and (0,1) drains straight back west
        let e = elev(&[vec![8.0, 3.0]]);
        let p = pntr(&[vec![1, 16]]);
        let out = run(&e, &p, TraversalMode::LongestStream);
        assert!(!out.report.sweep_cap_reached);
        assert_eq!(out.report.traces_aborted, 0);
        let fl = out.flow_length.unwrap();
        assert_eq!(fl.get_value(0, 1), 1.0);
    }

    #[test]
    fn test_self_pointing_sink_terminates() {
        let e = elev(&[vec![5.0, 1.0]]);
        // (0,1) is a sink
        let p = pntr(&[vec![1, 0]]);
        let out = run(&e, &p, TraversalMode::LongestStream);
        assert_eq!(out.report.traces_aborted, 0);
        assert_eq!(out.elevation.get_row_data(0), vec![5.0, 5.0]);
        assert_eq!(out.flow_length.unwrap().get_row_data(0), vec![0.0, 1.0]);
    }

    #[test]
    fn test_longest_stream_prefers_the_longer_path() {
        // Two paths reach the outlet (2,2):
        //   (0,0) -> (1,1) -> (2,2)  two diagonal steps, headwater 50
        //   (2,0) -> (2,1) -> (2,2)  two straight steps, headwater 90
        let e = elev(&[
            vec![50.0, NODATA, NODATA],
            vec![NODATA, 20.0, NODATA],
            vec![90.0, 10.0, 1.0],
        ]);
        let p = pntr(&[vec![2, 0, 0], vec![0, 2, 0], vec![1, 1, 0]]);
        let out = run(&e, &p, TraversalMode::LongestStream);
        let diag = 2f64.sqrt();
        let fl = out.flow_length.unwrap();
        assert!((fl.get_value(2, 2) - 2.0 * diag).abs() < 1e-12);
        assert_eq!(out.elevation.get_value(2, 2), 50.0);
        // watershed mode keeps the higher headwater instead
        let ws = run(&e, &p, TraversalMode::Watershed);
        assert_eq!(ws.elevation.get_value(2, 2), 90.0);
    }

    #[test]
    fn test_longest_stream_uses_cell_size() {
        let e = elev(&[vec![9.0, 5.0, 1.0]]);
        let p = pntr(&[vec![1, 1, 0]]);
        let out = UpstreamElevation::new(TraversalMode::LongestStream)
            .with_nodata(Some(NODATA))
            .with_cell_size(30.0, 30.0)
            .propagate(&e, &p)
            .unwrap();
        assert_eq!(out.flow_length.unwrap().get_row_data(0), vec![0.0, 30.0, 60.0]);
        assert_eq!(out.elevation.get_row_data(0), vec![9.0, 9.0, 9.0]);
    }

    #[test]
    fn test_step_ceiling_forces_another_sweep() {
        // a long eastward channel with the headwater on the west edge
        let n = 40;
        let mut z: Vec<f64> = (0..n).map(|i| (n - i) as f64).collect();
        z[0] = 1000.0;
        let mut d = vec![1; n];
        d[n - 1] = 0;
        let e = elev(&[z]);
        let p = pntr(&[d]);
        let out = UpstreamElevation::new(TraversalMode::Watershed)
            .with_nodata(Some(NODATA))
            .with_step_ceiling(5)
            .propagate(&e, &p)
            .unwrap();
        assert!(out.report.traces_aborted > 0);
        assert!(out.report.sweeps > 1);
        assert!(out.elevation.as_slice().iter().all(|v| *v == 1000.0));
    }

    #[test]
    fn test_flow_cycle_terminates() {
        // E -> S -> W -> N around a 2 x 2 block
        let e = elev(&[vec![4.0, 3.0], vec![1.0, 2.0]]);
        let p = pntr(&[vec![1, 4], vec![64, 16]]);
        let out = UpstreamElevation::new(TraversalMode::LongestStream)
            .with_nodata(Some(NODATA))
            .with_max_sweeps(10)
            .propagate(&e, &p)
            .unwrap();
        assert!(!out.report.sweep_cap_reached);
        assert_eq!(out.report.sweeps, 1);
        // watershed mode settles on its own
        let ws = run(&e, &p, TraversalMode::Watershed);
        assert!(!ws.report.sweep_cap_reached);
        assert!(ws.elevation.as_slice().iter().all(|v| *v == 4.0));
    }

    #[test]
    fn test_propagate_with_default_settings() {
        let e = elev(&[vec![7.0, 2.0, NODATA]]);
        let p = pntr(&[vec![1, 1, 0]]);
        let out = propagate(&e, &p, TraversalMode::LongestStream, Some(NODATA)).unwrap();
        assert_eq!(out.elevation.get_row_data(0), vec![7.0, 7.0, NODATA]);
        let fl = out.flow_length.unwrap();
        assert_eq!(fl.get_value(0, 1), 1.0);
        assert_eq!(fl.get_value(0, 2), NODATA);
        assert_eq!(fl.nodata(), NODATA);
    }

    #[test]
    fn test_flow_length_without_sentinel_masks_with_nan() {
        let e = Array2D::from_rows(&[vec![4.0, 2.0, f64::NAN]], f64::NAN).unwrap();
        let p = pntr(&[vec![1, 1, 0]]);
        let out = UpstreamElevation::new(TraversalMode::LongestStream)
            .propagate(&e, &p)
            .unwrap();
        let fl = out.flow_length.unwrap();
        assert_eq!(fl.get_value(0, 1), 1.0);
        assert!(fl.get_value(0, 2).is_nan());
        assert!(fl.nodata().is_nan());
    }

    #[test]
    fn test_step_ceiling_resumes_longest_stream_traces() {
        // a long eastward channel in the top row; every cell also splits SE
        // into the bottom row, which drains east to the outlet
        let n = 40;
        let top: Vec<f64> = (0..n).map(|i| (2 * n - i) as f64).collect();
        let bottom: Vec<f64> = (0..n).map(|i| (n - i) as f64).collect();
        let mut top_dir = vec![1 | 2; n];
        top_dir[n - 1] = 4;
        let mut bottom_dir = vec![1; n];
        bottom_dir[n - 1] = 0;
        let e = elev(&[top, bottom]);
        let p = pntr(&[top_dir, bottom_dir]);

        let limited = UpstreamElevation::new(TraversalMode::LongestStream)
            .with_nodata(Some(NODATA))
            .with_step_ceiling(5)
            .propagate(&e, &p)
            .unwrap();
        let unlimited = run(&e, &p, TraversalMode::LongestStream);

        assert!(limited.report.traces_aborted > 0);
        assert!(limited.report.sweeps > 1);
        assert!(!limited.report.sweep_cap_reached);
        assert_eq!(unlimited.report.traces_aborted, 0);
        assert_eq!(
            rows_of(&limited.elevation),
            rows_of(&unlimited.elevation)
        );
        let fl_limited = limited.flow_length.unwrap();
        let fl_unlimited = unlimited.flow_length.unwrap();
        for (a, b) in fl_limited.as_slice().iter().zip(fl_unlimited.as_slice()) {
            assert!((a - b).abs() < 1e-9);
        }
        // the outlet is reached by the headwater along the full channel
        assert_eq!(limited.elevation.get_value(1, n as isize - 1), 2.0 * n as f64);
        assert_eq!(fl_limited.get_value(1, n as isize - 1), n as f64);
    }

    #[test]
    fn test_progress_is_reported_for_every_row_of_every_sweep() {
        let n = 12;
        let mut z: Vec<f64> = (0..n).map(|i| (n - i) as f64).collect();
        z[0] = 100.0;
        let mut d = vec![4; n];
        d[n - 1] = 0;
        let e = elev(&z.iter().map(|v| vec![*v]).collect::<Vec<_>>());
        let p = pntr(&d.iter().map(|v| vec![*v]).collect::<Vec<_>>());
        let mut calls: Vec<(usize, isize, isize)> = vec![];
        let out = UpstreamElevation::new(TraversalMode::Watershed)
            .with_nodata(Some(NODATA))
            .with_step_ceiling(3)
            .propagate_with_progress(&e, &p, |sweep, row, rows| calls.push((sweep, row, rows)))
            .unwrap();
        assert!(out.report.sweeps > 1);
        assert_eq!(calls.len(), out.report.sweeps * n);
        assert_eq!(calls[0], (1, 0, n as isize));
        assert_eq!(
            calls[calls.len() - 1],
            (out.report.sweeps, n as isize - 1, n as isize)
        );
    }

    #[test]
    fn test_traversal_mode_from_str() {
        assert_eq!(
            "watershed".parse::<TraversalMode>().unwrap(),
            TraversalMode::Watershed
        );
        assert_eq!(
            "LONGEST_STREAM".parse::<TraversalMode>().unwrap(),
            TraversalMode::LongestStream
        );
        assert_eq!(
            "true".parse::<TraversalMode>().unwrap(),
            TraversalMode::LongestStream
        );
        assert!("uphill".parse::<TraversalMode>().is_err());
        assert_eq!(TraversalMode::default(), TraversalMode::Watershed);
    }
}
