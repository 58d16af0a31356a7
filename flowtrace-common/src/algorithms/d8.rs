use crate::structures::Array2D;

/// The eight single-direction pointer codes, in bit order. A cell may carry a
/// bitwise union of several of these when its flow is split.
pub const D8_CODES: [i32; 8] = [1, 2, 4, 8, 16, 32, 64, 128];

/// (row, column) offsets matching `D8_CODES`, i.e. E, SE, S, SW, W, NW, N, NE.
/// Rows increase southward.
pub const D8_OFFSETS: [(isize, isize); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Returns true for the four diagonal pointer codes (SE, SW, NW, NE).
#[inline]
pub fn is_diagonal(code: i32) -> bool {
    matches!(code, 2 | 8 | 32 | 128)
}

/// Returns true if `code` can be decoded into at least one direction.
/// Zero marks a sink, and anything at or beyond 255 is treated as no-data.
#[inline]
pub fn is_valid_pointer(code: i32) -> bool {
    code > 0 && code < 255
}

/// A receiving neighbour of a cell, together with the single-direction code
/// of the step that reaches it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DownstreamCell {
    pub row: isize,
    pub column: isize,
    pub code: i32,
}

/// Iterator over the receiving neighbours of a cell, in ascending bit order.
#[derive(Clone, Debug)]
pub struct DownstreamCells {
    row: isize,
    column: isize,
    code: i32,
    bit: usize,
}

impl Iterator for DownstreamCells {
    type Item = DownstreamCell;

    fn next(&mut self) -> Option<DownstreamCell> {
        while self.bit < D8_CODES.len() {
            let b = self.bit;
            self.bit += 1;
            if self.code & D8_CODES[b] != 0 {
                let (dr, dc) = D8_OFFSETS[b];
                return Some(DownstreamCell {
                    row: self.row + dr,
                    column: self.column + dc,
                    code: D8_CODES[b],
                });
            }
        }
        None
    }
}

/// Decodes the pointer at (`row`, `column`) into its receiving neighbours.
///
/// Returns `None` when the pointer is a sink, no-data or otherwise invalid, which
/// ends the flow path at this cell. Candidates are not bounds checked.
pub fn next_cells(row: isize, column: isize, flow_dir: &Array2D<i32>) -> Option<DownstreamCells> {
    let code = flow_dir.get_value(row, column);
    if !is_valid_pointer(code) {
        return None;
    }
    Some(DownstreamCells {
        row,
        column,
        code,
        bit: 0,
    })
}

/// Returns true if the cell `to` drains back into `from`, or does not drain
/// anywhere at all. Either way `to` is a sink for a path arriving from `from`.
pub fn flows_back(flow_dir: &Array2D<i32>, from: (isize, isize), to: (isize, isize)) -> bool {
    match next_cells(to.0, to.1, flow_dir) {
        Some(mut cells) => cells.any(|c| c.row == from.0 && c.column == from.1),
        None => true,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn pointer_grid(rows: &[Vec<i32>]) -> Array2D<i32> {
        Array2D::from_rows(rows, -1).unwrap()
    }

    #[test]
    fn test_single_bit_codes_map_to_one_neighbour() {
        let expected = [
            (1, (1, 2)),
            (2, (2, 2)),
            (4, (2, 1)),
            (8, (2, 0)),
            (16, (1, 0)),
            (32, (0, 0)),
            (64, (0, 1)),
            (128, (0, 2)),
        ];
        for (code, (row, col)) in expected.iter() {
            let grid = pointer_grid(&[vec![0, 0, 0], vec![0, *code, 0], vec![0, 0, 0]]);
            let cells: Vec<DownstreamCell> = next_cells(1, 1, &grid).unwrap().collect();
            assert_eq!(
                cells,
                vec![DownstreamCell {
                    row: *row,
                    column: *col,
                    code: *code
                }]
            );
        }
    }

    #[test]
    fn test_split_flow_yields_each_bit_in_ascending_order() {
        // E | S | NE
        let grid = pointer_grid(&[vec![1 | 4 | 128]]);
        let codes: Vec<i32> = next_cells(0, 0, &grid).unwrap().map(|c| c.code).collect();
        assert_eq!(codes, vec![1, 4, 128]);
    }

    #[test]
    fn test_invalid_codes_end_the_path() {
        let grid = pointer_grid(&[vec![0, -1, 255, 300]]);
        for col in 0..4 {
            assert!(next_cells(0, col, &grid).is_none());
        }
        // out of bounds reads the grid's nodata value
        assert!(next_cells(5, 5, &grid).is_none());
    }

    #[test]
    fn test_is_diagonal() {
        let diagonal: Vec<i32> = D8_CODES.iter().copied().filter(|c| is_diagonal(*c)).collect();
        assert_eq!(diagonal, vec![2, 8, 32, 128]);
    }

    #[test]
    fn test_flows_back() {
        // (0,0) drains east into (0,1), which drains west straight back.
        let grid = pointer_grid(&[vec![1, 16, 4], vec![0, 0, 0]]);
        assert!(flows_back(&grid, (0, 0), (0, 1)));
        // (0,2) drains south into a sink
        assert!(flows_back(&grid, (0, 1), (1, 2)));
        // (0,1) drains west, not into (0,2)
        assert!(!flows_back(&grid, (0, 2), (0, 1)));
    }
}
