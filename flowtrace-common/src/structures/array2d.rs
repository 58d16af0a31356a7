/////////////////////////////////////////////
// A generic 2-dimensional grid structure  //
/////////////////////////////////////////////

use std::io::Error;
use std::io::ErrorKind;
use std::ops::{Index, IndexMut};

/// An in-memory, row-major 2-D grid that is not connected to a file. Elevation,
/// flow-direction and flow-length grids are all held as `Array2D` values while
/// a tool runs.
///
/// Reads outside of the grid return the `nodata` value and writes outside of
/// the grid are ignored, so neighbourhood scans never need their own bounds
/// checks.
///
/// Example:
///
/// ```
/// use flowtrace_common::structures::Array2D;
/// let mut x: Array2D<f64> = Array2D::new(100, 500, 0f64, -999f64).unwrap();
/// x.set_value(50, 100, 1f64);
/// assert_eq!(x.get_value(50, 100), 1f64);
/// assert_eq!(x.get_value(-1, 100), -999f64);
/// ```
#[derive(Clone, Debug)]
pub struct Array2D<T: Copy> {
    pub columns: isize,
    pub rows: isize,
    data: Vec<T>,
    pub nodata: T,
}

impl<T> Array2D<T>
where
    T: Copy,
{
    /// Creates a grid of `rows` x `columns` cells, all set to `initial_value`.
    pub fn new(
        rows: isize,
        columns: isize,
        initial_value: T,
        nodata: T,
    ) -> Result<Array2D<T>, Error> {
        if rows < 0 || columns < 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Only non-negative rows and columns values accepted.",
            ));
        }
        Ok(Array2D {
            columns,
            rows,
            nodata,
            data: vec![initial_value; (rows * columns) as usize],
        })
    }

    /// Wraps existing row-major cell values. The length of `data` must equal
    /// `rows * columns`.
    pub fn from_vec(
        rows: isize,
        columns: isize,
        data: Vec<T>,
        nodata: T,
    ) -> Result<Array2D<T>, Error> {
        if rows < 0 || columns < 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Only non-negative rows and columns values accepted.",
            ));
        }
        if data.len() != (rows * columns) as usize {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!(
                    "Expected {} cell values for a {} x {} grid but found {}.",
                    rows * columns,
                    rows,
                    columns,
                    data.len()
                ),
            ));
        }
        Ok(Array2D {
            columns,
            rows,
            nodata,
            data,
        })
    }

    /// Builds a grid from a list of equally long rows.
    pub fn from_rows(rows: &[Vec<T>], nodata: T) -> Result<Array2D<T>, Error> {
        let columns = rows.first().map_or(0, |r| r.len());
        if rows.iter().any(|r| r.len() != columns) {
            return Err(Error::new(
                ErrorKind::InvalidData,
                "All rows must contain the same number of columns.",
            ));
        }
        let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
        Array2D::from_vec(rows.len() as isize, columns as isize, data, nodata)
    }

    #[inline]
    pub fn in_bounds(&self, row: isize, column: isize) -> bool {
        row >= 0 && column >= 0 && row < self.rows && column < self.columns
    }

    #[inline]
    pub fn set_value(&mut self, row: isize, column: isize, value: T) {
        if self.in_bounds(row, column) {
            self.data[(row * self.columns + column) as usize] = value;
        }
    }

    #[inline]
    pub fn get_value(&self, row: isize, column: isize) -> T {
        if !self.in_bounds(row, column) {
            return self.nodata;
        }
        self.data[(row * self.columns + column) as usize]
    }

    pub fn set_row_data(&mut self, row: isize, values: Vec<T>) {
        if row < 0 || row >= self.rows {
            return;
        }
        let start = (row * self.columns) as usize;
        for (column, value) in values.into_iter().take(self.columns as usize).enumerate() {
            self.data[start + column] = value;
        }
    }

    pub fn get_row_data(&self, row: isize) -> Vec<T> {
        if row < 0 || row >= self.rows {
            return vec![self.nodata; self.columns as usize];
        }
        let start = (row * self.columns) as usize;
        self.data[start..start + self.columns as usize].to_vec()
    }

    pub fn reinitialize_values(&mut self, value: T) {
        self.data = vec![value; (self.rows * self.columns) as usize];
    }

    /// Returns true if both grids have the same number of rows and columns.
    pub fn same_shape<U: Copy>(&self, other: &Array2D<U>) -> bool {
        self.rows == other.rows && self.columns == other.columns
    }

    pub fn shape(&self) -> (isize, isize) {
        (self.rows, self.columns)
    }

    pub fn columns(&self) -> isize {
        self.columns
    }

    pub fn rows(&self) -> isize {
        self.rows
    }

    pub fn nodata(&self) -> T {
        self.nodata
    }

    pub fn num_cells(&self) -> usize {
        self.data.len()
    }

    /// Row-major view of the cell values.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

/// Grids are equal when their shapes and cell values match; the `nodata`
/// value is not compared.
impl<T: Copy + PartialEq> PartialEq for Array2D<T> {
    fn eq(&self, other: &Array2D<T>) -> bool {
        self.rows == other.rows && self.columns == other.columns && self.data == other.data
    }
}

impl<T: Copy> Index<(isize, isize)> for Array2D<T> {
    type Output = T;

    fn index(&self, index: (isize, isize)) -> &T {
        let (row, column) = index;
        if !self.in_bounds(row, column) {
            return &self.nodata;
        }
        &self.data[(row * self.columns + column) as usize]
    }
}

impl<T: Copy> IndexMut<(isize, isize)> for Array2D<T> {
    /// Out-of-bounds writes land on the `nodata` slot; use `set_value` when that
    /// is not wanted.
    fn index_mut(&mut self, index: (isize, isize)) -> &mut T {
        let (row, column) = index;
        if !self.in_bounds(row, column) {
            return &mut self.nodata;
        }
        let idx = (row * self.columns + column) as usize;
        &mut self.data[idx]
    }
}
