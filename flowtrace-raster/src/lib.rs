/*
This file is part of the flowtrace geospatial tools.
Created: 19/10/2026
License: MIT
*/

mod arc_header;
mod arcascii_raster;
mod arcbinary_raster;

use self::arcascii_raster::*;
use self::arcbinary_raster::*;
use flowtrace_common::structures::Array2D;
use num_traits::cast::AsPrimitive;
use std::f64;
use std::io::Error;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

/// Raster is the in-memory form of a single-band grid file. ArcGIS ASCII grids
/// (`.asc`, `.txt`) and ArcGIS binary float grids (`.flt` with a `.hdr`
/// sidecar) are supported; the format follows from the file extension.
///
/// Examples:
///
/// ```no_run
/// use flowtrace_raster::Raster;
/// # fn main() -> std::io::Result<()> {
/// // Read an existing raster file
/// let input = Raster::new("dem.asc", "r")?;
///
/// // Create a new raster file with the dimensions
/// // and location of an existing file.
/// let mut output = Raster::initialize_using_file("out.flt", &input);
/// output.write()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default, Clone, Debug)]
pub struct Raster {
    pub file_name: String,
    pub file_mode: String,
    pub raster_type: RasterType,
    pub configs: RasterConfigs,
    data: Vec<f64>,
}

impl Raster {
    /// Creates an in-memory `Raster` object. The data are either
    /// read from an existing file (`file_name`; `file_mode` is 'r') or
    /// prepared for new file creation (`file_mode` is 'w').
    ///
    /// To create a new `Raster` file, most applications should prefer the
    /// `initialize_using_config` or `initialize_using_file` functions instead.
    pub fn new(file_name: &str, file_mode: &str) -> Result<Raster, Error> {
        let mut r = Raster {
            file_name: file_name.to_string(),
            file_mode: file_mode.to_lowercase(),
            raster_type: get_raster_type_from_file(file_name),
            ..Default::default()
        };
        if !r.file_mode.contains("r") {
            return Ok(r);
        }
        match r.raster_type {
            RasterType::ArcAscii => read_arcascii(&r.file_name, &mut r.configs, &mut r.data)?,
            RasterType::ArcBinary => read_arcbinary(&r.file_name, &mut r.configs, &mut r.data)?,
            RasterType::Unknown => {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    format!("Unrecognized raster type: {}", file_name),
                ))
            }
        }
        if r.data.len() != r.configs.rows * r.configs.columns {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!(
                    "{} holds {} cell values but its header describes {} rows and {} columns.",
                    file_name,
                    r.data.len(),
                    r.configs.rows,
                    r.configs.columns
                ),
            ));
        }
        r.update_min_max();
        Ok(r)
    }

    /// Creates a new in-memory `Raster` object with grid extent and location
    /// based on specified configurations contained within a `RasterConfigs`.
    /// All cells start out as no-data.
    pub fn initialize_using_config(file_name: &str, configs: &RasterConfigs) -> Raster {
        let new_file_name = if Path::new(file_name).extension().is_some() {
            file_name.to_string()
        } else {
            // likely no extension provided; default to an ASCII grid
            format!("{}.asc", file_name)
        };
        let mut output = Raster {
            raster_type: get_raster_type_from_file(&new_file_name),
            file_name: new_file_name,
            file_mode: "w".to_string(),
            configs: configs.clone(),
            data: vec![],
        };
        output.configs.minimum = f64::INFINITY;
        output.configs.maximum = f64::NEG_INFINITY;
        output.data = vec![output.configs.background(); output.configs.rows * output.configs.columns];
        output
    }

    /// Creates a new in-memory `Raster` object with the dimensions, location
    /// and no-data value of an existing raster.
    pub fn initialize_using_file(file_name: &str, input: &Raster) -> Raster {
        Raster::initialize_using_config(file_name, &input.configs)
    }

    /// Creates a new in-memory `Raster` object from an `Array2D`. The array's
    /// `nodata` value becomes the raster's no-data value unless it is NaN.
    pub fn initialize_using_array2d<T: AsPrimitive<f64> + Copy>(
        file_name: &str,
        configs: &RasterConfigs,
        data: &Array2D<T>,
    ) -> Result<Raster, Error> {
        let mut output = Raster::initialize_using_config(file_name, configs);
        output.set_data_from_array2d(data)?;
        Ok(output)
    }

    /// Returns true if `value` is the no-data value, or NaN.
    #[inline]
    pub fn is_nodata(&self, value: f64) -> bool {
        self.configs.is_nodata(value)
    }

    /// Returns the value contained within a grid cell specified
    /// by `row` and `column`. Off-grid cells read as no-data.
    pub fn get_value(&self, row: isize, column: isize) -> f64 {
        if column >= 0
            && row >= 0
            && (column as usize) < self.configs.columns
            && (row as usize) < self.configs.rows
        {
            return self.data[row as usize * self.configs.columns + column as usize];
        }
        self.configs.background()
    }

    pub fn set_value(&mut self, row: isize, column: isize, value: f64) {
        if column >= 0 && row >= 0 {
            let c: usize = column as usize;
            let r: usize = row as usize;
            if c < self.configs.columns && r < self.configs.rows {
                let idx = r * self.configs.columns + c;
                self.data[idx] = value;
            }
        }
    }

    pub fn set_row_data(&mut self, row: isize, values: Vec<f64>) {
        if row < 0 || row as usize >= self.configs.rows {
            return;
        }
        let start = row as usize * self.configs.columns;
        for (c, value) in values.into_iter().take(self.configs.columns).enumerate() {
            self.data[start + c] = value;
        }
    }

    pub fn get_row_data(&self, row: isize) -> Vec<f64> {
        if row < 0 || row as usize >= self.configs.rows {
            return vec![self.configs.background(); self.configs.columns];
        }
        let start = row as usize * self.configs.columns;
        self.data[start..start + self.configs.columns].to_vec()
    }

    /// Returns true if both rasters have the same number of rows and columns.
    pub fn same_shape(&self, other: &Raster) -> bool {
        self.configs.rows == other.configs.rows && self.configs.columns == other.configs.columns
    }

    /// Copies the cell values into an `Array2D`. No-data cells keep their
    /// value; the array's `nodata` is the raster's no-data value, or NaN when
    /// none is defined.
    pub fn get_data_as_array2d(&self) -> Result<Array2D<f64>, Error> {
        Array2D::from_vec(
            self.configs.rows as isize,
            self.configs.columns as isize,
            self.data.clone(),
            self.configs.background(),
        )
    }

    /// Converts the cell values into integer codes, e.g. for a flow pointer.
    /// No-data cells, and values that are not whole numbers within `i32`
    /// range, become `nodata`.
    pub fn get_data_as_i32_array2d(&self, nodata: i32) -> Result<Array2D<i32>, Error> {
        let values = self
            .data
            .iter()
            .map(|&v| {
                if self.is_nodata(v) || v.fract() != 0.0 || v < i32::MIN as f64 || v > i32::MAX as f64
                {
                    nodata
                } else {
                    v as i32
                }
            })
            .collect();
        Array2D::from_vec(
            self.configs.rows as isize,
            self.configs.columns as isize,
            values,
            nodata,
        )
    }

    pub fn set_data_from_array2d<T: AsPrimitive<f64> + Copy>(
        &mut self,
        array: &Array2D<T>,
    ) -> Result<(), Error> {
        if array.rows as usize != self.configs.rows || array.columns as usize != self.configs.columns
        {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Rasters must have the same dimensions and extent.",
            ));
        }
        self.data = array
            .as_slice()
            .iter()
            .map(|v| AsPrimitive::<f64>::as_(*v))
            .collect();
        let nodata: f64 = AsPrimitive::<f64>::as_(array.nodata());
        self.configs.nodata = if nodata.is_nan() { None } else { Some(nodata) };
        Ok(())
    }

    pub fn num_cells(&self) -> usize {
        self.configs.rows * self.configs.columns
    }

    pub fn num_valid_cells(&self) -> usize {
        self.data.iter().filter(|v| !self.is_nodata(**v)).count()
    }

    pub fn update_min_max(&mut self) {
        self.configs.minimum = f64::INFINITY;
        self.configs.maximum = f64::NEG_INFINITY;
        if self.data.is_empty() {
            return;
        }
        let num_procs = num_cpus::get().max(1);
        let nodata = self.configs.nodata;
        let values = Arc::new(self.data.clone());
        let (tx, rx) = mpsc::channel();
        for tid in 0..num_procs {
            let values = values.clone();
            let tx = tx.clone();
            thread::spawn(move || {
                let mut min_val = f64::INFINITY;
                let mut max_val = f64::NEG_INFINITY;
                for i in (0..values.len()).filter(|v| v % num_procs == tid) {
                    let value = values[i];
                    if value.is_nan() || Some(value) == nodata {
                        continue;
                    }
                    min_val = min_val.min(value);
                    max_val = max_val.max(value);
                }
                // the receiver outlives every sender
                let _ = tx.send((min_val, max_val));
            });
        }
        drop(tx);

        for (min_val, max_val) in rx {
            self.configs.minimum = self.configs.minimum.min(min_val);
            self.configs.maximum = self.configs.maximum.max(max_val);
        }
    }

    pub fn write(&mut self) -> Result<(), Error> {
        if !self.file_mode.contains("w") {
            return Err(Error::new(
                ErrorKind::Other,
                "Cannot write raster that is not created in write mode ('w').",
            ));
        }
        match self.raster_type {
            RasterType::ArcAscii => write_arcascii(self),
            RasterType::ArcBinary => write_arcbinary(self),
            RasterType::Unknown => Err(Error::new(
                ErrorKind::InvalidInput,
                format!("Unrecognized raster type: {}", self.file_name),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RasterConfigs {
    pub rows: usize,
    pub columns: usize,
    pub nodata: Option<f64>,
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    pub resolution_x: f64,
    pub resolution_y: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub endian: Endianness,
    pub photometric_interp: PhotometricInterpretation,
    pub data_type: DataType,
}

impl Default for RasterConfigs {
    fn default() -> RasterConfigs {
        RasterConfigs {
            rows: 0,
            columns: 0,
            nodata: Some(-32768.0),
            north: f64::NEG_INFINITY,
            south: f64::INFINITY,
            east: f64::NEG_INFINITY,
            west: f64::INFINITY,
            resolution_x: f64::NEG_INFINITY,
            resolution_y: f64::NEG_INFINITY,
            minimum: f64::INFINITY,
            maximum: f64::NEG_INFINITY,
            endian: Endianness::LittleEndian,
            photometric_interp: PhotometricInterpretation::Unknown,
            data_type: DataType::Unknown,
        }
    }
}

impl RasterConfigs {
    /// The value used to fill new and off-grid cells.
    #[inline]
    pub fn background(&self) -> f64 {
        self.nodata.unwrap_or(f64::NAN)
    }

    #[inline]
    pub fn is_nodata(&self, value: f64) -> bool {
        value.is_nan() || self.nodata == Some(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RasterType {
    #[default]
    Unknown,
    ArcAscii,
    ArcBinary,
}

pub fn get_raster_type_from_file(file_name: &str) -> RasterType {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();
    match extension.as_str() {
        "asc" | "txt" => RasterType::ArcAscii,
        "flt" => RasterType::ArcBinary,
        _ => RasterType::Unknown,
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum Endianness {
    #[default]
    LittleEndian,
    BigEndian,
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum DataType {
    F64,
    F32,
    I32,
    I16,
    U8,
    #[default]
    Unknown,
}

impl DataType {
    pub fn is_float(&self) -> bool {
        matches!(*self, DataType::F64 | DataType::F32)
    }

    pub fn is_integer(&self) -> bool {
        matches!(*self, DataType::I32 | DataType::I16 | DataType::U8)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum PhotometricInterpretation {
    Continuous,
    Categorical,
    Boolean,
    #[default]
    Unknown,
}
