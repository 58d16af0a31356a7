use super::*;
use std::io::prelude::*;

/// The keyword/value header shared by ArcGIS ASCII grids and the `.hdr`
/// sidecar of ArcGIS binary float grids.
#[derive(Debug, Default)]
pub(crate) struct ArcHeader {
    columns: Option<usize>,
    rows: Option<usize>,
    // (coordinate, is cell centre)
    xll: Option<(f64, bool)>,
    yll: Option<(f64, bool)>,
    cell_size: Option<f64>,
    pub nodata: Option<f64>,
    pub nodata_is_integer: bool,
    pub byte_order: Option<Endianness>,
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, Error> {
    value.trim().parse::<T>().map_err(|_| {
        Error::new(
            ErrorKind::InvalidData,
            format!("Invalid value '{}' for raster header entry {}.", value, key),
        )
    })
}

impl ArcHeader {
    /// Reads one header line. Returns `Ok(false)` if the line is not a header
    /// entry, which in an ASCII grid marks the start of the cell values.
    pub fn read_entry(&mut self, line: &str) -> Result<bool, Error> {
        let mut parts = line.split_whitespace();
        let key = match parts.next() {
            Some(k) => k.to_lowercase(),
            None => return Ok(false),
        };
        let value = parts.last().unwrap_or_default();
        match key.as_str() {
            "ncols" => self.columns = Some(parse_value::<f64>(&key, value)? as usize),
            "nrows" => self.rows = Some(parse_value::<f64>(&key, value)? as usize),
            "xllcorner" => self.xll = Some((parse_value(&key, value)?, false)),
            "xllcenter" => self.xll = Some((parse_value(&key, value)?, true)),
            "yllcorner" => self.yll = Some((parse_value(&key, value)?, false)),
            "yllcenter" => self.yll = Some((parse_value(&key, value)?, true)),
            "cellsize" => self.cell_size = Some(parse_value(&key, value)?),
            "nodata_value" | "nodata" => {
                self.nodata = Some(parse_value(&key, value)?);
                self.nodata_is_integer = value.parse::<i64>().is_ok();
            }
            "byteorder" => {
                self.byte_order = Some(if value.to_uppercase().starts_with("MSB") {
                    Endianness::BigEndian
                } else {
                    Endianness::LittleEndian
                })
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Sets the grid dimensions, extent and no-data value.
    pub fn apply(&self, file_name: &str, configs: &mut RasterConfigs) -> Result<(), Error> {
        let missing = |entry: &str| {
            Error::new(
                ErrorKind::InvalidData,
                format!("The raster header of {} has no {} entry.", file_name, entry),
            )
        };
        let columns = self.columns.ok_or_else(|| missing("NCOLS"))?;
        let rows = self.rows.ok_or_else(|| missing("NROWS"))?;
        // the cell values must fit in memory as f64s
        let fits = rows
            .checked_mul(columns)
            .and_then(|n| n.checked_mul(std::mem::size_of::<f64>()))
            .map_or(false, |bytes| bytes <= isize::MAX as usize);
        if !fits {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!(
                    "The raster header of {} describes a grid too large to hold ({} rows by {} columns).",
                    file_name, rows, columns
                ),
            ));
        }
        configs.columns = columns;
        configs.rows = rows;
        let cell_size = self.cell_size.ok_or_else(|| missing("CELLSIZE"))?;
        if cell_size <= 0f64 {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("The raster {} has a non-positive cell size.", file_name),
            ));
        }
        configs.resolution_x = cell_size;
        configs.resolution_y = cell_size;
        configs.nodata = self.nodata;

        // lower-left corner, shifting cell-centre registration by half a cell
        let (x, x_is_centre) = self.xll.unwrap_or((0f64, false));
        let (y, y_is_centre) = self.yll.unwrap_or((0f64, false));
        configs.west = if x_is_centre { x - 0.5 * cell_size } else { x };
        configs.south = if y_is_centre { y - 0.5 * cell_size } else { y };
        configs.east = configs.west + configs.columns as f64 * cell_size;
        configs.north = configs.south + configs.rows as f64 * cell_size;
        Ok(())
    }
}

pub(crate) fn write_header<W: Write>(
    writer: &mut W,
    configs: &RasterConfigs,
    byte_order: Option<Endianness>,
) -> Result<(), Error> {
    writeln!(writer, "NCOLS {}", configs.columns)?;
    writeln!(writer, "NROWS {}", configs.rows)?;
    writeln!(writer, "XLLCORNER {}", configs.west)?;
    writeln!(writer, "YLLCORNER {}", configs.south)?;
    writeln!(
        writer,
        "CELLSIZE {}",
        (configs.resolution_x + configs.resolution_y) / 2.0
    )?;
    if let Some(nodata) = configs.nodata {
        writeln!(writer, "NODATA_VALUE {}", nodata)?;
    }
    match byte_order {
        Some(Endianness::BigEndian) => writeln!(writer, "BYTEORDER MSBFIRST")?,
        Some(Endianness::LittleEndian) => writeln!(writer, "BYTEORDER LSBFIRST")?,
        None => {}
    }
    Ok(())
}
