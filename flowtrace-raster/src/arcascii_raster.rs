use super::arc_header::{write_header, ArcHeader};
use super::*;
use std::fs::File;
use std::io::prelude::*;
use std::io::BufReader;
use std::io::BufWriter;

pub fn read_arcascii(
    file_name: &str,
    configs: &mut RasterConfigs,
    data: &mut Vec<f64>,
) -> Result<(), Error> {
    let f = File::open(file_name)?;
    // every cell value takes at least two bytes, counting its separator
    let max_cells = f.metadata()?.len() as usize / 2 + 1;
    let f = BufReader::new(f);

    let mut header = ArcHeader::default();
    let mut in_header = true;
    let mut all_integer = true;
    for line in f.lines() {
        let line = line?;
        if in_header {
            if line.trim().is_empty() || header.read_entry(&line)? {
                continue;
            }
            in_header = false;
            header.apply(file_name, configs)?;
            data.reserve((configs.rows * configs.columns).min(max_cells));
        }
        // it's a data line
        for val in line.split_whitespace() {
            let z = val.parse::<f64>().map_err(|_| {
                Error::new(
                    ErrorKind::InvalidData,
                    format!("Invalid cell value '{}' in {}.", val, file_name),
                )
            })?;
            if all_integer && val.parse::<i64>().is_err() && Some(z) != header.nodata {
                all_integer = false;
            }
            data.push(z);
        }
    }
    if in_header {
        // header only, i.e. an empty grid
        header.apply(file_name, configs)?;
    }

    configs.data_type = if all_integer && (header.nodata.is_none() || header.nodata_is_integer) {
        DataType::I32
    } else {
        DataType::F32
    };
    configs.photometric_interp = PhotometricInterpretation::Continuous;

    Ok(())
}

pub fn write_arcascii(r: &mut Raster) -> Result<(), Error> {
    let f = File::create(&r.file_name)?;
    let mut writer = BufWriter::new(f);

    write_header(&mut writer, &r.configs, None)?;

    // write the data
    let integer = r.configs.data_type.is_integer();
    let columns = r.configs.columns;
    for row in 0..r.configs.rows {
        let values = &r.data[row * columns..(row + 1) * columns];
        let line = values
            .iter()
            .map(|v| {
                if integer && v.is_finite() {
                    format!("{}", v.round() as i64)
                } else {
                    format!("{}", v)
                }
            })
            .collect::<Vec<String>>()
            .join(" ");
        writeln!(writer, "{}", line)?;
    }

    writer.flush()?;

    Ok(())
}
