use super::arc_header::{write_header, ArcHeader};
use super::*;
use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};

fn header_file_name(file_name: &str) -> String {
    Path::new(file_name)
        .with_extension("hdr")
        .to_string_lossy()
        .to_string()
}

pub fn read_arcbinary(
    file_name: &str,
    configs: &mut RasterConfigs,
    data: &mut Vec<f64>,
) -> Result<(), Error> {
    // read the header file
    let header_file = header_file_name(file_name);
    let f = File::open(&header_file).map_err(|e| {
        Error::new(
            e.kind(),
            format!("Error opening the raster header file {}: {}", header_file, e),
        )
    })?;
    let mut header = ArcHeader::default();
    for line in BufReader::new(f).lines() {
        header.read_entry(&line?)?;
    }
    header.apply(&header_file, configs)?;
    configs.endian = header.byte_order.unwrap_or(Endianness::LittleEndian);
    configs.data_type = DataType::F32;
    configs.photometric_interp = PhotometricInterpretation::Continuous;

    // read the data file
    let num_cells = configs.rows * configs.columns;
    let f = File::open(file_name)?;
    let file_size = f.metadata()?.len();
    if file_size < num_cells as u64 * 4 {
        return Err(Error::new(
            ErrorKind::InvalidData,
            format!(
                "{} is too small for a {} x {} grid of 32-bit floats.",
                file_name, configs.rows, configs.columns
            ),
        ));
    }
    let mut reader = BufReader::new(f);
    data.reserve(num_cells);
    for _ in 0..num_cells {
        let z = match configs.endian {
            Endianness::LittleEndian => reader.read_f32::<LittleEndian>()?,
            Endianness::BigEndian => reader.read_f32::<BigEndian>()?,
        };
        data.push(z as f64);
    }

    Ok(())
}

pub fn write_arcbinary(r: &mut Raster) -> Result<(), Error> {
    // write the header file
    let f = File::create(header_file_name(&r.file_name))?;
    let mut writer = BufWriter::new(f);
    write_header(&mut writer, &r.configs, Some(r.configs.endian))?;
    writer.flush()?;

    // write the data file
    let f = File::create(&r.file_name)?;
    let mut writer = BufWriter::new(f);
    for &z in &r.data {
        match r.configs.endian {
            Endianness::LittleEndian => writer.write_f32::<LittleEndian>(z as f32)?,
            Endianness::BigEndian => writer.write_f32::<BigEndian>(z as f32)?,
        }
    }
    writer.flush()?;

    Ok(())
}
