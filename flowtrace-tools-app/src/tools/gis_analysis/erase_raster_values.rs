/*
This tool is part of the flowtrace geospatial tools.
Created: 19/10/2026
License: MIT
*/

use crate::tools::*;
use flowtrace_common::utils::get_progress;
use flowtrace_raster::*;
use std::io::{Error, ErrorKind};

/// This tool erases the values of an input raster (`--input`) within the area covered by
/// an erase raster (`--erase`). Every cell holding valid data in the erase raster is
/// replaced in the output (`--output`) by the erase value (`--erase_value`), or by NoData
/// when no erase value is given. All other cells are copied from the input. Both rasters
/// must have the same number of rows and columns.
///
/// When the input raster holds integer data and the erase value has a fractional part,
/// the erase value is truncated and a warning is printed.
///
/// # See Also
/// `MaxUpstreamElevation`
pub struct EraseRasterValues {
    name: String,
    description: String,
    toolbox: String,
    parameters: Vec<ToolParameter>,
    example_usage: String,
}

impl EraseRasterValues {
    pub fn new() -> EraseRasterValues {
        // public constructor
        let name = "EraseRasterValues".to_string();
        let toolbox = "GIS Analysis".to_string();
        let description =
            "Erases the values of an input raster within the area defined by an erase raster."
                .to_string();

        let mut parameters = vec![];
        parameters.push(ToolParameter {
            name: "Input File".to_owned(),
            flags: vec!["-i".to_owned(), "--input".to_owned()],
            description: "Input raster file.".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Raster),
            default_value: None,
            optional: false,
        });

        parameters.push(ToolParameter {
            name: "Input Erase Area File".to_owned(),
            flags: vec!["--erase".to_owned()],
            description: "Input raster whose valid cells define the erase area.".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Raster),
            default_value: None,
            optional: false,
        });

        parameters.push(ToolParameter {
            name: "Output File".to_owned(),
            flags: vec!["-o".to_owned(), "--output".to_owned()],
            description: "Output raster file.".to_owned(),
            parameter_type: ParameterType::NewFile(ParameterFileType::Raster),
            default_value: None,
            optional: false,
        });

        parameters.push(ToolParameter {
            name: "Erase Value".to_owned(),
            flags: vec!["--erase_value".to_owned()],
            description: "Value assigned to erased cells; NoData if unspecified.".to_owned(),
            parameter_type: ParameterType::Float,
            default_value: None,
            optional: true,
        });

        let usage = example_usage(
            &name,
            "-i=DEM.asc --erase=lakes.asc -o=output.asc --erase_value=0.0",
        );

        EraseRasterValues {
            name: name,
            description: description,
            toolbox: toolbox,
            parameters: parameters,
            example_usage: usage,
        }
    }
}

impl FlowtraceTool for EraseRasterValues {
    fn get_source_file(&self) -> String {
        String::from(file!())
    }

    fn get_tool_name(&self) -> String {
        self.name.clone()
    }

    fn get_tool_description(&self) -> String {
        self.description.clone()
    }

    fn get_tool_parameters(&self) -> String {
        match serde_json::to_string(&self.parameters) {
            Ok(json_str) => return format!("{{\"parameters\":{}}}", json_str),
            Err(err) => return format!("{:?}", err),
        }
    }

    fn get_example_usage(&self) -> String {
        self.example_usage.clone()
    }

    fn get_toolbox(&self) -> String {
        self.toolbox.clone()
    }

    fn run<'a>(
        &self,
        args: Vec<String>,
        working_directory: &'a str,
        verbose: bool,
    ) -> Result<(), Error> {
        let mut input_file = String::new();
        let mut erase_file = String::new();
        let mut output_file = String::new();
        let mut erase_value: Option<f64> = None;

        if args.len() == 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Tool run with no parameters.",
            ));
        }
        for (flag, value) in parse_args(&args) {
            let flag_val = flag.replace("--", "-");
            if flag_val == "-i" || flag_val == "-input" {
                input_file = required_value(&flag, value)?;
            } else if flag_val == "-erase" {
                erase_file = required_value(&flag, value)?;
            } else if flag_val == "-o" || flag_val == "-output" {
                output_file = required_value(&flag, value)?;
            } else if flag_val == "-erase_value" {
                // an empty value leaves the erase value unset
                if value.as_deref().map_or(false, |v| !v.trim().is_empty()) {
                    erase_value = Some(parse_number(&flag, value)?);
                }
            }
        }

        if input_file.is_empty() || erase_file.is_empty() || output_file.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "The --input, --erase and --output parameters must all be specified.",
            ));
        }

        if verbose {
            print_welcome(&self.get_tool_name());
        }

        let input_file = resolve_file_name(&input_file, working_directory);
        let erase_file = resolve_file_name(&erase_file, working_directory);
        let output_file = resolve_file_name(&output_file, working_directory);

        if verbose {
            println!("Reading data...")
        };
        let input = Raster::new(&input_file, "r")?;
        let eraser = Raster::new(&erase_file, "r")?;

        // make sure the input files have the same size
        if !input.same_shape(&eraser) {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "The input files must have the same number of rows and columns and spatial extent.",
            ));
        }

        let start = Instant::now();

        let replacement = match erase_value {
            Some(v) if input.configs.data_type.is_integer() && v.fract() != 0f64 => {
                println!(
                    "Warning: Erase value {} was truncated to match the input raster's integer data type.",
                    v
                );
                v.trunc()
            }
            Some(v) => v,
            None => input.configs.background(),
        };

        let rows = input.configs.rows as isize;
        let columns = input.configs.columns as isize;
        let mut output = Raster::initialize_using_file(&output_file, &input);
        let mut num_erased = 0usize;
        let mut progress: usize;
        let mut old_progress: usize = 1;
        for row in 0..rows {
            let mut data = input.get_row_data(row);
            let erase_data = eraser.get_row_data(row);
            for col in 0..columns as usize {
                if !eraser.is_nodata(erase_data[col]) {
                    data[col] = replacement;
                    num_erased += 1;
                }
            }
            output.set_row_data(row, data);
            if verbose {
                progress = get_progress(row as usize, rows as usize);
                if progress != old_progress {
                    println!("Progress: {}%", progress);
                    old_progress = progress;
                }
            }
        }
        output.update_min_max();

        let elapsed_time = get_formatted_elapsed_time(start);

        if verbose {
            println!("Saving data...")
        };
        let _ = match output.write() {
            Ok(_) => {
                if verbose {
                    println!("Output file written")
                }
            }
            Err(e) => return Err(e),
        };
        if verbose {
            println!("Cells erased: {}", num_erased);
            println!(
                "{}",
                &format!("Elapsed Time (excluding I/O): {}", elapsed_time)
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::env;
    use std::fs;

    fn temp_file(name: &str) -> String {
        env::temp_dir()
            .join(format!("flowtrace_erase_{}_{}", std::process::id(), name))
            .to_string_lossy()
            .to_string()
    }

    fn run_tool(args: &[String]) -> Result<(), Error> {
        EraseRasterValues::new().run(args.to_vec(), "", false)
    }

    const HEADER: &str = "ncols 3\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\nNODATA_value -9999\n";

    #[test]
    fn test_erase_to_nodata() {
        let input = temp_file("nd_in.asc");
        let eraser = temp_file("nd_erase.asc");
        let out = temp_file("nd_out.asc");
        fs::write(&input, format!("{}1.5 2.5 3.5\n4.5 5.5 6.5\n", HEADER)).unwrap();
        fs::write(&eraser, format!("{}1 -9999 -9999\n-9999 -9999 7\n", HEADER)).unwrap();

        run_tool(&[
            format!("-i={}", input),
            format!("--erase={}", eraser),
            format!("-o={}", out),
        ])
        .unwrap();

        let r = Raster::new(&out, "r").unwrap();
        assert_eq!(r.get_row_data(0), vec![-9999.0, 2.5, 3.5]);
        assert_eq!(r.get_row_data(1), vec![4.5, 5.5, -9999.0]);
        assert_eq!(r.num_valid_cells(), 4);

        for f in [input, eraser, out] {
            let _ = fs::remove_file(f);
        }
    }

    #[test]
    fn test_fractional_erase_value_is_truncated_for_integer_rasters() {
        let input = temp_file("int_in.asc");
        let eraser = temp_file("int_erase.asc");
        let out = temp_file("int_out.asc");
        fs::write(&input, format!("{}1 2 3\n4 5 6\n", HEADER)).unwrap();
        fs::write(&eraser, format!("{}-9999 0 -9999\n-9999 -9999 -9999\n", HEADER)).unwrap();

        run_tool(&[
            format!("-i={}", input),
            format!("--erase={}", eraser),
            format!("-o={}", out),
            "--erase_value=-2.7".to_string(),
        ])
        .unwrap();

        let r = Raster::new(&out, "r").unwrap();
        assert_eq!(r.configs.data_type, DataType::I32);
        assert_eq!(r.get_row_data(0), vec![1.0, -2.0, 3.0]);
        assert_eq!(r.get_row_data(1), vec![4.0, 5.0, 6.0]);

        for f in [input, eraser, out] {
            let _ = fs::remove_file(f);
        }
    }

    #[test]
    fn test_erase_shape_mismatch() {
        let input = temp_file("mm_in.asc");
        let eraser = temp_file("mm_erase.asc");
        let out = temp_file("mm_out.asc");
        fs::write(&input, format!("{}1 2 3\n4 5 6\n", HEADER)).unwrap();
        fs::write(
            &eraser,
            "ncols 1\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\n1\n",
        )
        .unwrap();

        let err = run_tool(&[
            format!("-i={}", input),
            format!("--erase={}", eraser),
            format!("-o={}", out),
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        for f in [input, eraser] {
            let _ = fs::remove_file(f);
        }
    }
}
