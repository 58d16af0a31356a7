/*
This tool is part of the flowtrace geospatial tools.
Created: 19/10/2026
License: MIT
*/

use crate::tools::*;
use flowtrace_common::algorithms::{TraversalMode, UpstreamElevation};
use flowtrace_common::configs::get_configs;
use flowtrace_common::utils::get_progress;
use flowtrace_raster::*;
use std::io::{Error, ErrorKind};

/// This tool assigns each cell of a digital elevation model (DEM) the highest elevation
/// found upstream of it along the D8 flow network. The user must specify the name of the
/// input DEM (`--dem`), a D8 flow pointer raster (`--d8_pntr`) using the ESRI pointer
/// scheme, in which split flow may be encoded by OR-ing several direction codes, and the
/// output raster (`--output`).
///
/// Two propagation modes are available (`--mode`). In `WATERSHED` mode every cell receives
/// the maximum elevation anywhere within its upstream area. In `LONGEST_STREAM` mode a cell
/// instead receives the elevation carried along the longest flow path reaching it, with
/// diagonal steps measured as the cell diagonal. In that mode the accumulated flow-path
/// length may optionally be written to a second raster (`--out_flow_len`).
///
/// Flow traces are abandoned after `--step_ceiling` cell updates and the grid is swept
/// again; sweeping stops once nothing changes or after `--max_sweeps` sweeps, in which
/// case a warning is printed. Both limits default to the values in settings.json.
///
/// NoData cells in the DEM are left as NoData in the output and are never written to.
///
/// # See Also
/// `EraseRasterValues`
pub struct MaxUpstreamElevation {
    name: String,
    description: String,
    toolbox: String,
    parameters: Vec<ToolParameter>,
    example_usage: String,
}

impl MaxUpstreamElevation {
    pub fn new() -> MaxUpstreamElevation {
        // public constructor
        let name = "MaxUpstreamElevation".to_string();
        let toolbox = "Hydrological Analysis".to_string();
        let description =
            "Assigns each cell the maximum elevation upstream along its D8 flow paths."
                .to_string();

        let mut parameters = vec![];
        parameters.push(ToolParameter {
            name: "Input DEM File".to_owned(),
            flags: vec!["-i".to_owned(), "--dem".to_owned()],
            description: "Input raster DEM file.".to_owned(),
            parameter_type: ParameterType::ExistingFile(ParameterFileType::Raster),
            default_value: None,
            optional: false,
        });

        parameters.push(ToolParameter {
            name: "Input D8 Pointer File".to_owned(),
            flags: vec!["--d8_pntr".to_owned(), "--flow_dir".to_owned()],
            description: "Input D8 pointer raster file (ESRI pointer scheme).".to_owned(),
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
            name: "Propagation Mode".to_owned(),
            flags: vec!["--mode".to_owned()],
            description: "Propagation mode; 'WATERSHED' or 'LONGEST_STREAM'. The flag --longest_stream is a synonym for the latter.".to_owned(),
            parameter_type: ParameterType::OptionList(vec![
                "WATERSHED".to_owned(),
                "LONGEST_STREAM".to_owned(),
            ]),
            default_value: Some("WATERSHED".to_owned()),
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Output Flow Length File".to_owned(),
            flags: vec!["--out_flow_len".to_owned()],
            description: "Optional output flow-path length raster (LONGEST_STREAM mode only)."
                .to_owned(),
            parameter_type: ParameterType::NewFile(ParameterFileType::Raster),
            default_value: None,
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Step Ceiling".to_owned(),
            flags: vec!["--step_ceiling".to_owned()],
            description: "Cell updates a single trace may make before it is deferred to another sweep."
                .to_owned(),
            parameter_type: ParameterType::Integer,
            default_value: Some("950".to_owned()),
            optional: true,
        });

        parameters.push(ToolParameter {
            name: "Maximum Sweeps".to_owned(),
            flags: vec!["--max_sweeps".to_owned()],
            description: "Upper bound on the number of sweeps over the grid.".to_owned(),
            parameter_type: ParameterType::Integer,
            default_value: Some("1000".to_owned()),
            optional: true,
        });

        let usage = example_usage(
            &name,
            "--dem=DEM.asc --d8_pntr=pointer.asc --output=max_elev.asc --mode=LONGEST_STREAM --out_flow_len=flow_len.flt",
        );

        MaxUpstreamElevation {
            name: name,
            description: description,
            toolbox: toolbox,
            parameters: parameters,
            example_usage: usage,
        }
    }
}

impl FlowtraceTool for MaxUpstreamElevation {
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
        let configs = get_configs()?;
        let mut dem_file = String::new();
        let mut pntr_file = String::new();
        let mut output_file = String::new();
        let mut flow_len_file = String::new();
        let mut mode = TraversalMode::Watershed;
        let mut step_ceiling = configs.step_ceiling;
        let mut max_sweeps = configs.max_sweeps;

        if args.len() == 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Tool run with no parameters.",
            ));
        }
        for (flag, value) in parse_args(&args) {
            let flag_val = flag.replace("--", "-");
            if flag_val == "-i" || flag_val == "-dem" || flag_val == "-input" {
                dem_file = required_value(&flag, value)?;
            } else if flag_val == "-d8_pntr" || flag_val == "-flow_dir" {
                pntr_file = required_value(&flag, value)?;
            } else if flag_val == "-o" || flag_val == "-output" {
                output_file = required_value(&flag, value)?;
            } else if flag_val == "-out_flow_len" {
                flow_len_file = required_value(&flag, value)?;
            } else if flag_val == "-mode" {
                mode = required_value(&flag, value)?.parse()?;
            } else if flag_val == "-longest_stream" {
                mode = if parse_switch(value) {
                    TraversalMode::LongestStream
                } else {
                    TraversalMode::Watershed
                };
            } else if flag_val == "-step_ceiling" {
                step_ceiling = parse_number(&flag, value)?;
            } else if flag_val == "-max_sweeps" {
                max_sweeps = parse_number(&flag, value)?;
            }
        }

        if dem_file.is_empty() || pntr_file.is_empty() || output_file.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "The --dem, --d8_pntr and --output parameters must all be specified.",
            ));
        }

        if verbose {
            print_welcome(&self.get_tool_name());
        }

        let dem_file = resolve_file_name(&dem_file, working_directory);
        let pntr_file = resolve_file_name(&pntr_file, working_directory);
        let output_file = resolve_file_name(&output_file, working_directory);
        let flow_len_file = resolve_file_name(&flow_len_file, working_directory);

        if verbose {
            println!("Reading DEM data...")
        };
        let dem = Raster::new(&dem_file, "r")?;
        if verbose {
            println!("Reading flow direction data...")
        };
        let pntr = Raster::new(&pntr_file, "r")?;

        // make sure the input files have the same size
        if !dem.same_shape(&pntr) {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "The input files must have the same number of rows and columns and spatial extent.",
            ));
        }

        let start = Instant::now();

        let elevation = dem.get_data_as_array2d()?;
        let flow_dir = pntr.get_data_as_i32_array2d(-1)?;

        let propagator = UpstreamElevation::new(mode)
            .with_nodata(dem.configs.nodata)
            .with_cell_size(dem.configs.resolution_x, dem.configs.resolution_y)
            .with_step_ceiling(step_ceiling)
            .with_max_sweeps(max_sweeps);
        if verbose {
            println!("Propagating elevations ({} mode)...", propagator.mode());
        }
        let mut old_progress: usize = 1;
        let result = propagator.propagate_with_progress(&elevation, &flow_dir, |sweep, row, rows| {
            if verbose {
                let progress = get_progress(row as usize, rows as usize);
                if progress != old_progress {
                    println!("Progress (sweep {}): {}%", sweep, progress);
                    old_progress = progress;
                }
            }
        })?;

        let report = &result.report;
        if report.sweep_cap_reached {
            println!(
                "Warning: Stopped after the maximum of {} sweeps; some cells may not hold their final value.",
                report.sweeps
            );
        }
        if verbose {
            println!(
                "Sweeps: {}, cell updates: {}, deferred traces: {}, faulted branches: {}",
                report.sweeps, report.cells_updated, report.traces_aborted, report.branch_faults
            );
        }

        let mut output =
            Raster::initialize_using_array2d(&output_file, &dem.configs, &result.elevation)?;
        output.configs.data_type = DataType::F32;
        output.configs.photometric_interp = PhotometricInterpretation::Continuous;
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

        if !flow_len_file.is_empty() {
            match result.flow_length {
                Some(flow_length) => {
                    // the flow-length grid is a by-product; failing to save it is not fatal
                    let written = Raster::initialize_using_array2d(
                        &flow_len_file,
                        &dem.configs,
                        &flow_length,
                    )
                    .and_then(|mut fl| {
                        fl.configs.data_type = DataType::F32;
                        fl.configs.photometric_interp = PhotometricInterpretation::Continuous;
                        fl.update_min_max();
                        fl.write()
                    });
                    match written {
                        Ok(_) => {
                            if verbose {
                                println!("Flow length file written")
                            }
                        }
                        Err(e) => println!(
                            "Warning: The flow length file {} could not be written: {}",
                            flow_len_file, e
                        ),
                    }
                }
                None => println!(
                    "Warning: A flow length output is only produced in LONGEST_STREAM mode."
                ),
            }
        }

        if verbose {
            println!("Input DEM file: {}", dem_file);
            println!("Input D8 pointer file: {}", pntr_file);
            println!("Propagation mode: {}", mode);
            println!(
                "{}",
                &format!("Elapsed Time (excluding I/O): {}", elapsed_time)
            );
        }

        Ok(())
    }
}
