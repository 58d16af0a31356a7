/*
This code is part of the flowtrace geospatial tools.
Created: 19/10/2026
License: MIT
*/

/*!
flowtrace_tools is a command-line program for tracing elevations along D8 flow
networks. It can be run from a terminal, or from a script, with the following
commands:

| Command           | Description                                                                          |
| ----------------- | ------------------------------------------------------------------------------------ |
| --cd, --wd        | Changes the working directory; used in conjunction with --run flag.                  |
| -h, --help        | Prints help information.                                                             |
| --listtools       | Lists all available tools, with tool descriptions. Keywords may also be used.        |
| -r, --run         | Runs a tool; used in conjunction with --cd flag; -r="MaxUpstreamElevation".          |
| --toolbox         | Prints the toolbox associated with a tool; --toolbox=EraseRasterValues.              |
| --toolhelp        | Prints the help associated with a tool; --toolhelp="MaxUpstreamElevation".           |
| --toolparameters  | Prints the parameters (in json form) for a specific tool.                            |
| -v                | Verbose mode. Without this flag, tool outputs will not be printed.                   |
| --viewcode        | Prints the source file of a tool.                                                    |
| --version         | Prints the version information.                                                      |

*/

pub mod tools;

use crate::tools::ToolManager;
use flowtrace_common::configs::{get_configs, save_configs};
use std::env;
use std::io::Error;
use std::path;
use std::process;

#[macro_use]
extern crate serde_derive;

/// flowtrace_tools traces elevations down D8 flow networks.
///
/// # Examples
///
/// From the command line prompt, a tool can be run as follows:
///
/// ```text
/// >>./flowtrace_tools --wd='/Users/jane/data/' --run=MaxUpstreamElevation --dem='dem.asc' --d8_pntr='pntr.asc' --output='max_elev.asc' -v
/// ```
fn main() {
    match run() {
        Ok(()) => {}
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    }
}

/// Strips the flag names and quotes from a `--flag=value` argument.
fn flag_value(arg: &str, flags: &[&str]) -> String {
    let mut v = arg.to_string();
    for flag in flags {
        if v.starts_with(flag) {
            v = v[flag.len()..].to_string();
            break;
        }
    }
    let v = v.replace("\"", "").replace("\'", "");
    match v.strip_prefix('=') {
        Some(s) => s.to_string(),
        None => v,
    }
}

fn run() -> Result<(), Error> {
    let sep: &str = &path::MAIN_SEPARATOR.to_string();
    let mut tool_name = String::new();
    let mut run_tool = false;
    let mut tool_help = false;
    let mut tool_parameters = false;
    let mut toolbox = false;
    let mut list_tools = false;
    let mut view_code = false;
    let mut keywords: Vec<String> = vec![];
    let mut tool_args_vec: Vec<String> = vec![];
    let mut finding_working_dir = false;
    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        version();
        help();
        let tm = ToolManager::new("", &false)?;
        tm.list_tools();

        return Ok(());
    }

    let mut configs = get_configs()?;
    let mut configs_modified = false;

    for arg in args {
        let flag_val = arg.to_lowercase().replace("--", "-");
        if flag_val == "-h" || flag_val == "-help" {
            help();
            return Ok(());
        } else if flag_val.starts_with("-cd")
            || flag_val.starts_with("-wd")
            || flag_val.starts_with("-working_directory")
        {
            let mut v = flag_value(
                &arg,
                &["--cd", "--wd", "--working_directory", "-cd", "-wd", "-working_directory"],
            );
            if v.trim().is_empty() {
                finding_working_dir = true;
                continue;
            }
            if !v.ends_with(sep) {
                v.push_str(sep);
            }
            if configs.working_directory != v {
                configs.working_directory = v;
                configs_modified = true;
            }
        } else if flag_val == "-r" || flag_val.starts_with("-r=") || flag_val.starts_with("-run") {
            tool_name = flag_value(&arg, &["--run", "-run", "-r"]);
            run_tool = true;
        } else if flag_val.starts_with("-toolhelp") {
            tool_name = flag_value(&arg, &["--toolhelp", "-toolhelp"]);
            tool_help = true;
        } else if flag_val.starts_with("-toolparameters") {
            tool_name = flag_value(&arg, &["--toolparameters", "-toolparameters"]);
            tool_parameters = true;
        } else if flag_val.starts_with("-toolbox") {
            tool_name = flag_value(&arg, &["--toolbox", "-toolbox"]);
            toolbox = true;
        } else if flag_val.starts_with("-listtools") || flag_val.starts_with("-list_tools") {
            list_tools = true;
        } else if flag_val.starts_with("-viewcode") {
            tool_name = flag_value(&arg, &["--viewcode", "-viewcode"]);
            view_code = true;
        } else if flag_val == "-v" || flag_val.starts_with("-v=") || flag_val.starts_with("-verbose") {
            let v = flag_value(&arg, &["--verbose", "-verbose", "-v"]);
            let verbose = v.is_empty() || v.to_lowercase().contains("t");
            if configs.verbose_mode != verbose {
                configs.verbose_mode = verbose;
                configs_modified = true;
            }
        } else if flag_val.starts_with("-version") {
            version();
            return Ok(());
        } else if arg.starts_with("-") {
            // it's an arg to be fed to the tool
            tool_args_vec.push(arg.trim().to_string());
        } else {
            let arg = arg.trim().replace("\"", "").replace("\'", "");
            if finding_working_dir {
                let mut v = arg;
                if !v.ends_with(sep) {
                    v.push_str(sep);
                }
                configs.working_directory = v;
                configs_modified = true;
                finding_working_dir = false;
            } else if !tool_args_vec.is_empty() {
                tool_args_vec.push(arg);
            } else {
                // add it to the keywords list
                keywords.push(arg);
            }
        }
    }

    if configs_modified {
        save_configs(&configs)?;
    }

    let tm = ToolManager::new(&configs.working_directory, &configs.verbose_mode)?;
    let names_a_tool = run_tool || tool_help || tool_parameters || toolbox || view_code;
    if tool_name.is_empty() && !keywords.is_empty() && names_a_tool {
        tool_name = keywords[0].clone();
    }
    if run_tool {
        return tm.run_tool(tool_name, tool_args_vec);
    } else if tool_help {
        return tm.tool_help(tool_name);
    } else if tool_parameters {
        return tm.tool_parameters(tool_name);
    } else if toolbox {
        return tm.toolbox(tool_name);
    } else if list_tools {
        if keywords.is_empty() {
            tm.list_tools();
        } else {
            tm.list_tools_with_keywords(keywords);
        }
    } else if view_code {
        return tm.get_tool_source_code(tool_name);
    }

    Ok(())
}

fn help() {
    let ext = if cfg!(target_os = "windows") { ".exe" } else { "" };
    let exe_name = &format!("flowtrace_tools{}", ext);
    let sep: String = path::MAIN_SEPARATOR.to_string();
    let s = "flowtrace_tools Help

The following commands are recognized:
--cd, --wd          Changes the working directory; used in conjunction with --run flag.
-h, --help          Prints help information.
--listtools         Lists all available tools. Keywords may also be used, --listtools elevation.
-r, --run           Runs a tool; used in conjunction with --wd flag; -r=\"MaxUpstreamElevation\".
--toolbox           Prints the toolbox associated with a tool; --toolbox=EraseRasterValues.
--toolhelp          Prints the help associated with a tool; --toolhelp=\"MaxUpstreamElevation\".
--toolparameters    Prints the parameters (in json form) for a specific tool; --toolparameters=\"MaxUpstreamElevation\".
-v                  Verbose mode. Without this flag, tool outputs will not be printed.
--viewcode          Prints the source file of a tool; --viewcode=\"MaxUpstreamElevation\".
--version           Prints the version information.

Example Usage:
>> .*EXE_NAME -r=MaxUpstreamElevation --cd=\"*path*to*data*\" --dem=dem.asc --d8_pntr=pntr.asc -o=max_elev.asc
"
    .replace("*", &sep)
    .replace("EXE_NAME", exe_name);
    println!("{}", s);
}

fn version() {
    const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");
    println!(
        "flowtrace_tools v{}

flowtrace_tools traces maximum upstream elevations along D8 flow networks
in ArcGIS ASCII and binary float grids.",
        VERSION.unwrap_or("unknown")
    );
}
