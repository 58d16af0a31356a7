pub mod gis_analysis;
pub mod hydro_analysis;

use flowtrace_common::utils::get_formatted_elapsed_time;
use serde_json;
use std::env;
use std::io::{Error, ErrorKind};
use std::path;
use std::time::Instant;

#[derive(Default)]
pub struct ToolManager {
    pub working_dir: String,
    pub verbose: bool,
    tool_names: Vec<String>,
}

impl ToolManager {
    pub fn new<'a>(
        working_directory: &'a str,
        verbose_mode: &'a bool,
    ) -> Result<ToolManager, Error> {
        let mut tool_names = vec![];
        // gis_analysis
        tool_names.push("EraseRasterValues".to_string());

        // hydro_analysis
        tool_names.push("MaxUpstreamElevation".to_string());

        let tm = ToolManager {
            working_dir: working_directory.to_string(),
            verbose: *verbose_mode,
            tool_names: tool_names,
        };
        Ok(tm)
    }

    fn get_tool(&self, tool_name: &str) -> Option<Box<dyn FlowtraceTool + 'static>> {
        match tool_name.to_lowercase().replace("_", "").as_ref() {
            // gis_analysis
            "eraserastervalues" => Some(Box::new(gis_analysis::EraseRasterValues::new())),

            // hydro_analysis
            "maxupstreamelevation" => Some(Box::new(hydro_analysis::MaxUpstreamElevation::new())),

            _ => None,
        }
    }

    pub fn run_tool(&self, tool_name: String, args: Vec<String>) -> Result<(), Error> {
        match self.get_tool(tool_name.as_ref()) {
            Some(tool) => tool.run(args, &self.working_dir, self.verbose),
            None => Err(Error::new(
                ErrorKind::NotFound,
                format!("Unrecognized tool name {}.", tool_name),
            )),
        }
    }

    pub fn tool_help(&self, tool_name: String) -> Result<(), Error> {
        if !tool_name.is_empty() {
            match self.get_tool(tool_name.as_ref()) {
                Some(tool) => println!("{}", get_help(tool)?),
                None => {
                    return Err(Error::new(
                        ErrorKind::NotFound,
                        format!("Unrecognized tool name {}.", tool_name),
                    ))
                }
            }
        } else {
            for (i, val) in self.tool_names.iter().enumerate() {
                if let Some(tool) = self.get_tool(val) {
                    println!("{}. {}\n", i + 1, get_help(tool)?);
                }
            }
        }
        Ok(())
    }

    pub fn tool_parameters(&self, tool_name: String) -> Result<(), Error> {
        match self.get_tool(tool_name.as_ref()) {
            Some(tool) => println!("{}", tool.get_tool_parameters()),
            None => {
                return Err(Error::new(
                    ErrorKind::NotFound,
                    format!("Unrecognized tool name {}.", tool_name),
                ))
            }
        }
        Ok(())
    }

    pub fn toolbox(&self, tool_name: String) -> Result<(), Error> {
        if !tool_name.is_empty() {
            match self.get_tool(tool_name.as_ref()) {
                Some(tool) => println!("{}", tool.get_toolbox()),
                None => {
                    return Err(Error::new(
                        ErrorKind::NotFound,
                        format!("Unrecognized tool name {}.", tool_name),
                    ))
                }
            }
        } else {
            let mut tool_details: Vec<(String, String)> = self
                .tool_names
                .iter()
                .filter_map(|val| self.get_tool(val))
                .map(|tool| (tool.get_tool_name(), tool.get_toolbox()))
                .collect();
            tool_details.sort();
            for (tool, toolbox) in tool_details {
                println!("{}: {}", tool, toolbox);
            }
        }
        Ok(())
    }

    pub fn list_tools(&self) {
        let mut tool_details: Vec<(String, String)> = self
            .tool_names
            .iter()
            .filter_map(|val| self.get_tool(val))
            .map(get_name_and_description)
            .collect();
        tool_details.sort();

        let mut ret = format!("All {} Available Tools:\n", tool_details.len());
        for (name, description) in &tool_details {
            ret.push_str(&format!("{}: {}\n\n", name, description));
        }
        println!("{}", ret);
    }

    pub fn list_tools_with_keywords(&self, keywords: Vec<String>) {
        let mut tool_details: Vec<(String, String)> = Vec::new();
        for val in &self.tool_names {
            let tool = match self.get_tool(val) {
                Some(tool) => tool,
                None => continue,
            };
            let toolbox = tool.get_toolbox().to_lowercase();
            let (nm, des) = get_name_and_description(tool);
            for kw in &keywords {
                let kw = kw.to_lowercase();
                if nm.to_lowercase().contains(&kw)
                    || des.to_lowercase().contains(&kw)
                    || toolbox.contains(&kw)
                {
                    tool_details.push((nm.clone(), des.clone()));
                    break;
                }
            }
        }

        let mut ret = format!("All {} Tools containing keywords:\n", tool_details.len());
        for (name, description) in &tool_details {
            ret.push_str(&format!("{}: {}\n\n", name, description));
        }
        println!("{}", ret);
    }

    pub fn get_tool_source_code(&self, tool_name: String) -> Result<(), Error> {
        match self.get_tool(tool_name.as_ref()) {
            Some(tool) => println!("{}", tool.get_source_file()),
            None => {
                return Err(Error::new(
                    ErrorKind::NotFound,
                    format!("Unrecognized tool name {}.", tool_name),
                ))
            }
        }
        Ok(())
    }
}

pub trait FlowtraceTool {
    fn get_tool_name(&self) -> String;
    fn get_tool_description(&self) -> String;
    fn get_tool_parameters(&self) -> String;
    fn get_example_usage(&self) -> String;
    fn get_toolbox(&self) -> String;
    fn get_source_file(&self) -> String;
    fn run<'a>(
        &self,
        args: Vec<String>,
        working_directory: &'a str,
        verbose: bool,
    ) -> Result<(), Error>;
}

fn get_help<'a>(wt: Box<dyn FlowtraceTool + 'a>) -> Result<String, Error> {
    let tool_name = wt.get_tool_name();
    let description = wt.get_tool_description();
    let parameters = wt.get_tool_parameters();
    let toolbox = wt.get_toolbox();
    let o: serde_json::Value = serde_json::from_str(&parameters)
        .map_err(|e| Error::new(ErrorKind::InvalidData, e.to_string()))?;
    let mut p = String::new();
    p.push_str("Flag               Description\n");
    p.push_str("-----------------  -----------\n");
    for d in o["parameters"].as_array().into_iter().flatten() {
        let flags = d["flags"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|f| f.as_str())
            .collect::<Vec<&str>>()
            .join(", ");
        p.push_str(&format!(
            "{:width$} {}\n",
            flags,
            d["description"].as_str().unwrap_or_default(),
            width = 18
        ));
    }
    let example = wt.get_example_usage();
    let s = if example.len() <= 1 {
        format!(
            "{}

Description:\n{}
Toolbox: {}
Parameters:\n
{}
",
            tool_name, description, toolbox, p
        )
    } else {
        format!(
            "{}
Description:\n{}
Toolbox: {}
Parameters:\n
{}

Example usage:
{}
",
            tool_name, description, toolbox, p, example
        )
    };
    Ok(s)
}

fn get_name_and_description<'a>(wt: Box<dyn FlowtraceTool + 'a>) -> (String, String) {
    (wt.get_tool_name(), wt.get_tool_description())
}

/// Prints the boxed welcome banner shown at the start of a verbose tool run.
fn print_welcome(tool_name: &str) {
    // 30 = length of the 'Powered by' statement.
    let welcome_len = format!("* Welcome to {} *", tool_name).len().max(30);
    println!("{}", "*".repeat(welcome_len));
    println!(
        "* Welcome to {} {}*",
        tool_name,
        " ".repeat(welcome_len - 15 - tool_name.len())
    );
    println!("* Powered by flowtrace_tools {}*", " ".repeat(welcome_len - 30));
    println!("{}", "*".repeat(welcome_len));
}

/// Builds the example command line shown by `--toolhelp`.
fn example_usage(tool_name: &str, args: &str) -> String {
    let sep: String = path::MAIN_SEPARATOR.to_string();
    let e = env::current_exe()
        .ok()
        .and_then(|p| p.file_name().map(|f| f.to_string_lossy().to_string()))
        .unwrap_or_else(|| "flowtrace_tools".to_string());
    format!(
        ">>.*{0} -r={1} -v --wd=\"*path*to*data*\" {2}",
        e, tool_name, args
    )
    .replace("*", &sep)
}

/// Splits the tool arguments into (flag, value) pairs. A flag's value is
/// either given after an equals sign or is the following argument; flags
/// with no value (e.g. `--longest_stream`) get `None`.
fn parse_args(args: &[String]) -> Vec<(String, Option<String>)> {
    let mut parsed = vec![];
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].replace("\"", "").replace("\'", "");
        if let Some((flag, value)) = arg.split_once('=') {
            parsed.push((flag.to_lowercase(), Some(value.to_string())));
        } else if i + 1 < args.len() && !args[i + 1].starts_with('-') {
            let value = args[i + 1].replace("\"", "").replace("\'", "");
            parsed.push((arg.to_lowercase(), Some(value)));
            i += 1;
        } else {
            parsed.push((arg.to_lowercase(), None));
        }
        i += 1;
    }
    parsed
}

/// Returns the value of a flag, or an InvalidInput error naming the flag.
fn required_value(flag: &str, value: Option<String>) -> Result<String, Error> {
    value.ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidInput,
            format!("The {} flag requires a value.", flag),
        )
    })
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T, Error> {
    let value = required_value(flag, value)?;
    value.trim().parse::<T>().map_err(|_| {
        Error::new(
            ErrorKind::InvalidInput,
            format!("Error parsing the value '{}' of {}.", value, flag),
        )
    })
}

/// Flag switches are on unless explicitly given a false value.
fn parse_switch(value: Option<String>) -> bool {
    match value {
        Some(v) => !v.to_lowercase().contains("false"),
        None => true,
    }
}

/// Prefixes the working directory onto file names given without a directory.
fn resolve_file_name(file_name: &str, working_directory: &str) -> String {
    let sep: String = path::MAIN_SEPARATOR.to_string();
    if file_name.is_empty() || file_name.contains(&sep) || file_name.contains("/") {
        return file_name.to_string();
    }
    format!("{}{}", working_directory, file_name)
}

#[derive(Serialize, Deserialize, Debug)]
struct ToolParameter {
    name: String,
    flags: Vec<String>,
    description: String,
    parameter_type: ParameterType,
    default_value: Option<String>,
    optional: bool,
}

#[derive(Serialize, Deserialize, Debug)]
enum ParameterType {
    Integer,
    Float,
    ExistingFile(ParameterFileType),
    NewFile(ParameterFileType),
    OptionList(Vec<String>),
}

#[derive(Serialize, Deserialize, Debug)]
enum ParameterFileType {
    Raster,
}

#[cfg(test)]
mod test {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let parsed = parse_args(&strings(&[
            "-i=dem.asc",
            "--D8_PNTR",
            "'pntr.asc'",
            "--longest_stream",
            "-o=\"out.asc\"",
        ]));
        assert_eq!(
            parsed,
            vec![
                ("-i".to_string(), Some("dem.asc".to_string())),
                ("--d8_pntr".to_string(), Some("pntr.asc".to_string())),
                ("--longest_stream".to_string(), None),
                ("-o".to_string(), Some("out.asc".to_string())),
            ]
        );
    }

    #[test]
    fn test_negative_numbers_need_an_equals_sign() {
        let parsed = parse_args(&strings(&["--erase_value=-5", "-v"]));
        assert_eq!(parsed[0].1, Some("-5".to_string()));
        assert_eq!(parsed[1], ("-v".to_string(), None));
    }

    #[test]
    fn test_resolve_file_name() {
        let sep = path::MAIN_SEPARATOR.to_string();
        let wd = format!("{}data{}", sep, sep);
        assert_eq!(
            resolve_file_name("dem.asc", &wd),
            format!("{}data{}dem.asc", sep, sep)
        );
        assert_eq!(resolve_file_name("a/dem.asc", &wd), "a/dem.asc");
        assert_eq!(resolve_file_name("", &wd), "");
    }

    #[test]
    fn test_parse_values() {
        assert!(parse_switch(None));
        assert!(!parse_switch(Some("False".to_string())));
        assert_eq!(parse_number::<usize>("--max_sweeps", Some("12".to_string())).unwrap(), 12);
        let err = parse_number::<f64>("--erase_value", Some("abc".to_string())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(required_value("-o", None).is_err());
    }

    #[test]
    fn test_tool_manager_finds_tools() {
        let tm = ToolManager::new("", &false).unwrap();
        assert!(tm.get_tool("max_upstream_elevation").is_some());
        assert!(tm.get_tool("EraseRasterValues").is_some());
        assert!(tm.get_tool("Slope").is_none());
        let err = tm.run_tool("Slope".to_string(), vec![]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_tool_parameters_are_valid_json() {
        let tm = ToolManager::new("", &false).unwrap();
        for name in &tm.tool_names {
            let tool = tm.get_tool(name).unwrap();
            let v: serde_json::Value = serde_json::from_str(&tool.get_tool_parameters()).unwrap();
            assert!(!v["parameters"].as_array().unwrap().is_empty());
            let help = get_help(tool).unwrap();
            assert!(help.starts_with(name.as_str()));
        }
    }
}
