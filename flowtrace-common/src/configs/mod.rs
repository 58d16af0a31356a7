use crate::algorithms::{DEFAULT_MAX_SWEEPS, DEFAULT_STEP_CEILING};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};

/// A structure to hold environment settings. Backed by a settings.json file in
/// the working directory of the executable.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Configs {
    #[serde(default = "default_verbose_mode")]
    pub verbose_mode: bool,
    #[serde(default)]
    pub working_directory: String,
    #[serde(default = "default_step_ceiling")]
    pub step_ceiling: usize,
    #[serde(default = "default_max_sweeps")]
    pub max_sweeps: usize,
}

fn default_verbose_mode() -> bool {
    true
}

fn default_step_ceiling() -> usize {
    DEFAULT_STEP_CEILING
}

fn default_max_sweeps() -> usize {
    DEFAULT_MAX_SWEEPS
}

impl Default for Configs {
    fn default() -> Configs {
        Configs {
            verbose_mode: default_verbose_mode(),
            working_directory: String::new(),
            step_ceiling: default_step_ceiling(),
            max_sweeps: default_max_sweeps(),
        }
    }
}

impl Configs {
    pub fn new() -> Configs {
        Configs::default()
    }
}

fn settings_file() -> Result<PathBuf, Error> {
    let mut dir = std::env::current_dir()?;
    if dir.ends_with("plugins") {
        dir.pop();
    }
    Ok(dir.join("settings.json"))
}

/// Reads the settings.json file, falling back on defaults when there is none.
pub fn get_configs() -> Result<Configs, Error> {
    read_configs(&settings_file()?)
}

pub fn save_configs(configs: &Configs) -> Result<(), Error> {
    write_configs(&settings_file()?, configs)
}

pub fn read_configs(file: &Path) -> Result<Configs, Error> {
    let contents = match fs::read_to_string(file) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Configs::new()),
        Err(e) => return Err(e),
    };
    serde_json::from_str(&contents).map_err(|e| {
        Error::new(
            ErrorKind::InvalidData,
            format!("Failed to parse {}: {}", file.display(), e),
        )
    })
}

pub fn write_configs(file: &Path, configs: &Configs) -> Result<(), Error> {
    let configs_json = serde_json::to_string_pretty(configs)
        .map_err(|e| Error::new(ErrorKind::Other, e.to_string()))?;
    fs::write(file, configs_json)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::env;

    fn temp_file(name: &str) -> PathBuf {
        env::temp_dir().join(format!("flowtrace_configs_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_missing_settings_file_gives_defaults() {
        let configs = read_configs(&temp_file("missing.json")).unwrap();
        assert_eq!(configs, Configs::default());
        assert_eq!(configs.step_ceiling, 950);
        assert!(configs.verbose_mode);
    }

    #[test]
    fn test_configs_round_trip() {
        let file = temp_file("round_trip.json");
        let configs = Configs {
            verbose_mode: false,
            working_directory: "/data/".to_string(),
            step_ceiling: 100,
            max_sweeps: 7,
        };
        write_configs(&file, &configs).unwrap();
        assert_eq!(read_configs(&file).unwrap(), configs);
        let _ = fs::remove_file(&file);
    }

    #[test]
    fn test_partial_settings_take_defaults() {
        let file = temp_file("partial.json");
        fs::write(&file, r#"{"verbose_mode": false}"#).unwrap();
        let configs = read_configs(&file).unwrap();
        assert!(!configs.verbose_mode);
        assert_eq!(configs.max_sweeps, DEFAULT_MAX_SWEEPS);
        let _ = fs::remove_file(&file);
    }

    #[test]
    fn test_malformed_settings_are_an_error() {
        let file = temp_file("malformed.json");
        fs::write(&file, "{ verbose_mode: ").unwrap();
        let err = read_configs(&file).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        let _ = fs::remove_file(&file);
    }
}
