use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::helpers::data_dir;
use crate::models::{Config, DEFAULT_LOG_LEVEL, DEFAULT_TIMEOUT_SECS};

pub const CONFIG_FILE: &str = "novastream_config.txt";

pub fn config_file_path() -> PathBuf {
    data_dir().join(CONFIG_FILE)
}

/// Parses `key=value` lines. Unknown keys and malformed lines are ignored.
pub fn parse_config(content: &str) -> Config {
    let mut cfg = Config::default();
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('#') {
            continue;
        }
        if let Some((k, v)) = line.split_once('=') {
            match k.trim() {
                "remote_url" => cfg.remote_url = v.trim().to_string(),
                "remote_key" => cfg.remote_key = v.trim().to_string(),
                "request_timeout_secs" => cfg.request_timeout_secs = v.trim().parse::<u64>().unwrap_or(DEFAULT_TIMEOUT_SECS),
                "log_level" => cfg.log_level = v.trim().to_string(),
                _ => {}
            }
        }
    }
    if cfg.request_timeout_secs == 0 {
        cfg.request_timeout_secs = DEFAULT_TIMEOUT_SECS;
    }
    if cfg.log_level.is_empty() {
        cfg.log_level = DEFAULT_LOG_LEVEL.to_string();
    }
    cfg
}

/// Reads the data-directory file, falling back to one in the working directory.
pub fn read_config() -> Result<Config, io::Error> {
    let content = match fs::read_to_string(config_file_path()) {
        Ok(s) => s,
        Err(_e) => fs::read_to_string(CONFIG_FILE)?,
    };
    Ok(parse_config(&content))
}

/// Like [`read_config`], but a missing file just means defaults.
pub fn load_config() -> Result<Config, io::Error> {
    match read_config() {
        Ok(cfg) => Ok(cfg),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e),
    }
}

pub fn write_config<W: Write>(mut w: W, cfg: &Config) -> Result<(), io::Error> {
    if !cfg.remote_url.is_empty() { writeln!(w, "remote_url={}", cfg.remote_url)?; }
    if !cfg.remote_key.is_empty() { writeln!(w, "remote_key={}", cfg.remote_key)?; }
    writeln!(w, "request_timeout_secs={}", cfg.request_timeout_secs)?;
    writeln!(w, "log_level={}", cfg.log_level)?;
    Ok(())
}

pub fn save_config(cfg: &Config) -> Result<(), io::Error> {
    let path = config_file_path();
    if let Some(parent) = path.parent() { fs::create_dir_all(parent)?; }
    write_config(fs::File::create(path)?, cfg)
}
