//! Service config loader (strict parsing + environment overrides).
//!
//! Read once at startup. The YAML file is optional; when it is missing the
//! defaults apply. Environment variables are layered on top:
//! `JSON_LOGS`, `LOG_LEVEL`, `DATABASE_URL`, `LISTEN_ADDR`.

pub mod schema;

use std::fs;
use std::path::Path;

use loanstat_core::error::{LoanstatError, Result};

pub use schema::{DatabaseSection, LoggingSection, ServerSection, ServiceConfig};

pub const DEFAULT_CONFIG_PATH: &str = "loanstat.yaml";
pub const CONFIG_PATH_ENV: &str = "LOANSTAT_CONFIG";

pub fn load_from_str(s: &str) -> Result<ServiceConfig> {
    let cfg = parse(s)?;
    cfg.validate()?;
    Ok(cfg)
}

fn parse(s: &str) -> Result<ServiceConfig> {
    serde_yaml::from_str(s).map_err(|e| LoanstatError::BadRequest(format!("invalid yaml: {e}")))
}

/// Load `path` if it exists (defaults otherwise), apply overrides from `env`,
/// then validate. `env` is `std::env::var` in production.
pub fn load<F>(path: &str, env: F) -> Result<ServiceConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = if Path::new(path).exists() {
        let s = fs::read_to_string(path)
            .map_err(|e| LoanstatError::Internal(format!("read config failed: {e}")))?;
        parse(&s)?
    } else {
        ServiceConfig::default()
    };
    apply_env(&mut cfg, env)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn apply_env<F>(cfg: &mut ServiceConfig, env: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = env("JSON_LOGS") {
        cfg.logging.json = parse_bool("JSON_LOGS", &v)?;
    }
    if let Some(v) = env("LOG_LEVEL") {
        cfg.logging.level = v;
    }
    if let Some(v) = env("DATABASE_URL") {
        cfg.database.url = v;
    }
    if let Some(v) = env("LISTEN_ADDR") {
        cfg.server.listen = v;
    }
    Ok(())
}

fn parse_bool(name: &str, v: &str) -> Result<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(LoanstatError::BadRequest(format!("{name} must be a boolean, got {v:?}"))),
    }
}
