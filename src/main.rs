pub mod models {
    pub mod warmup;
}

pub mod client;
pub mod config;
pub mod monitor;
pub mod mqtt;

use crate::client::{Thermostat, WarmupClient};
use crate::config::Config;
use crate::mqtt::{MqttPublisher, Publisher};
use log::{error, info};
use std::path::{Path, PathBuf};

#[derive(Debug)]
struct LoadedEnvFile {
    path: PathBuf,
    explicit: bool,
}

pub fn run() -> Result<(), String> {
    // 1) Load config
    let cfg = Config::from_env()?;
    info!(
        "Config loaded (broker={}, client_id={}, qos={}, retain={}, topic_base={}, poll_interval={}s)",
        cfg.mqtt_broker,
        cfg.mqtt_client_id,
        cfg.mqtt_qos,
        cfg.mqtt_retain,
        cfg.topic_base,
        cfg.poll_interval.as_secs()
    );

    // 2) Connect broker
    let mut publisher = MqttPublisher::new(&cfg)?;
    publisher.connect()?;
    info!("Connected to MQTT broker {}", cfg.mqtt_broker);

    // 3) Authenticate against the Warmup API
    let client = WarmupClient::new(cfg.warmup_email.as_str(), cfg.warmup_password.as_str())
        .map_err(|e| format!("Warmup auth failed (check WARMUP_EMAIL/WARMUP_PASSWORD): {}", e))?;
    info!("Authenticated to Warmup API");

    // 4) Discover locations
    let locations = client
        .list_locations()
        .map_err(|e| format!("list_locations failed: {}", e))?;
    let names = locations
        .iter()
        .filter_map(|l| l.name.as_deref())
        .collect::<Vec<_>>()
        .join(", ");
    info!("Discovered {} location(s): {}", locations.len(), names);

    // 5) Poll until a fatal error
    let result = monitor::run_loop(&client, &mut publisher, &cfg.topic_base, cfg.poll_interval);
    publisher.close();
    result
}

fn configure_env_from_cli() -> Result<Option<LoadedEnvFile>, String> {
    let mut args = std::env::args_os();
    args.next(); // skip program name

    let mut env_file: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.to_str() {
            Some("--env-file") => {
                if env_file.is_some() {
                    return Err("`--env-file` provided more than once".to_string());
                }
                let value = args
                    .next()
                    .ok_or_else(|| "`--env-file` requires a path argument".to_string())?;
                env_file = Some(PathBuf::from(value));
            }
            Some(s) if s.starts_with("--env-file=") => {
                if env_file.is_some() {
                    return Err("`--env-file` provided more than once".to_string());
                }
                let path_str = &s["--env-file=".len()..];
                if path_str.is_empty() {
                    return Err("`--env-file` requires a path argument".to_string());
                }
                env_file = Some(PathBuf::from(path_str));
            }
            Some(other) => return Err(format!("unrecognised argument: {}", other)),
            None => return Err("argument contains invalid UTF-8".to_string()),
        }
    }

    if let Some(path) = env_file {
        if !path.is_file() {
            return Err(format!("env file not found: {}", path.display()));
        }
        load_env_file(&path)?;
        Ok(Some(LoadedEnvFile { path, explicit: true }))
    } else {
        let cwd = std::env::current_dir().map_err(|e| format!("unable to read current directory: {}", e))?;
        let default_path = cwd.join(".env");
        if default_path.is_file() {
            load_env_file(&default_path)?;
            Ok(Some(LoadedEnvFile {
                path: default_path,
                explicit: false,
            }))
        } else {
            Ok(None)
        }
    }
}

fn load_env_file(path: &Path) -> Result<(), String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path.display(), e))?;

    for (index, line) in content.lines().enumerate() {
        match parse_env_line(line) {
            Ok(Some((key, value))) => {
                // Values already supplied via the process environment win.
                if std::env::var_os(&key).is_none() {
                    // Updating process-level environment variables is unsafe on some targets.
                    unsafe {
                        std::env::set_var(key, value);
                    }
                }
            }
            Ok(None) => {}
            Err(e) => return Err(format!("{}:{}: {}", path.display(), index + 1, e)),
        }
    }

    Ok(())
}

/// Parse one `.env` line into a key/value pair. Supports comments, an
/// optional `export ` prefix and simple single/double quoting (no escapes).
fn parse_env_line(line: &str) -> Result<Option<(String, String)>, String> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let assignment = trimmed
        .strip_prefix("export ")
        .map(str::trim_start)
        .unwrap_or(trimmed);
    let (key, value) = assignment
        .split_once('=')
        .ok_or_else(|| "missing '=' in assignment".to_string())?;

    let key = key.trim();
    if key.is_empty() || key.chars().any(|c| c.is_whitespace()) {
        return Err(format!("invalid environment variable name: {:?}", key));
    }

    let value = value.trim();
    let value = if let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
    {
        inner.to_string()
    } else {
        value
            .split_once(" #")
            .map(|(v, _)| v.trim_end())
            .unwrap_or(value)
            .to_string()
    };

    Ok(Some((key.to_string(), value)))
}

fn main() {
    let loaded_env = match configure_env_from_cli() {
        Ok(info) => info,
        Err(err) => {
            eprintln!("fatal: {}", err);
            std::process::exit(1);
        }
    };

    // Init logging after environment so RUST_LOG from .env is respected.
    let default_filter = env_logger::Env::default().default_filter_or("info");
    env_logger::Builder::from_env(default_filter)
        .format_timestamp_secs()
        .init();

    if let Some(info) = loaded_env.as_ref() {
        let origin = if info.explicit { "CLI-specified" } else { "default" };
        info!("Environment loaded from {} .env file: {}", origin, info.path.display());
    }

    info!(
        "warmup2mqtt {} (git {}) starting",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_TIME_GIT_HASH")
    );
    if let Err(e) = run() {
        error!("fatal: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::parse_env_line;

    #[test]
    fn env_lines_skip_blanks_and_comments() {
        assert_eq!(parse_env_line("").unwrap(), None);
        assert_eq!(parse_env_line("   ").unwrap(), None);
        assert_eq!(parse_env_line("# MQTT_BROKER=x").unwrap(), None);
    }

    #[test]
    fn env_lines_parse_plain_and_exported_assignments() {
        assert_eq!(
            parse_env_line("MQTT_BROKER=tcp://127.0.0.1:1883").unwrap(),
            Some(("MQTT_BROKER".to_string(), "tcp://127.0.0.1:1883".to_string()))
        );
        assert_eq!(
            parse_env_line("export MQTT_QOS=1").unwrap(),
            Some(("MQTT_QOS".to_string(), "1".to_string()))
        );
    }

    #[test]
    fn env_lines_strip_quotes_and_trailing_comments() {
        assert_eq!(
            parse_env_line(r#"WARMUP_PASSWORD="p4ss #word""#).unwrap(),
            Some(("WARMUP_PASSWORD".to_string(), "p4ss #word".to_string()))
        );
        assert_eq!(
            parse_env_line("MQTT_TOPIC_BASE=warmup # prefix").unwrap(),
            Some(("MQTT_TOPIC_BASE".to_string(), "warmup".to_string()))
        );
    }

    #[test]
    fn env_lines_reject_malformed_assignments() {
        assert!(parse_env_line("NOT AN ASSIGNMENT").is_err());
        assert!(parse_env_line("=value").is_err());
        assert!(parse_env_line("BAD KEY=value").is_err());
    }
}
