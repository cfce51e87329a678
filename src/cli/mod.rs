//! Command-line arguments for `snmptrapd`.
//!
//! This module is only available with the `cli` feature.

use crate::config::Config;
use crate::error::Result;
use crate::mapper::EcsCompatibility;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Receive SNMP traps and print them as JSON lines.
#[derive(Debug, Parser)]
#[command(name = "snmptrapd", version, about)]
pub struct Args {
    /// YAML configuration file. Flags override its values.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long)]
    pub host: Option<String>,

    /// UDP port to listen on.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Accepted community string. Repeat for several.
    #[arg(short = 'C', long = "community", value_name = "COMMUNITY")]
    pub communities: Vec<String>,

    /// Directory of YAML MIB modules.
    #[arg(long, value_name = "DIR")]
    pub yamlmibdir: Option<PathBuf>,

    /// Field reference to nest trap fields under, e.g. `[snmp]`.
    #[arg(long)]
    pub target: Option<String>,

    /// ECS compatibility mode: disabled, v1 or v8.
    #[arg(long, value_name = "MODE")]
    pub ecs_compatibility: Option<EcsCompatibility>,

    /// Wait before restarting a failed listener (e.g. `5s`, `500ms`).
    #[arg(long, value_parser = parse_duration)]
    pub cooldown: Option<Duration>,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Load the configuration file (or defaults) and apply flag overrides.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_yaml_file(path)?,
            None => Config::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Overwrite `config` with every flag that was given.
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if !self.communities.is_empty() {
            config.community = self.communities.clone();
        }
        if let Some(dir) = &self.yamlmibdir {
            config.yamlmibdir = Some(dir.clone());
        }
        if let Some(target) = &self.target {
            config.target = Some(target.clone());
        }
        if let Some(ecs) = self.ecs_compatibility {
            config.ecs_compatibility = ecs;
        }
        if let Some(cooldown) = self.cooldown {
            config.cooldown = cooldown;
        }
    }

    /// Filter used when `RUST_LOG` is unset.
    pub fn default_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "snmptrap_input=info",
            1 => "snmptrap_input=debug",
            _ => "snmptrap_input=trace",
        }
    }

    /// Install a stderr subscriber. `RUST_LOG` takes precedence over `-v`/`-q`.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_filter()));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .init();
    }
}

/// Parse a human-readable duration such as `5s` or `1m30s`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    humantime::parse_duration(s).map_err(|e| format!("invalid duration {:?}: {}", s, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snmptrap.yaml");
        std::fs::write(&path, "port: 2162\ncommunity: private\ncooldown: 1s\n").unwrap();

        let args = Args::try_parse_from([
            "snmptrapd",
            "--config",
            path.to_str().unwrap(),
            "--port",
            "3162",
            "-C",
            "ops",
            "-C",
            "public",
            "--ecs-compatibility",
            "v8",
        ])
        .unwrap();
        let config = args.load_config().unwrap();
        assert_eq!(config.port, 3162);
        assert_eq!(config.community, vec!["ops", "public"]);
        assert_eq!(config.cooldown, Duration::from_secs(1));
        assert_eq!(config.ecs_compatibility, EcsCompatibility::V8);
    }

    #[test]
    fn test_defaults_without_file() {
        let args = Args::try_parse_from(["snmptrapd"]).unwrap();
        assert_eq!(args.load_config().unwrap(), Config::default());
        assert_eq!(args.default_filter(), "snmptrap_input=info");
    }

    #[test]
    fn test_verbosity() {
        let args = Args::try_parse_from(["snmptrapd", "-vv"]).unwrap();
        assert_eq!(args.default_filter(), "snmptrap_input=trace");
        let args = Args::try_parse_from(["snmptrapd", "-q"]).unwrap();
        assert_eq!(args.default_filter(), "error");
        assert!(Args::try_parse_from(["snmptrapd", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_bad_flag_values() {
        assert!(Args::try_parse_from(["snmptrapd", "--cooldown", "soon"]).is_err());
        assert!(Args::try_parse_from(["snmptrapd", "--ecs-compatibility", "v2"]).is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert!(parse_duration("").is_err());
    }
}
