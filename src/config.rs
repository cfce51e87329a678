//! Configuration file.
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 1062
//! community: [public, ops]
//! yamlmibdir: /etc/snmptrap/mibs
//! target: "[snmp]"
//! ecs_compatibility: v8
//! cooldown: 5s
//! ```
//!
//! Every key is optional; unknown keys are rejected.

use crate::error::{Error, Result};
use crate::event::{Event, FieldPath};
use crate::listener::{DEFAULT_MAX_MESSAGE_SIZE, DEFAULT_PORT, ListenerConfig};
use crate::mapper::{EcsCompatibility, EventMapper};
use crate::mib::Mib;
use crate::sink::QueueSink;
use crate::supervisor::{DEFAULT_COOLDOWN, DEFAULT_QUEUE_CAPACITY};
use serde::{Deserialize, Deserializer};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

/// Listener, mapping and supervision settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Address to listen on.
    pub host: String,
    /// UDP port to listen on.
    pub port: u16,
    /// Accepted community strings; a single string or a list.
    #[serde(deserialize_with = "one_or_many")]
    pub community: Vec<String>,
    /// Directory of YAML MIB modules; every `*.yaml` file is loaded.
    pub yamlmibdir: Option<PathBuf>,
    /// Field reference to nest trap fields under.
    pub target: Option<String>,
    /// Where the source address is placed.
    pub ecs_compatibility: EcsCompatibility,
    /// Wait before restarting a failed listener.
    #[serde(with = "humantime_serde")]
    pub cooldown: Duration,
    /// Receive buffer per datagram.
    pub max_message_size: usize,
    /// Kernel socket receive buffer.
    pub recv_buffer_size: Option<usize>,
    /// Traps buffered between the socket and the event output.
    pub queue_capacity: usize,
    /// How long the event queue may stay full before an event is dropped.
    #[serde(with = "humantime_serde")]
    pub enqueue_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            community: vec!["public".to_string()],
            yamlmibdir: None,
            target: None,
            ecs_compatibility: EcsCompatibility::Disabled,
            cooldown: DEFAULT_COOLDOWN,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            recv_buffer_size: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            enqueue_timeout: Duration::from_secs(1),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

impl Config {
    /// Parse YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::config(e.to_string()))
    }

    /// Read and parse a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&text)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> Result<()> {
        if self.community.is_empty() {
            return Err(Error::config("community must list at least one string"));
        }
        if self.max_message_size == 0 {
            return Err(Error::config("max_message_size must be greater than zero"));
        }
        if self.queue_capacity == 0 {
            return Err(Error::config("queue_capacity must be greater than zero"));
        }
        self.bind_addr()?;
        self.target_path()?;
        Ok(())
    }

    /// Resolve `host:port`.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        if let Ok(ip) = self.host.parse::<std::net::IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| Error::config(format!("cannot resolve host {:?}: {}", self.host, e)))?
            .next()
            .ok_or_else(|| Error::config(format!("host {:?} has no addresses", self.host)))
    }

    /// Parsed `target`, if set and non-empty.
    pub fn target_path(&self) -> Result<Option<FieldPath>> {
        match self.target.as_deref() {
            None | Some("") => Ok(None),
            Some(target) => FieldPath::parse(target).map(Some),
        }
    }

    /// Listener settings; MIB modules are discovered in `yamlmibdir`.
    pub fn listener_config(&self) -> Result<ListenerConfig> {
        let mut listener = ListenerConfig::new(self.bind_addr()?).communities(&self.community);
        if let Some(dir) = &self.yamlmibdir {
            let modules = Mib::discover_modules(dir);
            listener = listener.mib(dir, modules);
        }
        listener.max_message_size = self.max_message_size;
        listener.recv_buffer_size = self.recv_buffer_size;
        Ok(listener)
    }

    /// In-process event queue bounded by `queue_capacity` that waits up to
    /// `enqueue_timeout` for room.
    pub fn queue_sink(&self) -> (QueueSink, mpsc::Receiver<Event>) {
        QueueSink::channel(self.queue_capacity.max(1), self.enqueue_timeout)
    }

    /// Event mapper for `ecs_compatibility` and `target`.
    pub fn mapper(&self) -> Result<EventMapper> {
        Ok(EventMapper::with_ecs(
            self.ecs_compatibility,
            self.target_path()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.bind_addr().unwrap(), "0.0.0.0:1062".parse().unwrap());
        assert_eq!(config.community, vec!["public"]);
        assert_eq!(config.cooldown, Duration::from_secs(5));
        config.validate().unwrap();
    }

    #[test]
    fn test_full_file() {
        let config = Config::from_yaml_str(
            "host: 127.0.0.1\n\
             port: 9162\n\
             community: private\n\
             target: \"[snmp]\"\n\
             ecs_compatibility: v1\n\
             cooldown: 250ms\n\
             enqueue_timeout: 2s\n",
        )
        .unwrap();
        assert_eq!(config.community, vec!["private"]);
        assert_eq!(config.cooldown, Duration::from_millis(250));
        assert_eq!(config.enqueue_timeout, Duration::from_secs(2));

        let listener = config.listener_config().unwrap();
        assert_eq!(listener.bind_addr, "127.0.0.1:9162".parse().unwrap());
        assert_eq!(listener.communities, vec!["private"]);

        let mapper = config.mapper().unwrap();
        assert_eq!(mapper.host_field(), &FieldPath::parse("[host][ip]").unwrap());
        assert_eq!(mapper.target(), Some(&FieldPath::key("snmp")));
    }

    #[test]
    fn test_community_list() {
        let config = Config::from_yaml_str("community: [public, ops]\n").unwrap();
        assert_eq!(config.community, vec!["public", "ops"]);

        let config = Config::from_yaml_str("community: []\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::from_yaml_str("prot: 162\n").is_err());
        assert!(Config::from_yaml_str("ecs_compatibility: v2\n").is_err());
        assert!(Config::from_yaml_str("cooldown: soon\n").is_err());
        assert!(Config::from_yaml_str("port: 70000\n").is_err());

        let config = Config::from_yaml_str("target: \"[snmp\"\n").unwrap();
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_mib_modules_discovered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("IF-MIB.yaml"), "ifIndex: 1.3.6.1.2.1.2.2.1.1\n").unwrap();
        std::fs::write(dir.path().join("SNMPv2-MIB.yaml"), "sysUpTime: 1.3.6.1.2.1.1.3\n")
            .unwrap();

        let config = Config {
            yamlmibdir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        let listener = config.listener_config().unwrap();
        assert_eq!(listener.mib_modules, vec!["IF-MIB", "SNMPv2-MIB"]);
        assert_eq!(listener.mib_dir.as_deref(), Some(dir.path()));
    }

    #[tokio::test]
    async fn test_queue_sink_uses_enqueue_timeout() {
        use crate::sink::EventSink;

        let config = Config::from_yaml_str("queue_capacity: 1\nenqueue_timeout: 10ms\n").unwrap();
        let (sink, _events) = config.queue_sink();
        sink.send(Event::new()).await.unwrap();
        assert!(matches!(
            sink.send(Event::new()).await,
            Err(Error::Enqueue { .. })
        ));
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snmptrap.yaml");
        std::fs::write(&path, "port: 2162\n").unwrap();
        assert_eq!(Config::from_yaml_file(&path).unwrap().port, 2162);

        let missing = dir.path().join("absent.yaml");
        assert!(Config::from_yaml_file(&missing).is_err());
    }
}
