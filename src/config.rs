use anyhow::{Context, Result};
use mongodb::options::{ConnectionString, HostInfo, ServerAddress};
use std::env;
use std::time::Duration;

pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017/wikinitt";
pub const DEFAULT_DATABASE_NAME: &str = "wikinitt";
pub const DEFAULT_CONTAINER_HOSTS: &[&str] = &["mongodb"];
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct Config {
    /// Connection string as configured; host rewriting happens on the parsed options
    pub mongodb_uri: String,
    /// Seed list after container hosts have been rewritten; empty for SRV URIs
    pub hosts: Vec<ServerAddress>,
    pub database_name: String,
    pub container_hosts: Vec<String>,
    pub connect_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let container_hosts: Vec<String> = match non_blank("MONGODB_CONTAINER_HOSTS") {
            Some(hosts) => hosts
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            None => DEFAULT_CONTAINER_HOSTS.iter().map(|s| s.to_string()).collect(),
        };

        let mongodb_uri = non_blank("MONGODB_URI")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| DEFAULT_MONGODB_URI.to_string());

        let connection_string = ConnectionString::parse(&mongodb_uri)
            .context("MONGODB_URI is not a valid MongoDB connection string")?;
        let mut hosts = match connection_string.host_info {
            HostInfo::HostIdentifiers(hosts) => hosts,
            _ => Vec::new(),
        };
        rewrite_container_hosts(&mut hosts, &container_hosts);

        // The URI path names the auth database, not the content database.
        let database_name = non_blank("MONGODB_DATABASE")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| DEFAULT_DATABASE_NAME.to_string());

        let connect_timeout_secs = match non_blank("MONGODB_CONNECT_TIMEOUT_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .context("MONGODB_CONNECT_TIMEOUT_SECS must be a number of seconds")?,
            None => DEFAULT_CONNECT_TIMEOUT_SECS,
        };

        Ok(Config {
            mongodb_uri,
            hosts,
            database_name,
            container_hosts,
            connect_timeout: Duration::from_secs(connect_timeout_secs),
        })
    }

    /// Comma-separated seed list for log lines; credentials never appear here.
    pub fn display_hosts(&self) -> String {
        if self.hosts.is_empty() {
            return "<srv record>".to_string();
        }
        self.hosts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Points every TCP host that names a container service at `localhost`,
/// keeping its port.
pub fn rewrite_container_hosts(hosts: &mut [ServerAddress], container_hosts: &[String]) {
    for address in hosts.iter_mut() {
        if let ServerAddress::Tcp { host, .. } = address {
            if container_hosts.iter().any(|c| c.eq_ignore_ascii_case(host)) {
                *host = "localhost".to_string();
            }
        }
    }
}
