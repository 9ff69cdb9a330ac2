//! Channel and runtime configuration.

use std::time::Duration;

use aryu_proto::{Resource, channel_address};

use crate::error::ConfigError;

/// Default interval between background refetches.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default bound on establishing a socket.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for one client of the realtime backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Page origin the socket address is derived from (`https://host`).
    pub origin: String,
    /// Base URL of the REST API (`https://host/api`).
    pub api_base: String,
    /// Interval of the fallback refetch while a channel is active.
    pub poll_interval: Duration,
    /// Capacity of the outgoing frame queue per connection.
    pub outgoing_capacity: usize,
    /// Per-request timeout for the HTTP path.
    pub request_timeout: Duration,
    /// Bound on a socket connect. An expired connect leaves the channel in
    /// the error state.
    pub connect_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8000".to_string(),
            api_base: "http://localhost:8000/api".to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            outgoing_capacity: 64,
            request_timeout: Duration::from_secs(15),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl ChannelConfig {
    /// Configuration for a deployment where the API lives under `/api` on
    /// the same origin as the page.
    pub fn for_origin(origin: impl Into<String>) -> Self {
        let origin = origin.into();
        let api_base = format!("{}/api", origin.trim_end_matches('/'));
        Self { origin, api_base, ..Self::default() }
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // A throwaway address surfaces origin problems before any channel opens.
        channel_address(&self.origin, &Resource::chat(0), "")?;

        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(ConfigError::ApiBase(self.api_base.clone()));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Zero { field: "poll_interval" });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Zero { field: "request_timeout" });
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::Zero { field: "connect_timeout" });
        }
        if self.outgoing_capacity == 0 {
            return Err(ConfigError::Zero { field: "outgoing_capacity" });
        }
        Ok(())
    }

    /// Socket address for a resource.
    pub fn address_for(
        &self,
        resource: &Resource,
        token: &str,
    ) -> Result<String, aryu_proto::ProtocolError> {
        channel_address(&self.origin, resource, token)
    }

    /// Absolute URL of an API path. `path` must not start with a slash.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(ChannelConfig::default().validate(), Ok(()));
        assert_eq!(ChannelConfig::default().poll_interval, Duration::from_secs(30));
    }

    #[test]
    fn for_origin_derives_api_base() {
        let config = ChannelConfig::for_origin("https://portal.aryu.in/");
        assert_eq!(config.api_base, "https://portal.aryu.in/api");
        assert_eq!(config.endpoint("/chat/4/items/"), "https://portal.aryu.in/api/chat/4/items/");
    }

    #[test]
    fn rejects_bad_values() {
        let config = ChannelConfig { origin: "gopher://x".into(), ..ChannelConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Origin(_))));

        let config = ChannelConfig { api_base: "localhost/api".into(), ..ChannelConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::ApiBase(_))));

        let config = ChannelConfig { poll_interval: Duration::ZERO, ..ChannelConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::Zero { field: "poll_interval" }));

        let config = ChannelConfig { outgoing_capacity: 0, ..ChannelConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::Zero { field: "outgoing_capacity" }));

        let config = ChannelConfig { connect_timeout: Duration::ZERO, ..ChannelConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::Zero { field: "connect_timeout" }));
    }

    #[test]
    fn address_uses_origin() {
        let config = ChannelConfig::for_origin("https://portal.aryu.in");
        assert_eq!(
            config.address_for(&Resource::notifications(9), "tok").ok().as_deref(),
            Some("wss://portal.aryu.in/ws/notifications/9/?token=tok")
        );
    }
}
