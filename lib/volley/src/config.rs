//! Transport configuration types.

use std::time::Duration;

/// Connection-level settings for the default hyper transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// TCP connect (dial) timeout.
    pub connect_timeout: Duration,
    /// TCP keep-alive interval; `None` disables keep-alive probes.
    pub keep_alive: Option<Duration>,
    /// Maximum idle connections kept per host.
    pub pool_idle_per_host: usize,
    /// How long an idle connection stays in the pool.
    pub pool_idle_timeout: Duration,
    /// Upper bound on establishing a connection, dial and TLS handshake included.
    pub handshake_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            keep_alive: Some(Duration::from_secs(30)),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            handshake_timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::default()
    }
}

/// Builder for [`TransportConfig`].
#[derive(Debug, Clone, Default)]
pub struct TransportConfigBuilder {
    connect_timeout: Option<Duration>,
    keep_alive: Option<Option<Duration>>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
    handshake_timeout: Option<Duration>,
}

impl TransportConfigBuilder {
    /// Set the TCP connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the TCP keep-alive interval.
    #[must_use]
    pub const fn keep_alive(mut self, interval: Duration) -> Self {
        self.keep_alive = Some(Some(interval));
        self
    }

    /// Disable TCP keep-alive probes.
    #[must_use]
    pub const fn no_keep_alive(mut self) -> Self {
        self.keep_alive = Some(None);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Set the connection establishment timeout (dial + TLS handshake).
    #[must_use]
    pub const fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = Some(timeout);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> TransportConfig {
        let defaults = TransportConfig::default();
        TransportConfig {
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            keep_alive: self.keep_alive.unwrap_or(defaults.keep_alive),
            pool_idle_per_host: self
                .pool_idle_per_host
                .unwrap_or(defaults.pool_idle_per_host),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(defaults.pool_idle_timeout),
            handshake_timeout: self.handshake_timeout.unwrap_or(defaults.handshake_timeout),
        }
    }
}
