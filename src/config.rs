//! Server and engine configuration, read from flags or `KOKORO_*` variables.

use crate::pipeline::{PipelineLoader, StubLoader};
use crate::remote::{RemoteConfig, RemoteLoader};
use clap::{Args, ValueEnum};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Which implementation answers pipeline calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// External Kokoro service over HTTP
    Remote,
    /// Silent placeholder audio, no engine required
    Stub,
}

#[derive(Args, Debug, Clone)]
pub struct EngineConfig {
    /// Pipeline backend
    #[arg(long, env = "KOKORO_BACKEND", value_enum, default_value = "stub")]
    pub backend: BackendKind,

    /// Base URL of the Kokoro engine (remote backend)
    #[arg(long, env = "KOKORO_ENGINE_URL", default_value = "http://127.0.0.1:8880")]
    pub engine_url: String,

    /// Model name sent to the engine (remote backend)
    #[arg(long, env = "KOKORO_ENGINE_MODEL", default_value = "kokoro")]
    pub engine_model: String,

    /// Per-call engine timeout in seconds (remote backend)
    #[arg(long, env = "KOKORO_ENGINE_TIMEOUT_SECS", default_value = "120")]
    pub engine_timeout_secs: u64,
}

impl EngineConfig {
    pub fn loader(&self) -> Arc<dyn PipelineLoader> {
        match self.backend {
            BackendKind::Stub => Arc::new(StubLoader),
            BackendKind::Remote => Arc::new(RemoteLoader::new(RemoteConfig {
                base_url: self.engine_url.clone(),
                model: self.engine_model.clone(),
                timeout: Duration::from_secs(self.engine_timeout_secs),
            })),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "KOKORO_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "KOKORO_PORT", default_value = "8000")]
    pub port: u16,

    /// Maximum synthesis calls running at once
    #[arg(long, env = "KOKORO_MAX_CONNECTIONS", default_value = "50")]
    pub max_connections: usize,

    /// Seconds a request may wait for and run synthesis
    #[arg(long, env = "KOKORO_REQUEST_TIMEOUT_SECS", default_value = "120")]
    pub request_timeout_secs: u64,

    /// Languages whose pipelines are built at startup, e.g. `a,j`
    #[arg(long, env = "KOKORO_PRELOAD", value_delimiter = ',')]
    pub preload: Vec<String>,

    #[command(flatten)]
    pub engine: EngineConfig,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|err| anyhow::anyhow!("Invalid listen address {}:{}: {}", self.host, self.port, err))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        server: ServerConfig,
    }

    #[test]
    fn defaults_match_the_production_launcher() {
        let harness = Harness::try_parse_from(["kokoro-serve"]).unwrap();
        let server = harness.server;
        assert_eq!(server.port, 8000);
        assert_eq!(server.max_connections, 50);
        assert_eq!(server.engine.backend, BackendKind::Stub);
        assert_eq!(server.socket_addr().unwrap().to_string(), "0.0.0.0:8000");
        assert!(server.preload.is_empty());
    }

    #[test]
    fn parses_backend_and_preload_list() {
        let harness = Harness::try_parse_from([
            "kokoro-serve",
            "--backend",
            "remote",
            "--engine-url",
            "http://engine:8880",
            "--preload",
            "a,j",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
        ])
        .unwrap();
        let server = harness.server;
        assert_eq!(server.engine.backend, BackendKind::Remote);
        assert_eq!(server.engine.engine_url, "http://engine:8880");
        assert_eq!(server.preload, vec!["a", "j"]);
        assert_eq!(server.socket_addr().unwrap().port(), 9000);
    }

    #[test]
    fn invalid_host_is_reported() {
        let harness =
            Harness::try_parse_from(["kokoro-serve", "--host", "not a host"]).unwrap();
        assert!(harness.server.socket_addr().is_err());
    }
}
