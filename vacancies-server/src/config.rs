//! Command line and environment configuration
//!
//! Environment variable names match the ones existing deployments already
//! set (`URL_REGISTRY_SERVICE`, `SECRET_KEY`, `SINGER_DEBUG`).

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use vacancies_core::auth::{AuthorityGate, GateConfig, TokenCache, TokenResolver, TokenSource};
use vacancies_core::TenantId;
use vacancies_registry::RegistryClient;

#[derive(Parser, Debug)]
#[command(
    name = "vacancies-server",
    version,
    about = "Signature gate for the vacancies service"
)]
pub struct Cli {
    #[command(flatten)]
    pub logging: LoggingArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP service
    Serve(ServeArgs),
    /// Print the canonical message and signature for a request
    Sign(SignArgs),
    /// Print a freshly generated API token
    GenToken,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Args, Debug, Clone)]
pub struct LoggingArgs {
    /// Log filter; RUST_LOG takes precedence
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Registry lookup prefix; the project id is appended verbatim.
    /// Empty disables remote lookups, so every uncached project is rejected.
    #[arg(long, env = "URL_REGISTRY_SERVICE", default_value = "")]
    pub registry_url: String,

    #[arg(long, env = "REGISTRY_TIMEOUT_SECS", default_value_t = 5)]
    pub registry_timeout_secs: u64,

    /// Server-side salt appended to every canonical message
    #[arg(long, env = "SECRET_KEY", default_value = "", hide_env_values = true)]
    pub secret_key: String,

    /// Echo signing inputs on rejection (requires the signature-debug build)
    #[arg(long = "signer-debug", env = "SINGER_DEBUG")]
    pub signer_debug: bool,
}

impl ServeArgs {
    pub fn gate_config(&self) -> GateConfig {
        GateConfig {
            secret_salt: Some(self.secret_key.clone()).filter(|salt| !salt.is_empty()),
            debug: self.signer_debug,
            ..GateConfig::default()
        }
    }

    pub fn registry_timeout(&self) -> Duration {
        Duration::from_secs(self.registry_timeout_secs)
    }

    /// Configured Registry prefix; blank counts as unset
    pub fn registry_url(&self) -> Option<&str> {
        Some(self.registry_url.trim()).filter(|url| !url.is_empty())
    }

    /// Registry client, or `None` when no URL is configured
    pub fn registry(&self) -> anyhow::Result<Option<RegistryClient>> {
        let Some(url) = self.registry_url() else {
            return Ok(None);
        };
        let client = RegistryClient::new(url, self.registry_timeout())?;
        Ok(Some(client))
    }

    /// Wire the gate: a fresh token cache in front of the Registry
    pub fn build_gate(&self) -> anyhow::Result<AuthorityGate> {
        let source = self
            .registry()?
            .map(|client| Arc::new(client) as Arc<dyn TokenSource>);
        if source.is_none() {
            warn!("URL_REGISTRY_SERVICE is not set; every signed request will be rejected");
        }

        let resolver = TokenResolver::new(Arc::new(TokenCache::new()), source);
        Ok(AuthorityGate::new(resolver, self.gate_config()))
    }
}

#[derive(Args, Debug, Clone)]
pub struct SignArgs {
    #[arg(long)]
    pub project_id: TenantId,

    #[arg(long, env = "API_TOKEN", hide_env_values = true)]
    pub api_token: String,

    /// Operation label, e.g. "vacancies"
    #[arg(long, default_value = "vacancies")]
    pub service: String,

    #[arg(long, default_value = "")]
    pub items_id: String,

    /// Unix timestamp to sign; see --now
    #[arg(long, default_value = "", conflicts_with = "now")]
    pub time: String,

    /// Sign with the current time as timestamp
    #[arg(long)]
    pub now: bool,

    #[arg(long, env = "SECRET_KEY", default_value = "", hide_env_values = true)]
    pub secret_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["vacancies-server", "serve"]).unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.registry_timeout(), Duration::from_secs(5));
        assert_eq!(args.gate_config().replay_window_secs, 180);
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::try_parse_from([
            "vacancies-server",
            "--log-format",
            "json",
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--registry-url",
            "http://registry.local/api/v1/projects/",
            "--secret-key",
            "salt",
            "--signer-debug",
        ])
        .unwrap();
        assert_eq!(cli.logging.log_format, LogFormat::Json);

        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.bind.port(), 9000);
        let config = args.gate_config();
        assert_eq!(config.salt(), Some("salt"));
        assert!(config.debug);
        assert!(args.registry().unwrap().is_some());
    }

    #[test]
    fn test_empty_secret_key_means_no_salt() {
        let args = ServeArgs {
            bind: "127.0.0.1:0".parse().unwrap(),
            registry_url: String::new(),
            registry_timeout_secs: 5,
            secret_key: String::new(),
            signer_debug: false,
        };
        assert_eq!(args.gate_config().secret_salt, None);
        assert!(args.registry().unwrap().is_none());
    }

    #[test]
    fn test_blank_registry_url_is_unset() {
        let mut args = ServeArgs {
            bind: "127.0.0.1:0".parse().unwrap(),
            registry_url: "   ".to_string(),
            registry_timeout_secs: 5,
            secret_key: String::new(),
            signer_debug: false,
        };
        assert_eq!(args.registry_url(), None);
        assert!(args.registry().unwrap().is_none());

        args.registry_url = " http://registry.local/api/v1/projects/ ".to_string();
        assert_eq!(
            args.registry_url(),
            Some("http://registry.local/api/v1/projects/")
        );
        assert!(args.registry().unwrap().is_some());
    }

    #[test]
    fn test_sign_requires_valid_project_id() {
        let parsed = Cli::try_parse_from([
            "vacancies-server",
            "sign",
            "--project-id",
            "nope",
            "--api-token",
            "t",
        ]);
        assert!(parsed.is_err());
    }
}
