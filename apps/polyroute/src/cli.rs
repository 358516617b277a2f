//! CLI flags, each falling back to an environment variable (§4.11). Final
//! precedence against a persisted `GlobalConfig` row is resolved in
//! `bootstrap`.

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "polyroute", version, about = "Multi-upstream AI inference proxy")]
pub struct CliArgs {
    /// Database DSN (required to bootstrap the rest of config).
    #[arg(long, env = "POLYROUTE_DSN")]
    pub dsn: Option<String>,

    /// Bind host.
    #[arg(long, env = "POLYROUTE_HOST")]
    pub host: Option<String>,

    /// Bind port.
    #[arg(long, env = "POLYROUTE_PORT")]
    pub port: Option<String>,

    /// Admin token (plaintext). Stored as a hash in the DB and in memory.
    #[arg(long, env = "POLYROUTE_ADMIN_TOKEN")]
    pub admin_token: Option<String>,

    /// Optional outbound proxy for upstream requests.
    #[arg(long, env = "POLYROUTE_PROXY")]
    pub proxy: Option<String>,

    /// Enable force-project-binding (new sessions wait for a UI bind).
    #[arg(long, env = "POLYROUTE_FORCE_PROJECT_BINDING")]
    pub force_project_binding: Option<String>,

    /// Force-project-binding wait timeout, seconds (5-300, default 30).
    #[arg(long, env = "POLYROUTE_FORCE_PROJECT_TIMEOUT")]
    pub force_project_timeout: Option<String>,

    /// Redact sensitive headers/body fields in emitted events.
    #[arg(long, env = "POLYROUTE_EVENT_REDACT_SENSITIVE")]
    pub event_redact_sensitive: Option<String>,

    /// Data directory used to derive a default sqlite DSN when `--dsn`
    /// and `POLYROUTE_DSN` are both unset.
    #[arg(long, env = "POLYROUTE_DATA_DIR", default_value = "")]
    pub data_dir: String,
}
