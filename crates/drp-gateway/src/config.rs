//! `drp-gateway` startup configuration: a `clap`-derived `Args` struct with
//! `env` fallbacks for every recognized environment variable.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "drp-gateway",
    version,
    about = "DRP gateway — proof submission, Elder-quorum anchoring, and read API"
)]
pub struct Args {
    /// Root directory for persisted state (keystores, consent DB, audit log,
    /// embedded index) when a more specific path is not given.
    #[arg(long, env = "DRP_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,

    /// Listen address for the HTTP surface.
    #[arg(long, env = "DRP_HTTP_ADDR", default_value = "127.0.0.1:8080")]
    pub http_addr: std::net::SocketAddr,

    /// Path for the KeyVault master key (§6).
    #[arg(long, env = "MASTER_KEY_FILE")]
    pub master_key_file: Option<PathBuf>,

    /// Path for the Elder keys file (§6).
    #[arg(long, env = "ELDER_KEYS_FILE")]
    pub elder_keys_file: Option<PathBuf>,

    /// Path for the persisted consent token table (§6).
    #[arg(long, env = "CONSENT_DB_FILE")]
    pub consent_db_file: Option<PathBuf>,

    /// Path for the Consent Service's long-term signing key (§6).
    #[arg(long, env = "CONSENT_PRIVATE_KEY_FILE")]
    pub consent_private_key_file: Option<PathBuf>,

    /// Directory for the audit log and mirrored error log (§6).
    #[arg(long, env = "AUDIT_LOG_DIR")]
    pub audit_log_dir: Option<PathBuf>,

    /// Content-addressed store endpoint; falls back to the in-memory fake
    /// when unset (§4.4, §9 Design Notes).
    #[arg(long, env = "IPFS_URL")]
    pub ipfs_url: Option<String>,

    /// Metadata-index contact points, comma-separated (§6). No wide-column
    /// client ships in the core; recorded but the embedded store is always
    /// used in its place.
    #[arg(long, env = "SCYLLA_HOSTS", value_delimiter = ',')]
    pub scylla_hosts: Option<Vec<String>>,

    /// Ledger RPC endpoint (§6). The only `Ledger` shipped here is the
    /// deterministic digest; real chain submission is out of scope of the
    /// core (§1, §9 Design Notes).
    #[arg(long, env = "DRP_RPC_URL")]
    pub drp_rpc_url: Option<String>,

    /// Ledger contract address (§6). See `drp_rpc_url`.
    #[arg(long, env = "DRP_CONTRACT_ADDRESS")]
    pub drp_contract_address: Option<String>,

    /// Ledger submission identity (§6). See `drp_rpc_url`.
    #[arg(long, env = "DRP_PRIVATE_KEY")]
    pub drp_private_key: Option<String>,

    /// Total number of Elders to bootstrap on first run.
    #[arg(long, env = "DRP_ELDER_COUNT", default_value_t = 3)]
    pub elder_count: usize,

    /// Count threshold `t` for Elder quorum signing/verification.
    #[arg(long, env = "DRP_ELDER_THRESHOLD", default_value_t = 2)]
    pub elder_threshold: usize,
}

/// Persisted-state paths (§6), resolved against `data_dir` wherever the
/// caller didn't supply a more specific one.
pub struct Paths {
    pub master_key_file: PathBuf,
    pub elder_keys_file: PathBuf,
    pub consent_db_file: PathBuf,
    pub consent_private_key_file: PathBuf,
    pub audit_log_dir: PathBuf,
}

impl Args {
    pub fn paths(&self) -> Paths {
        Paths {
            master_key_file: self.master_key_file.clone().unwrap_or_else(|| self.data_dir.join("master_key.key")),
            elder_keys_file: self.elder_keys_file.clone().unwrap_or_else(|| self.data_dir.join("elder_keys.json")),
            consent_db_file: self
                .consent_db_file
                .clone()
                .unwrap_or_else(|| self.data_dir.join("consent_tokens.json")),
            consent_private_key_file: self
                .consent_private_key_file
                .clone()
                .unwrap_or_else(|| self.data_dir.join("consent_key.raw")),
            audit_log_dir: self.audit_log_dir.clone().unwrap_or_else(|| self.data_dir.clone()),
        }
    }
}
