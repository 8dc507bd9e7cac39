//! Root application handle: the explicit, non-global service bundle every
//! HTTP route handler closes over (Design Notes §9 — "ambient singletons").

use std::sync::Arc;

use drp_anchor::{AnchorService, DigestLedger, Ledger};
use drp_audit::{AuditEvent, AuditLog, EventType, Level};
use drp_consent::ConsentService;
use drp_content::{ContentStore, HttpContentStore, InMemoryContentStore};
use drp_core::DrpResult;
use drp_crypto::KeyVault;
use drp_elders::ElderQuorum;
use drp_index::{MetadataIndex, SledMetadataIndex};
use drp_pipeline::{ReadApi, SubmissionPipeline};
use tracing::info;

use crate::config::Args;

/// Everything a route handler needs, passed explicitly rather than reached
/// for through a global.
pub struct AppState {
    pub pipeline: SubmissionPipeline,
    pub read_api: ReadApi,
    pub consent: Arc<ConsentService>,
    pub index: Arc<dyn MetadataIndex>,
    pub content: Arc<dyn ContentStore>,
    pub elders: Arc<ElderQuorum>,
    pub ledger: Arc<dyn Ledger>,
    pub audit: Arc<AuditLog>,
}

impl AppState {
    /// Builds every component from `args`, choosing the production backend
    /// for the Content Store and Metadata Index when the corresponding
    /// environment variable is set, and the in-memory fake otherwise
    /// (Design Notes §9 — "optional/mock backends").
    pub async fn build(args: &Args) -> DrpResult<Arc<Self>> {
        std::fs::create_dir_all(&args.data_dir)
            .map_err(|e| drp_core::DrpError::Internal(format!("creating data dir: {e}")))?;
        let paths = args.paths();

        let vault = Arc::new(KeyVault::open(&paths.master_key_file)?);
        let consent = Arc::new(ConsentService::open(&paths.consent_db_file, &paths.consent_private_key_file)?);
        let elders = Arc::new(ElderQuorum::open(&paths.elder_keys_file, args.elder_threshold, args.elder_count)?);
        let audit = Arc::new(AuditLog::open(&paths.audit_log_dir)?);

        let content: Arc<dyn ContentStore> = match &args.ipfs_url {
            Some(url) => {
                info!(%url, "content store: HTTP backend");
                Arc::new(HttpContentStore::new(url.clone())?)
            }
            None => {
                info!("content store: in-memory backend (IPFS_URL not set)");
                Arc::new(InMemoryContentStore::new())
            }
        };

        // No ScyllaDB client ships in the core (§1 out-of-scope: third-party
        // transport libraries for external backends); the embedded
        // wide-column-shaped store is the production implementation regardless
        // of whether SCYLLA_HOSTS is configured.
        if let Some(hosts) = &args.scylla_hosts {
            info!(hosts = %hosts.join(","), "SCYLLA_HOSTS set but no wide-column client is wired into the core; using embedded store");
        }
        let index: Arc<dyn MetadataIndex> = Arc::new(SledMetadataIndex::open(args.data_dir.join("index"))?);

        let ledger: Arc<dyn Ledger> = Arc::new(DigestLedger::new());
        let anchor = Arc::new(AnchorService::new(elders.clone(), ledger.clone(), index.clone()));

        let pipeline = SubmissionPipeline::new(
            consent.clone(),
            vault,
            content.clone(),
            index.clone(),
            anchor.clone(),
            audit.clone(),
        );
        let read_api = ReadApi::new(index.clone(), anchor);

        audit
            .log(AuditEvent::new(EventType::SystemStartup, Level::Info, "drp-gateway starting up"))
            .await
            .ok();

        Ok(Arc::new(Self {
            pipeline,
            read_api,
            consent,
            index,
            content,
            elders,
            ledger,
            audit,
        }))
    }

    pub async fn shutdown(&self) {
        self.audit
            .log(AuditEvent::new(EventType::SystemShutdown, Level::Info, "drp-gateway shutting down"))
            .await
            .ok();
    }
}
