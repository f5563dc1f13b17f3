use std::collections::HashMap;
use std::sync::Arc;

use explorer_governance::{GovernanceEngine, Sources, TallyConfig};
use explorer_types::Network;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::cache::ResponseCache;
use crate::error::ApiError;

/// Shared handler state: one engine per served network plus the response
/// cache.
#[derive(Clone)]
pub struct AppState {
    engines: Arc<HashMap<Network, GovernanceEngine>>,
    pub cache: Arc<ResponseCache>,
    /// Cancelled on shutdown; every request runs under a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new<I>(engines: I, cache: ResponseCache) -> Self
    where
        I: IntoIterator<Item = GovernanceEngine>,
    {
        let engines = engines.into_iter().map(|e| (e.network(), e)).collect();
        Self {
            engines: Arc::new(engines),
            cache: Arc::new(cache),
            shutdown: CancellationToken::new(),
        }
    }

    /// Build an engine for each network. A network whose parameters are
    /// missing or invalid is logged and left unserved.
    pub async fn connect(
        networks: &[Network],
        sources: Sources,
        config: TallyConfig,
        cache: ResponseCache,
    ) -> Self {
        let mut engines = Vec::with_capacity(networks.len());
        for &network in networks {
            match GovernanceEngine::connect(network, sources.clone(), config).await {
                Ok(engine) => engines.push(engine),
                Err(e) => error!("Not serving {}: {}", network, e),
            }
        }
        info!("Serving {} of {} networks", engines.len(), networks.len());
        Self::new(engines, cache)
    }

    pub fn engine(&self, network: Network) -> Result<&GovernanceEngine, ApiError> {
        self.engines
            .get(&network)
            .ok_or(ApiError::NetworkUnavailable(network))
    }

    pub fn networks(&self) -> Vec<Network> {
        let mut networks: Vec<_> = self.engines.keys().copied().collect();
        networks.sort();
        networks
    }
}
