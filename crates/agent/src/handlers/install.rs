use tracing::{error, info, instrument};

use crate::{
    config::AgentConfig,
    error::{AgentError, ResultContext},
    host::Host,
};

#[derive(Debug, Clone, PartialEq)]
pub enum InstallOutcome {
    /// Every asset was stored
    Cached { count: usize },
    /// The batch failed so the cache may be missing some or all assets. The
    /// worker still installs
    Failed { reason: AgentError },
}

async fn precache<H: Host>(host: &H, config: &AgentConfig) -> Result<usize, AgentError> {
    let requests = config
        .assets
        .iter()
        .map(|url| host.request(url).with_context(|| format!("request::new:: {url}")))
        .collect::<Result<Vec<_>, _>>()?;
    let count = requests.len();

    host.cache_add_all(&config.cache_name, requests)
        .await
        .with_context(|| format!("cache::add_all:: {}", config.cache_name))?;

    Ok(count)
}

/// Precaches the asset manifest into the current cache generation
///
/// Never fails. A failed precache is logged and reported in the outcome
#[instrument(skip_all, fields(cache = %config.cache_name))]
pub async fn install<H: Host>(host: &H, config: &AgentConfig) -> InstallOutcome {
    info!("Opening cache and precaching {} urls", config.assets.len());

    match precache(host, config).await {
        Ok(count) => {
            info!("Install successful, cached {count} urls");
            InstallOutcome::Cached { count }
        }
        Err(reason) => {
            error!("Precache failed: {reason}");
            InstallOutcome::Failed { reason }
        }
    }
}
