use futures::future::try_join_all;
use tracing::{info, instrument};

use crate::{
    config::AgentConfig,
    error::{AgentError, ResultContext},
    host::Host,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActivateOutcome {
    /// Outdated cache generations that were removed
    pub deleted: Vec<String>,
}

/// Deletes every cache generation other than the current one
///
/// The deletions run concurrently and activation completes once they all have.
/// Any failed deletion fails the activation
#[instrument(skip_all, fields(cache = %config.cache_name))]
pub async fn activate<H: Host>(
    host: &H,
    config: &AgentConfig,
) -> Result<ActivateOutcome, AgentError> {
    let names = host.cache_names().await.context("caches::keys")?;

    let outdated = names.into_iter().filter(|name| *name != config.cache_name);

    let deleted = try_join_all(outdated.map(|name| async move {
        info!("Deleting old cache: {name}");
        host.cache_delete(&name)
            .await
            .with_context(|| format!("caches::delete:: {name}"))?;
        Ok::<_, AgentError>(name)
    }))
    .await?;

    Ok(ActivateOutcome { deleted })
}
