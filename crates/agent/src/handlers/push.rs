use tracing::{error, info, instrument};

use crate::{
    config::AgentConfig,
    error::{AgentError, ResultContext},
    host::Host,
    model::{Notification, PushPayload},
};

/// Shows a notification built from the push payload
///
/// A payload that isn't json aborts without showing anything
#[instrument(skip_all, fields(has_data = data.is_some()))]
pub async fn push<H: Host>(
    host: &H,
    config: &AgentConfig,
    data: Option<&str>,
) -> Result<Notification, AgentError> {
    let payload = PushPayload::parse(data).inspect_err(|e| error!("Dropping push: {e}"))?;
    let notification = payload.into_notification(&config.notification);

    info!("Showing notification: {}", notification.title);
    host.show_notification(&notification.title, &notification.options)
        .await
        .context("registration::show_notification")?;

    Ok(notification)
}
