use tracing::{info, instrument};

use crate::{
    config::AgentConfig,
    error::{AgentError, ResultContext},
    host::{Host, HostClient, HostNotification},
};

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// An existing app window was brought to the front
    Focused { client: String },
    /// A new window was opened on the entry document
    Opened { url: String },
    /// No app window and the host can't open one
    Nothing,
}

/// Closes the notification then focuses the first open app window, or opens
/// one if there isn't any
#[instrument(skip_all)]
pub async fn notification_click<H: Host>(
    host: &H,
    config: &AgentConfig,
    notification: H::Notification,
) -> Result<ClickOutcome, AgentError> {
    // Some browsers leave it open otherwise
    notification.close();

    let origin = host.origin();
    let clients = host.window_clients().await.context("clients::match_all")?;

    if let Some(client) = clients.iter().find(|c| c.url().contains(&origin) && c.focusable()) {
        info!("Focusing {}", client.url());
        host.focus(client).await.context("client::focus")?;
        return Ok(ClickOutcome::Focused { client: client.id() });
    }

    let url = config.entry_document.clone();
    info!("Opening {url}");
    if host.open_window(&url).await.context("clients::open_window")? {
        Ok(ClickOutcome::Opened { url })
    } else {
        Ok(ClickOutcome::Nothing)
    }
}

#[cfg(test)]
mod test {
    use futures::executor::block_on;

    use super::*;
    use crate::memory::{Effect, MemoryClient, MemoryHost, MemoryNotification};

    fn click(host: &MemoryHost) -> ClickOutcome {
        let notification = MemoryNotification::new(host, "n1");
        block_on(notification_click(host, &AgentConfig::default(), notification)).unwrap()
    }

    #[test]
    fn test_focuses_first_same_origin_window() {
        let host = MemoryHost::new("https://app.test")
            .with_client(MemoryClient::window("other", "https://elsewhere.test/"))
            .with_client(MemoryClient::window("a", "https://app.test/today"))
            .with_client(MemoryClient::window("b", "https://app.test/"));

        assert_eq!(click(&host), ClickOutcome::Focused { client: "a".into() });
        assert_eq!(
            host.effects(),
            vec![
                Effect::NotificationClosed { id: "n1".into() },
                Effect::Focused { client: "a".into() },
            ]
        );
    }

    #[test]
    fn test_opens_entry_document_when_no_window() {
        let host = MemoryHost::new("https://app.test")
            .with_client(MemoryClient::window("other", "https://elsewhere.test/"));

        assert_eq!(click(&host), ClickOutcome::Opened { url: "./index.html".into() });
        assert_eq!(
            host.effects(),
            vec![
                Effect::NotificationClosed { id: "n1".into() },
                Effect::WindowOpened { url: "./index.html".into() },
            ]
        );
    }

    #[test]
    fn test_skips_clients_that_cant_focus() {
        let host = MemoryHost::new("https://app.test")
            .with_client(MemoryClient::unfocusable("w", "https://app.test/"));

        assert_eq!(click(&host), ClickOutcome::Opened { url: "./index.html".into() });
    }

    #[test]
    fn test_nothing_when_windows_unsupported() {
        let host = MemoryHost::new("https://app.test").without_open_window();

        assert_eq!(click(&host), ClickOutcome::Nothing);
        assert_eq!(host.effects(), vec![Effect::NotificationClosed { id: "n1".into() }]);
    }
}
