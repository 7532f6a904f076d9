use tracing::{info, instrument, warn};

use crate::{
    error::{AgentError, ResultContext},
    host::Host,
};

/// Posted by the page when the user accepts an update
pub const SKIP_WAITING: &str = "SKIP_WAITING";

#[derive(Debug, Clone, PartialEq)]
pub enum MessageOutcome {
    SkippedWaiting,
    Ignored,
}

/// Lets the page tell a waiting worker to take over straight away instead of
/// waiting for every tab to close
#[instrument(skip_all)]
pub async fn message<H: Host>(host: &H, data: Option<&str>) -> Result<MessageOutcome, AgentError> {
    match data {
        Some(SKIP_WAITING) => {
            info!("Got {SKIP_WAITING}");
            host.skip_waiting().context("sw::skip_waiting")?;
            Ok(MessageOutcome::SkippedWaiting)
        }
        other => {
            warn!("Ignoring unexpected message: {other:?}");
            Ok(MessageOutcome::Ignored)
        }
    }
}

#[cfg(test)]
mod test {
    use futures::executor::block_on;

    use super::*;
    use crate::memory::{Effect, MemoryHost};

    #[test]
    fn test_skip_waiting() {
        let host = MemoryHost::new("https://app.test");
        assert_eq!(
            block_on(message(&host, Some("SKIP_WAITING"))).unwrap(),
            MessageOutcome::SkippedWaiting
        );
        assert_eq!(host.effects(), vec![Effect::SkippedWaiting]);
    }

    #[test]
    fn test_other_messages_are_ignored() {
        let host = MemoryHost::new("https://app.test");
        for data in [None, Some("skip_waiting"), Some("")] {
            assert_eq!(block_on(message(&host, data)).unwrap(), MessageOutcome::Ignored);
        }
        assert!(host.effects().is_empty());
    }
}
