use crate::{router::UpdateHandler, telegram::Client, transport::Error};
use log::{info, warn};
use std::{sync::Arc, time::Duration};

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Long-polls `getUpdates` until Ctrl-C.
///
/// Updates of one batch are handled in order, so a donor's amount is never
/// processed ahead of the button press that asked for it.
pub async fn run(
    client: Arc<Client>,
    handler: Arc<dyn UpdateHandler>,
    timeout_secs: u64,
) -> Result<(), Error> {
    // getUpdates is refused while a webhook is registered.
    client.delete_webhook().await?;
    info!("Polling for updates");

    let mut offset = None;
    loop {
        let result = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
            result = client.get_updates(offset, timeout_secs) => result,
        };

        match result {
            Ok(updates) => {
                for update in updates {
                    offset = Some(update.update_id + 1);
                    handler.handle_update(update).await;
                }
            }
            Err(e) => {
                warn!(
                    "Failed to fetch updates, retrying in {:?}: {}",
                    RETRY_DELAY, e
                );
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
}
