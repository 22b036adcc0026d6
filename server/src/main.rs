use donation_server::{
    campaign::Campaign,
    config::{self, load_config, Mode},
    notify::Notifier,
    router::{UpdateHandler, UpdateRouter},
    services::donation::DonationServiceImpl,
    session::SessionStore,
    telegram,
    transport::{polling, webhook},
};
use donation_storage::{
    pg::store::{PgOnDemandStore, PgTransactionalStore},
    PgDatabaseClient,
};
use log::info;
use std::{sync::Arc, time::Duration};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    info!("Loading config");
    let config = load_config()?;
    let campaign = Arc::new(Campaign::from_config(&config.campaign)?);

    // Database connection:
    info!("Connecting to database");
    let database = Arc::new(
        PgDatabaseClient::connect(&config.postgres.uri, config.postgres.max_connections).await?,
    );

    info!("Running migrations (if any)");
    database.run_migrations().await?;

    // Dependencies:
    let client = Arc::new(telegram::Client::new(&config.telegram)?);
    let notifier = Notifier::new(client.clone(), campaign.unit().clone());
    let amount_timeout = Duration::from_secs(config.telegram.amount_timeout_secs);
    let sessions = Arc::new(SessionStore::new(amount_timeout));

    // Services:
    let donation_service = DonationServiceImpl::<_, PgOnDemandStore, PgTransactionalStore, _>::new(
        database,
        notifier.clone(),
        campaign,
        sessions,
        config.telegram.admin_id,
    );
    let handler: Arc<dyn UpdateHandler> =
        Arc::new(UpdateRouter::new(Arc::new(donation_service), notifier));

    match config.mode {
        Mode::Polling => {
            info!("Starting bot in polling mode");
            polling::run(client, handler, config.telegram.poll_timeout_secs).await?;
        }
        Mode::Webhook => {
            let webhook_config = config.webhook.ok_or(config::Error::MissingWebhook)?;
            info!(
                "Starting bot in webhook mode on port {}",
                webhook_config.port
            );
            webhook::serve(client, handler, &webhook_config).await?;
        }
    }

    Ok(())
}
