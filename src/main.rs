//! OpenSASE Orders - order and payment lifecycle service

use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use opensase_orders::api::{self, AppState};
use opensase_orders::config::{Config, IdentitySource};
use opensase_orders::identity::{IdentityService, RemoteIdentity, StaticIdentity};
use opensase_orders::notify::{LogNotifier, NatsNotifier, Notifier};
use opensase_orders::payment::{PaymentIntentAdapter, StripeGateway};
use opensase_orders::service::OrderLifecycleService;
use opensase_orders::store::PgOrderStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = Config::from_env()?;

    let db = PgPoolOptions::new().max_connections(10).connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    let store = Arc::new(PgOrderStore::new(db));

    let notifier: Arc<dyn Notifier> = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Arc::new(NatsNotifier::new(client, config.nats_subject_prefix.clone())),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, order events will only be logged");
                Arc::new(LogNotifier)
            }
        },
        None => Arc::new(LogNotifier),
    };

    let identity: Arc<dyn IdentityService> = match &config.identity {
        IdentitySource::Remote(url) => Arc::new(RemoteIdentity::new(url.clone(), config.stripe.timeout)?),
        IdentitySource::Static(tokens) => Arc::new(StaticIdentity::parse(tokens).map_err(anyhow::Error::msg)?),
    };

    let gateway = Arc::new(StripeGateway::new(config.stripe.clone())?);
    let payments = Arc::new(PaymentIntentAdapter::new(store.clone(), gateway, config.payment_currency.clone()));
    let orders = Arc::new(OrderLifecycleService::new(store, payments, notifier));
    let app = api::router(AppState { orders, identity });

    tracing::info!("🚀 OpenSASE Orders listening on 0.0.0.0:{}", config.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?, app).await?;
    Ok(())
}
