use auralink::alert::{LogMailer, SensorAlerts};
use auralink::broadcast::{Broadcast, Hub};
use auralink::config::Config;
use auralink::ingest::Ingestor;
use auralink::publisher::Publisher;
use auralink::quote::QuoteService;
use auralink::storage::Storage;
use auralink::triage::Triage;
use auralink::{router, AppState, ErasedError, Result};
use transport::{connect_mqtt, Topic};

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::StreamExt;
use log::{error, info, warn};
use paho_mqtt::{AsyncClient as MqClient, QOS_1};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tokio::{task, time};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

#[tokio::main]
async fn main() -> std::result::Result<(), ErasedError> {
    pretty_env_logger::init_timed();

    info!("auralink version {VERSION}");

    let config = Config::from_env()?;

    let mqtt_client = connect_mqtt(
        config.mqtt_address.clone(),
        config.credentials(),
        &config.mqtt_client_id,
    )
    .await?;
    info!("connected mqtt at {}", config.mqtt_address);

    let storage = Arc::new(Storage::new());
    let hub = Hub::new();
    let publisher: Arc<dyn Publisher> = Arc::new(mqtt_client.clone());

    let ingestor = Ingestor::new(storage.clone(), Arc::new(hub.clone()));
    let alerts = Arc::new(SensorAlerts::new(
        Arc::new(LogMailer),
        config.alert_recipient.clone(),
    ));
    let quotes = Arc::new(QuoteService::new(None, config.quote_generation_enabled));
    let triage = Arc::new(Triage::new(None, config.ai_enabled));

    let state = AppState {
        storage: storage.clone(),
        alerts: alerts.clone(),
        quotes: quotes.clone(),
        triage,
        publisher: publisher.clone(),
    };

    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        result = task::spawn(subscribe_sensors(mqtt_client, ingestor)) => {
            error!("sensor subscription stopped: {:?}", result?);
        },
        result = task::spawn(listen_web(config.http_port, state)) => {
            error!("web server stopped: {:?}", result?);
        },
        _ = task::spawn(watch_alerts(hub.subscribe(), alerts.clone())) => {
            warn!("alert watcher stopped");
        },
        _ = task::spawn(schedule_quotes(quotes, storage.clone(), publisher, config.quote_interval)) => {},
        _ = task::spawn(schedule_daily_summary(alerts, storage)) => {},
        _ = sigterm.recv() => { info!("got SIGTERM, exiting...") },
    };

    Ok(())
}

async fn subscribe_sensors(mut mqtt: MqClient, ingestor: Ingestor) -> Result<()> {
    let mut stream = mqtt.get_stream(None);

    let topics = Topic::inbound().map(|topic| topic.to_string());
    let qos = [QOS_1; 2];

    mqtt.subscribe_many(&topics, &qos).await?;
    info!("Subscribed to topics: {:?}", topics);

    while let Some(msg_opt) = stream.next().await {
        if let Some(msg) = msg_opt {
            ingestor.on_message(msg.topic(), msg.payload()).await;
        } else {
            error!("Lost MQTT connection. Attempting reconnect.");

            while let Err(err) = mqtt.reconnect().await {
                error!("Error MQTT reconnecting: {}", err);
                time::sleep(Duration::from_millis(1000)).await;
            }

            mqtt.subscribe_many(&topics, &qos).await?;
            info!("Resubscribed to topics: {:?}", topics);
        }
    }

    Ok(())
}

async fn listen_web(port: u16, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Listening http://{}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;

    Ok(())
}

async fn watch_alerts(mut receiver: Receiver<Broadcast>, alerts: Arc<SensorAlerts>) {
    loop {
        match receiver.recv().await {
            Ok(Broadcast::Sensors(reading)) => {
                alerts.process(&reading).await;
            }
            Ok(Broadcast::Status(_)) => (),
            Err(RecvError::Lagged(skipped)) => {
                warn!("alert watcher skipped {skipped} broadcasts")
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn schedule_quotes(
    quotes: Arc<QuoteService>,
    storage: Arc<Storage>,
    publisher: Arc<dyn Publisher>,
    period: Duration,
) {
    if !quotes.is_enabled() {
        info!("quote generation is disabled");
        return std::future::pending().await;
    }

    let mut timer = time::interval(period);
    timer.tick().await;

    loop {
        timer.tick().await;
        info!("starting scheduled quote generation");

        quotes.round(&storage, publisher.as_ref()).await;
    }
}

async fn schedule_daily_summary(alerts: Arc<SensorAlerts>, storage: Arc<Storage>) {
    let mut timer = time::interval(DAY);
    timer.tick().await;

    loop {
        timer.tick().await;

        if let Err(err) = alerts.send_daily_summary(&storage).await {
            error!("unable to send daily summary: {err}");
        }
    }
}
