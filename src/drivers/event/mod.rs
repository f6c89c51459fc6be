use anyhow::{bail, Result};
use rdkafka::{
    consumer::{CommitMode, Consumer, StreamConsumer},
    error::KafkaError,
    message::BorrowedMessage,
    ClientConfig, Message,
};
use std::{collections::HashMap, path::Path, sync::Arc};
use tracing::{error, info};

use crate::{
    domain::{
        archiver::{ArchiverConfig, Dispatcher},
        error::Error,
        event::{self, DomainEventHandler, Event},
    },
    driven::{
        cache::{user::SqliteUserDrivenCache, SqliteCache},
        celery::CeleryAmqpQueue,
    },
};

pub async fn subscribe(config: EventConfig) -> Result<()> {
    let sqlite_cache = Arc::new(SqliteCache::new(Path::new(&config.db_path)).await?);
    sqlite_cache.migrate().await?;

    let user_cache = Arc::new(SqliteUserDrivenCache::new(sqlite_cache.clone()));
    let queue = Arc::new(CeleryAmqpQueue::new(&config.broker_url).await?);

    let dispatcher: Arc<dyn DomainEventHandler> = Arc::new(Dispatcher::new(
        Arc::new(config.archiver),
        user_cache,
        queue,
    ));

    let mut client_config = ClientConfig::new();
    for (k, v) in config.kafka.iter() {
        client_config.set(k, v);
    }

    let consumer: StreamConsumer = client_config.create()?;
    consumer.subscribe(&[&config.topic])?;

    info!("Subscriber running");
    loop {
        let message = match consumer.recv().await {
            Ok(message) => message,
            Err(KafkaError::PartitionEOF(_)) => return Ok(()),
            Err(error) => bail!(error),
        };

        info!("Consuming from kafka, current offset: {}", message.offset());
        match Event::try_from(&message) {
            Ok(event) => {
                let key = event.key();
                match event::handle(dispatcher.clone(), event).await {
                    Ok(_) => info!(event = key, "Succesfully handled event"),
                    Err(err) => error!(
                        error = err.to_string(),
                        event = key,
                        "Failed to handle event"
                    ),
                }
                consumer.commit_message(&message, CommitMode::Async)?;
            }
            Err(error) => {
                error!(?error, "fail to convert message to event");
                consumer.commit_message(&message, CommitMode::Async)?;
            }
        };
    }
}

impl TryFrom<&BorrowedMessage<'_>> for Event {
    type Error = Error;

    fn try_from(message: &BorrowedMessage<'_>) -> Result<Self, Self::Error> {
        let Some(key) = message.key() else {
            return Err(Error::CommandMalformed("event message without key".into()));
        };
        let Ok(key) = std::str::from_utf8(key) else {
            return Err(Error::CommandMalformed("event key is not utf-8".into()));
        };
        let Some(payload) = message.payload() else {
            return Err(Error::CommandMalformed(format!(
                "event {key} without payload"
            )));
        };

        Event::from_key(key, payload)
    }
}

pub struct EventConfig {
    pub db_path: String,
    pub broker_url: String,
    pub topic: String,
    pub kafka: HashMap<String, String>,
    pub archiver: ArchiverConfig,
}
