use std::{collections::HashSet, sync::Arc};

use lapin::{
    options::*,
    publisher_confirm::Confirmation,
    types::{AMQPValue, FieldArray, FieldTable, LongString, ShortString},
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind,
};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::{
    error::Error,
    task::{TaskDrivenQueue, TaskPayload},
    Result,
};

const CONTENT_TYPE: &str = "application/json";
const CONTENT_ENCODING: &str = "utf-8";
const PERSISTENT: u8 = 2;

/// Headers of a Celery protocol v2 task message.
#[derive(Debug, Clone, PartialEq)]
pub struct CeleryHeaders {
    pub lang: String,
    pub task: String,
    pub id: String,
    pub root_id: String,
    pub retries: i32,
    pub argsrepr: String,
    pub kwargsrepr: String,
    pub origin: String,
}
impl From<&CeleryHeaders> for FieldTable {
    fn from(value: &CeleryHeaders) -> Self {
        let long = |v: &str| AMQPValue::LongString(LongString::from(v));

        let mut table = FieldTable::default();
        table.insert("lang".into(), long(&value.lang));
        table.insert("task".into(), long(&value.task));
        table.insert("id".into(), long(&value.id));
        table.insert("root_id".into(), long(&value.root_id));
        table.insert("parent_id".into(), AMQPValue::Void);
        table.insert("group".into(), AMQPValue::Void);
        table.insert("retries".into(), AMQPValue::LongInt(value.retries));
        table.insert("eta".into(), AMQPValue::Void);
        table.insert("expires".into(), AMQPValue::Void);
        table.insert(
            "timelimit".into(),
            AMQPValue::FieldArray(FieldArray::from(vec![AMQPValue::Void, AMQPValue::Void])),
        );
        table.insert("argsrepr".into(), long(&value.argsrepr));
        table.insert("kwargsrepr".into(), long(&value.kwargsrepr));
        table.insert("origin".into(), long(&value.origin));
        table
    }
}

#[derive(Debug, Clone)]
pub struct CeleryMessage {
    pub headers: CeleryHeaders,
    pub correlation_id: String,
    pub body: Vec<u8>,
}
impl TryFrom<&TaskPayload> for CeleryMessage {
    type Error = crate::domain::error::Error;

    fn try_from(task: &TaskPayload) -> Result<Self> {
        let args = serde_json::to_value(&task.args)?;

        let headers = CeleryHeaders {
            lang: "py".into(),
            task: task.name.clone(),
            id: task.task_id.clone(),
            root_id: task.task_id.clone(),
            retries: 0,
            argsrepr: args.to_string(),
            kwargsrepr: "{}".into(),
            origin: format!("gen{}@archiver", std::process::id()),
        };

        let embed = json!({
            "callbacks": Value::Null,
            "errbacks": Value::Null,
            "chain": Value::Null,
            "chord": Value::Null,
        });
        let body = serde_json::to_vec(&json!([args, {}, embed]))?;

        Ok(Self {
            headers,
            correlation_id: task.task_id.clone(),
            body,
        })
    }
}
impl CeleryMessage {
    pub fn properties(&self) -> BasicProperties {
        BasicProperties::default()
            .with_content_type(ShortString::from(CONTENT_TYPE))
            .with_content_encoding(ShortString::from(CONTENT_ENCODING))
            .with_correlation_id(ShortString::from(self.correlation_id.as_str()))
            .with_headers(FieldTable::from(&self.headers))
            .with_delivery_mode(PERSISTENT)
    }
}

/// Sends tasks to Celery workers through an AMQP broker, using Celery's
/// default routing: one direct exchange per queue, bound by the queue name.
pub struct CeleryAmqpQueue {
    _connection: Arc<Connection>,
    channel: Arc<Mutex<Channel>>,
    declared: Mutex<HashSet<String>>,
}
impl CeleryAmqpQueue {
    pub async fn new(url: &str) -> Result<Self> {
        let connection = Connection::connect(url, ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await?;

        info!("connected to task broker");

        Ok(Self {
            _connection: Arc::new(connection),
            channel: Arc::new(Mutex::new(channel)),
            declared: Mutex::new(HashSet::new()),
        })
    }

    async fn declare(&self, channel: &Channel, queue: &str) -> Result<()> {
        let mut declared = self.declared.lock().await;
        if declared.contains(queue) {
            return Ok(());
        }

        channel
            .exchange_declare(
                queue,
                ExchangeKind::Direct,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        channel
            .queue_bind(
                queue,
                queue,
                queue,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        declared.insert(queue.to_string());
        debug!(queue, "queue declared");

        Ok(())
    }
}
#[async_trait::async_trait]
impl TaskDrivenQueue for CeleryAmqpQueue {
    async fn send_task(&self, task: &TaskPayload) -> Result<()> {
        let message = CeleryMessage::try_from(task)?;

        let channel = self.channel.lock().await;
        self.declare(&channel, &task.queue).await?;

        let confirmation = channel
            .basic_publish(
                &task.queue,
                &task.queue,
                BasicPublishOptions::default(),
                &message.body,
                message.properties(),
            )
            .await?
            .await?;
        check_confirmation(&task.task_id, confirmation)?;

        debug!(queue = task.queue, task = task.task_id, "task published");
        Ok(())
    }
}

/// The channel runs in confirm mode, so anything but a plain ack means the
/// broker did not take the task.
fn check_confirmation(task_id: &str, confirmation: Confirmation) -> Result<()> {
    match confirmation {
        Confirmation::Ack(None) => Ok(()),
        Confirmation::Ack(Some(_)) => Err(Error::Unexpected(format!(
            "task {task_id} was returned by the broker"
        ))),
        Confirmation::Nack(_) => Err(Error::Unexpected(format!(
            "task {task_id} was rejected by the broker"
        ))),
        Confirmation::NotRequested => Err(Error::Unexpected(format!(
            "task {task_id} was published without confirmation"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::task::{ARCHIVE_QUEUE, ARCHIVE_TASK_NAME};

    use super::*;

    #[test]
    fn it_should_build_celery_headers() {
        let task = TaskPayload::archive(r#"{"username":"default"}"#.into(), r#"{"id":"r1"}"#.into());

        let message = CeleryMessage::try_from(&task).unwrap();

        assert_eq!(message.headers.lang, "py");
        assert_eq!(message.headers.task, ARCHIVE_TASK_NAME);
        assert_eq!(message.headers.id, task.task_id);
        assert_eq!(message.headers.root_id, task.task_id);
        assert_eq!(message.headers.retries, 0);
        assert_eq!(message.headers.kwargsrepr, "{}");
        assert_eq!(message.correlation_id, task.task_id);
        assert_eq!(task.queue, ARCHIVE_QUEUE);
    }

    #[test]
    fn it_should_build_celery_body_with_positional_args() {
        let task = TaskPayload::archive(r#"{"username":"default"}"#.into(), r#"{"id":"r1"}"#.into());

        let message = CeleryMessage::try_from(&task).unwrap();
        let body: Value = serde_json::from_slice(&message.body).unwrap();

        let body = body.as_array().unwrap();
        assert_eq!(body.len(), 3);
        assert_eq!(body[0], json!([r#"{"username":"default"}"#, r#"{"id":"r1"}"#]));
        assert_eq!(body[1], json!({}));
        assert!(body[2]["callbacks"].is_null());
        assert!(body[2]["chord"].is_null());
    }

    #[test]
    fn it_should_build_persistent_json_properties() {
        let task = TaskPayload::archive("{}".into(), "{}".into());

        let message = CeleryMessage::try_from(&task).unwrap();
        let properties = message.properties();

        assert_eq!(properties.delivery_mode(), &Some(PERSISTENT));
        assert_eq!(
            properties.content_type().as_ref().map(|v| v.as_str()),
            Some(CONTENT_TYPE)
        );
        assert_eq!(
            properties.correlation_id().as_ref().map(|v| v.as_str()),
            Some(task.task_id.as_str())
        );

        let headers = properties.headers().as_ref().unwrap();
        assert_eq!(
            headers.inner().get(&ShortString::from("task")),
            Some(&AMQPValue::LongString(LongString::from(ARCHIVE_TASK_NAME)))
        );
    }

    #[test]
    fn it_should_accept_acked_publish() {
        let result = check_confirmation("t1", Confirmation::Ack(None));
        assert!(result.is_ok());
    }

    #[test]
    fn it_should_fail_nacked_publish() {
        let result = check_confirmation("t1", Confirmation::Nack(None));
        assert!(matches!(result, Err(Error::Unexpected(_))));
    }

    #[test]
    fn it_should_fail_unconfirmed_publish() {
        let result = check_confirmation("t1", Confirmation::NotRequested);
        assert!(matches!(result, Err(Error::Unexpected(_))));
    }
}
