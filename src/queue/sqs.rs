//! AWS SQS queue implementation.
//!
//! The queue is addressed either by URL
//! (`https://sqs.{region}.amazonaws.com/{account}/{name}`) or by ARN
//! (`arn:aws:sqs:{region}:{account}:{name}`). SQS calls need the URL, so an
//! ARN is resolved once through `GetQueueUrl` and cached.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::Client as SqsClient;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::{
    AckToken, MessageQueue, QueueError, QueueMessage, Result, MAX_LONG_POLL, MAX_RECEIVE_BATCH,
};

/// Where the queue lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueAddress {
    /// Queue URL, usable as-is.
    Url(String),
    /// Queue ARN, resolved to a URL on first use.
    Arn {
        region: String,
        account_id: String,
        name: String,
    },
}

impl FromStr for QueueAddress {
    type Err = QueueError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.starts_with("arn:") {
            // arn:{partition}:sqs:{region}:{account}:{name}
            let parts: Vec<&str> = s.splitn(6, ':').collect();
            match parts.as_slice() {
                ["arn", _, "sqs", region, account_id, name]
                    if !region.is_empty() && !account_id.is_empty() && !name.is_empty() =>
                {
                    Ok(Self::Arn {
                        region: region.to_string(),
                        account_id: account_id.to_string(),
                        name: name.to_string(),
                    })
                }
                _ => Err(QueueError::InvalidAddress(format!("not an SQS ARN: {}", s))),
            }
        } else if s.starts_with("https://") || s.starts_with("http://") {
            Ok(Self::Url(s.to_string()))
        } else {
            Err(QueueError::InvalidAddress(format!(
                "expected a queue URL or ARN, got: {:?}",
                s
            )))
        }
    }
}

/// AWS SQS message queue.
pub struct SqsQueue {
    sqs: SqsClient,
    address: QueueAddress,
    queue_url: OnceCell<String>,
}

impl SqsQueue {
    /// Connect using the default AWS provider chain.
    ///
    /// `region` overrides the provider chain; `endpoint_url` points the client
    /// at LocalStack or another SQS-compatible service.
    pub async fn new(
        address: QueueAddress,
        region: Option<&str>,
        endpoint_url: Option<&str>,
    ) -> Self {
        let mut aws_config_builder = aws_config::defaults(BehaviorVersion::latest());

        // An ARN carries its own region; the explicit setting still wins.
        let region = region.map(str::to_string).or_else(|| match &address {
            QueueAddress::Arn { region, .. } => Some(region.clone()),
            QueueAddress::Url(_) => None,
        });

        if let Some(ref region) = region {
            aws_config_builder = aws_config_builder.region(aws_config::Region::new(region.clone()));
        }

        if let Some(endpoint) = endpoint_url {
            aws_config_builder = aws_config_builder.endpoint_url(endpoint);
        }

        let aws_config = aws_config_builder.load().await;

        info!(
            region = ?region,
            endpoint = ?endpoint_url,
            address = ?address,
            "Connected to AWS SQS"
        );

        Self::with_client(SqsClient::new(&aws_config), address)
    }

    /// Create with explicit client (for testing).
    pub fn with_client(sqs: SqsClient, address: QueueAddress) -> Self {
        let queue_url = match &address {
            QueueAddress::Url(url) => OnceCell::new_with(Some(url.clone())),
            QueueAddress::Arn { .. } => OnceCell::new(),
        };
        Self {
            sqs,
            address,
            queue_url,
        }
    }

    /// Queue URL, resolving an ARN on first call.
    async fn queue_url(&self) -> Result<&str> {
        let url = self
            .queue_url
            .get_or_try_init(|| async {
                match &self.address {
                    QueueAddress::Url(url) => Ok::<_, QueueError>(url.clone()),
                    QueueAddress::Arn {
                        account_id, name, ..
                    } => {
                        let output = self
                            .sqs
                            .get_queue_url()
                            .queue_name(name)
                            .queue_owner_aws_account_id(account_id)
                            .send()
                            .await
                            .map_err(|e| {
                                QueueError::Resolve(format!(
                                    "GetQueueUrl for {} failed: {}",
                                    name, e
                                ))
                            })?;
                        let url = output
                            .queue_url()
                            .ok_or_else(|| {
                                QueueError::Resolve("GetQueueUrl returned no URL".to_string())
                            })?
                            .to_string();
                        info!(queue = %name, url = %url, "Resolved SQS queue ARN");
                        Ok(url)
                    }
                }
            })
            .await?;
        Ok(url.as_str())
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    async fn publish(&self, body: &[u8]) -> Result<Option<String>> {
        let queue_url = self.queue_url().await?;
        let body = std::str::from_utf8(body)
            .map_err(|e| QueueError::Publish(format!("SQS message body must be UTF-8: {}", e)))?;

        let output = self
            .sqs
            .send_message()
            .queue_url(queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| QueueError::Publish(format!("Failed to send to SQS: {}", e)))?;

        let message_id = output.message_id().map(str::to_string);
        debug!(message_id = ?message_id, size = body.len(), "Published message to SQS");
        Ok(message_id)
    }

    async fn receive(&self, max_messages: usize, wait: Duration) -> Result<Vec<QueueMessage>> {
        let queue_url = self.queue_url().await?;
        let max_messages = max_messages.clamp(1, MAX_RECEIVE_BATCH) as i32;
        let wait_time_secs = wait.min(MAX_LONG_POLL).as_secs() as i32;

        let output = self
            .sqs
            .receive_message()
            .queue_url(queue_url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait_time_secs)
            .send()
            .await
            .map_err(|e| QueueError::Receive(format!("Failed to receive from SQS: {}", e)))?;

        let messages: Vec<QueueMessage> = output.messages().iter().map(to_queue_message).collect();

        debug!(
            count = messages.len(),
            max_messages = max_messages,
            wait_time_secs = wait_time_secs,
            "Received messages from SQS"
        );
        Ok(messages)
    }

    async fn acknowledge(&self, token: &AckToken) -> Result<()> {
        let queue_url = self.queue_url().await?;
        self.sqs
            .delete_message()
            .queue_url(queue_url)
            .receipt_handle(token.as_str())
            .send()
            .await
            .map_err(|e| QueueError::Acknowledge(format!("Failed to delete SQS message: {}", e)))?;
        Ok(())
    }
}

/// Convert an SQS message. One without a receipt handle is passed on with no
/// token so the caller can count it.
fn to_queue_message(message: &aws_sdk_sqs::types::Message) -> QueueMessage {
    let ack_token = message.receipt_handle().map(AckToken::new);
    if ack_token.is_none() {
        warn!(
            message_id = ?message.message_id(),
            "SQS message without receipt handle"
        );
    }
    QueueMessage {
        message_id: message.message_id().map(str::to_string),
        body: message.body().unwrap_or_default().as_bytes().to_vec(),
        ack_token,
    }
}
