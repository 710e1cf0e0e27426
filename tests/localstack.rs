//! SQS + S3 integration tests using testcontainers.
//!
//! Run with: cargo test --test localstack -- --ignored --nocapture
//!
//! Uses LocalStack to emulate AWS SQS and S3 locally.
//! Tests share a single LocalStack container to avoid rootless port conflicts.

#![cfg(all(feature = "sqs", feature = "s3"))]

use std::sync::Arc;
use std::time::Duration;

use aws_config::BehaviorVersion;
use booking_pipeline::consumer::{BatchConsumer, ConsumerConfig, OutputConfig};
use booking_pipeline::producer::{Producer, ProducerConfig};
use booking_pipeline::queue::{MessageQueue, QueueAddress, SqsQueue};
use booking_pipeline::store::{ObjectStore, S3ObjectStore};
use serde_json::Value;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};
use tokio::sync::OnceCell;

const REGION: &str = "us-east-1";

/// Shared LocalStack container and endpoint URL.
static LOCALSTACK: OnceCell<(ContainerAsync<GenericImage>, String)> = OnceCell::const_new();

/// Get the shared LocalStack endpoint, starting the container if needed.
async fn get_localstack_endpoint() -> String {
    let (_, endpoint) = LOCALSTACK
        .get_or_init(|| async {
            println!("Starting shared LocalStack container...");
            let (container, endpoint) = start_localstack_internal().await;
            println!("LocalStack available at: {}", endpoint);
            (container, endpoint)
        })
        .await;

    // Dummy credentials for LocalStack
    std::env::set_var("AWS_ACCESS_KEY_ID", "test");
    std::env::set_var("AWS_SECRET_ACCESS_KEY", "test");
    std::env::set_var("AWS_DEFAULT_REGION", REGION);

    endpoint.clone()
}

/// Start LocalStack container with SQS/S3 services.
async fn start_localstack_internal() -> (ContainerAsync<GenericImage>, String) {
    let image = GenericImage::new("localstack/localstack", "latest")
        .with_exposed_port(4566.tcp())
        .with_wait_for(WaitFor::message_on_stdout("Ready."));

    let container = image
        .with_env_var("SERVICES", "sqs,s3")
        .with_env_var("AWS_DEFAULT_REGION", REGION)
        .with_env_var("EAGER_SERVICE_LOADING", "1")
        .with_env_var("DISABLE_EVENTS", "1")
        .with_env_var("SKIP_INFRA_DOWNLOADS", "1")
        .with_env_var("LOCALSTACK_HOST", "localhost")
        .with_startup_timeout(Duration::from_secs(180))
        .start()
        .await
        .expect("Failed to start localstack container");

    tokio::time::sleep(Duration::from_secs(3)).await;

    let host_port = container
        .get_host_port_ipv4(4566)
        .await
        .expect("Failed to get mapped port");
    let host = container
        .get_host()
        .await
        .expect("Failed to get container host");

    (container, format!("http://{}:{}", host, host_port))
}

async fn sdk_config(endpoint: &str) -> aws_config::SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(aws_config::Region::new(REGION))
        .endpoint_url(endpoint)
        .load()
        .await
}

/// Create a fresh queue and return its URL.
async fn create_queue(endpoint: &str) -> String {
    let client = aws_sdk_sqs::Client::new(&sdk_config(endpoint).await);
    let name = format!("bookings-{}", uuid::Uuid::new_v4().simple());
    client
        .create_queue()
        .queue_name(&name)
        .send()
        .await
        .expect("Failed to create queue")
        .queue_url()
        .expect("Queue URL missing")
        .to_string()
}

/// Create a fresh bucket and return its name.
async fn create_bucket(endpoint: &str) -> String {
    let config = aws_sdk_s3::config::Builder::from(&sdk_config(endpoint).await)
        .force_path_style(true)
        .build();
    let client = aws_sdk_s3::Client::from_conf(config);
    let name = format!("filtered-{}", uuid::Uuid::new_v4().simple());
    client
        .create_bucket()
        .bucket(&name)
        .send()
        .await
        .expect("Failed to create bucket");
    name
}

async fn read_object(endpoint: &str, bucket: &str, key: &str) -> Vec<Value> {
    let config = aws_sdk_s3::config::Builder::from(&sdk_config(endpoint).await)
        .force_path_style(true)
        .build();
    let client = aws_sdk_s3::Client::from_conf(config);
    let output = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .expect("Failed to get object");
    let bytes = output.body.collect().await.expect("Failed to read body");
    serde_json::from_slice(&bytes.into_bytes()).expect("Object is not a JSON array")
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_produce_then_consume_against_localstack() {
    let endpoint = get_localstack_endpoint().await;
    let queue_url = create_queue(&endpoint).await;
    let bucket = create_bucket(&endpoint).await;

    let address: QueueAddress = queue_url.parse().unwrap();
    let queue: Arc<dyn MessageQueue> =
        Arc::new(SqsQueue::new(address, Some(REGION), Some(&endpoint)).await);
    let store: Arc<dyn ObjectStore> =
        Arc::new(S3ObjectStore::with_endpoint(&bucket, &endpoint, Some(REGION)).await);

    let report = Producer::new(queue.clone(), ProducerConfig { batch_size: 10 })
        .run()
        .await
        .unwrap();
    assert_eq!(report.published, 10);

    let consumer = BatchConsumer::new(
        queue.clone(),
        store,
        ConsumerConfig {
            wait_time_secs: 2,
            ..ConsumerConfig::default()
        },
        OutputConfig::default(),
    );

    // SQS may hand back fewer than requested per receive.
    let mut received = 0;
    let mut survivors = 0;
    for _ in 0..10 {
        if received == 10 {
            break;
        }
        let batch = consumer.run_once().await.unwrap();
        received += batch.received;
        survivors += batch.survivors;

        if let Some(object) = batch.object {
            assert!(object.uri.starts_with(&format!("s3://{}/", bucket)));
            let records = read_object(&endpoint, &bucket, &object.key).await;
            assert_eq!(records.len(), batch.survivors);
        }
    }
    assert_eq!(received, 10);
    assert!(survivors <= 10);

    // Everything was acknowledged.
    let leftover = queue.receive(10, Duration::from_secs(1)).await.unwrap();
    assert!(leftover.is_empty());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_queue_arn_resolves_to_url() {
    let endpoint = get_localstack_endpoint().await;
    let queue_url = create_queue(&endpoint).await;
    let name = queue_url.rsplit('/').next().unwrap();

    let address: QueueAddress = format!("arn:aws:sqs:{}:000000000000:{}", REGION, name)
        .parse()
        .unwrap();
    let queue = SqsQueue::new(address, Some(REGION), Some(&endpoint)).await;

    queue.publish(b"{\"ping\":true}").await.unwrap();
    let messages = queue.receive(1, Duration::from_secs(2)).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].body, b"{\"ping\":true}");
    let token = messages[0].ack_token.as_ref().unwrap();
    queue.acknowledge(token).await.unwrap();
}
