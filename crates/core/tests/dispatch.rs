use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Value, json};

use spill_core::memory::{MemoryBlobStore, MemoryQueue};
use spill_core::{
    BinaryValue, BlobError, ConfigError, DispatchError, Dispatcher, DispatcherConfig, InputError,
    MessageAttribute, MessageAttributes, MessagePointer, QueueError, Route, SizedBlob,
};

const QUEUE: &str = "https://sqs.us-east-1.amazonaws.com/123456789012/orders";
const BUCKET: &str = "orders-payloads";

// -- Helpers --------------------------------------------------------------

struct Harness {
    dispatcher: Dispatcher,
    queue: Arc<MemoryQueue>,
    blob: Arc<MemoryBlobStore>,
}

fn harness(config: DispatcherConfig) -> Harness {
    let queue = Arc::new(MemoryQueue::new());
    let blob = Arc::new(MemoryBlobStore::new());
    let dispatcher = Dispatcher::new(config, queue.clone(), blob.clone()).unwrap();
    Harness {
        dispatcher,
        queue,
        blob,
    }
}

fn with_threshold(threshold: i64) -> Harness {
    harness(
        DispatcherConfig::new(QUEUE)
            .with_bucket(BUCKET)
            .with_size_threshold(threshold),
    )
}

fn attributes(count: usize) -> MessageAttributes {
    (0..count)
        .map(|i| (format!("attr-{i}"), MessageAttribute::string("value")))
        .collect()
}

fn threshold_for(len: usize) -> i64 {
    i64::try_from(len).unwrap()
}

// -- End-to-end scenarios -------------------------------------------------

#[tokio::test]
async fn small_body_goes_direct() {
    let h = with_threshold(10);
    let receipt = h.dispatcher.send(&json!({"x": 1}), None).await.unwrap();

    assert_eq!(receipt.route, Route::Direct);
    let sent = h.queue.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].payload, r#"{"x":1}"#);
    assert!(h.blob.objects().is_empty());
}

#[tokio::test]
async fn large_body_is_offloaded_behind_pointer() {
    let h = with_threshold(5);
    let receipt = h.dispatcher.send(&json!({"x": 1}), None).await.unwrap();

    let objects = h.blob.objects();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].container, BUCKET);
    assert_eq!(objects[0].payload, r#"{"x":1}"#);

    let sent = h.queue.sent();
    assert_eq!(sent.len(), 1);
    let pointer: MessagePointer = serde_json::from_str(&sent[0].payload).unwrap();
    assert_eq!(pointer.bucket, BUCKET);
    assert_eq!(pointer.key, objects[0].key);
    assert_eq!(receipt.route, Route::Offloaded(pointer));

    // The payload on the queue is exactly the two-field pointer.
    let raw: Value = serde_json::from_str(&sent[0].payload).unwrap();
    assert_eq!(raw.as_object().unwrap().len(), 2);
}

// -- Routing boundary -----------------------------------------------------

#[tokio::test]
async fn threshold_equal_to_body_size_routes_direct() {
    let body = json!({"message": "hello world", "n": [1, 2, 3]});
    let len = serde_json::to_string(&body).unwrap().len();

    let h = with_threshold(threshold_for(len));
    let receipt = h.dispatcher.send(&body, None).await.unwrap();
    assert_eq!(receipt.route, Route::Direct);
    assert_eq!(receipt.size.total(), len as u64);

    let h = with_threshold(threshold_for(len) - 1);
    let receipt = h.dispatcher.send(&body, None).await.unwrap();
    assert!(matches!(receipt.route, Route::Offloaded(_)));
}

#[tokio::test]
async fn default_threshold_is_256_kib() {
    let h = harness(DispatcherConfig::new(QUEUE).with_bucket(BUCKET));

    // A JSON string body serializes with two surrounding quotes.
    let fits = Value::String("a".repeat(262_144 - 2));
    let receipt = h.dispatcher.send(&fits, None).await.unwrap();
    assert_eq!(receipt.route, Route::Direct);

    let too_big = Value::String("a".repeat(262_144 - 1));
    let receipt = h.dispatcher.send(&too_big, None).await.unwrap();
    assert!(matches!(receipt.route, Route::Offloaded(_)));
}

#[tokio::test]
async fn force_offload_ignores_size() {
    let h = harness(
        DispatcherConfig::new(QUEUE)
            .with_bucket(BUCKET)
            .with_force_offload(true),
    );
    let receipt = h.dispatcher.send(&json!({"n": 1}), None).await.unwrap();
    assert!(matches!(receipt.route, Route::Offloaded(_)));
    assert_eq!(h.blob.objects()[0].payload, r#"{"n":1}"#);
}

// -- Encoding-correct accounting ------------------------------------------

#[tokio::test]
async fn multibyte_body_is_sized_by_bytes() {
    // "€€€" is 3 chars, 9 bytes; serialized with quotes it is 11 bytes.
    let body = Value::String("€€€".into());

    let h = with_threshold(11);
    let receipt = h.dispatcher.send(&body, None).await.unwrap();
    assert_eq!(receipt.route, Route::Direct);
    assert_eq!(receipt.size.body, 11);

    let h = with_threshold(10);
    let receipt = h.dispatcher.send(&body, None).await.unwrap();
    assert!(matches!(receipt.route, Route::Offloaded(_)));
}

#[tokio::test]
async fn multibyte_attribute_value_counts_three_bytes() {
    let attrs = MessageAttributes::new().with("k", MessageAttribute::string("€"));
    let h = with_threshold(1_000);
    let receipt = h.dispatcher.send(&json!({}), Some(&attrs)).await.unwrap();
    // "k" + "String" + 3 bytes for the euro sign.
    assert_eq!(receipt.size.attributes, 1 + 6 + 3);
}

#[tokio::test]
async fn binary_attribute_shapes_are_sized_consistently() {
    let attrs = MessageAttributes::new()
        .with("raw", MessageAttribute::binary(vec![0u8; 4]))
        .with("text", MessageAttribute::binary(BinaryValue::Text("ü".into())))
        .with(
            "sized",
            MessageAttribute::binary(SizedBlob::with_declared_size(vec![0u8; 1], 100)),
        );

    let h = with_threshold(100_000);
    let receipt = h.dispatcher.send(&json!({}), Some(&attrs)).await.unwrap();
    let expected = (3 + 6 + 4) + (4 + 6 + 2) + (5 + 6 + 100);
    assert_eq!(receipt.size.attributes, expected);
}

#[tokio::test]
async fn attributes_push_message_over_threshold() {
    let body = json!({"x": 1});
    let attrs = MessageAttributes::new().with("big", MessageAttribute::string("y".repeat(50)));

    let h = with_threshold(20);
    let receipt = h.dispatcher.send(&body, Some(&attrs)).await.unwrap();
    assert!(matches!(receipt.route, Route::Offloaded(_)));

    // Attributes stay on the queue message, never in the blob.
    assert_eq!(h.queue.sent()[0].attributes, attrs);
    assert_eq!(h.blob.objects()[0].payload, r#"{"x":1}"#);
}

// -- Input validation -----------------------------------------------------

#[tokio::test]
async fn eleven_attributes_rejected_on_direct_path() {
    let h = with_threshold(1_000_000);
    let err = h
        .dispatcher
        .send(&json!({"n": 1}), Some(&attributes(11)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Input(InputError::TooManyAttributes { count: 11, max: 10 })
    ));
    assert_eq!(h.queue.attempts(), 0);
}

#[tokio::test]
async fn eleven_attributes_rejected_on_offload_path() {
    let h = harness(
        DispatcherConfig::new(QUEUE)
            .with_bucket(BUCKET)
            .with_force_offload(true),
    );
    let err = h
        .dispatcher
        .send(&json!({"n": 1}), Some(&attributes(11)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Input(InputError::TooManyAttributes { .. })
    ));
    assert_eq!(h.blob.attempts(), 0);
    assert_eq!(h.queue.attempts(), 0);
}

#[tokio::test]
async fn ten_attributes_accepted() {
    let h = with_threshold(1_000_000);
    h.dispatcher
        .send(&json!({"n": 1}), Some(&attributes(10)))
        .await
        .unwrap();
    assert_eq!(h.queue.sent()[0].attributes.len(), 10);
}

#[tokio::test]
async fn null_body_rejected_without_collaborator_calls() {
    let h = with_threshold(1);
    let err = h.dispatcher.send(&Value::Null, None).await.unwrap_err();
    assert!(matches!(err, DispatchError::Input(InputError::MissingBody)));
    assert_eq!(h.queue.attempts(), 0);
    assert_eq!(h.blob.attempts(), 0);
}

#[tokio::test]
async fn falsy_bodies_rejected_without_collaborator_calls() {
    let h = harness(
        DispatcherConfig::new(QUEUE)
            .with_bucket(BUCKET)
            .with_force_offload(true),
    );
    for body in [json!(false), json!(0), json!(""), json!(0.0)] {
        let err = h.dispatcher.send(&body, None).await.unwrap_err();
        assert!(
            matches!(err, DispatchError::Input(InputError::MissingBody)),
            "{body}"
        );
    }
    assert_eq!(h.queue.attempts(), 0);
    assert_eq!(h.blob.attempts(), 0);
    assert_eq!(h.dispatcher.metrics().snapshot().input_rejected, 4);
}

#[tokio::test]
async fn huge_declared_attribute_size_forces_offload() {
    let attrs = MessageAttributes::new().with(
        "blob",
        MessageAttribute::binary(SizedBlob::with_declared_size(vec![1u8], u64::MAX)),
    );
    let h = with_threshold(1_000);
    let receipt = h
        .dispatcher
        .send(&json!({"x": 1}), Some(&attrs))
        .await
        .unwrap();
    assert!(matches!(receipt.route, Route::Offloaded(_)));
    assert_eq!(receipt.size.total(), u64::MAX);
    assert_eq!(h.blob.attempts(), 1);
}

// -- Failure handling -----------------------------------------------------

#[tokio::test]
async fn blob_failure_skips_queue_send() {
    let h = with_threshold(1);
    h.blob
        .set_failure(Some(BlobError::Service("AccessDenied".into())));

    let err = h.dispatcher.send(&json!({"x": 1}), None).await.unwrap_err();
    match &err {
        DispatchError::Offload { source, .. } => {
            assert_eq!(source, &BlobError::Service("AccessDenied".into()));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(h.blob.attempts(), 1);
    assert_eq!(h.queue.attempts(), 0);
    assert_eq!(h.dispatcher.metrics().snapshot().offload_failed, 1);
}

#[tokio::test]
async fn queue_failure_after_offload_reports_orphan() {
    let h = with_threshold(1);
    h.queue.set_failure(Some(QueueError::Throttled));

    let err = h.dispatcher.send(&json!({"x": 1}), None).await.unwrap_err();
    let orphan = err.orphaned_object().cloned().unwrap();
    assert_eq!(orphan.bucket, BUCKET);
    assert_eq!(
        h.blob.get(&orphan.bucket, &orphan.key).as_deref(),
        Some(r#"{"x":1}"#)
    );
    assert!(err.is_retryable());
    assert_eq!(h.queue.attempts(), 1);
}

#[tokio::test]
async fn no_internal_retry() {
    let h = with_threshold(1_000);
    h.queue.set_failure(Some(QueueError::Timeout));
    let _ = h.dispatcher.send(&json!({"n": 1}), None).await.unwrap_err();
    assert_eq!(h.queue.attempts(), 1);
}

// -- Keys and concurrency -------------------------------------------------

#[tokio::test]
async fn identical_bodies_get_distinct_keys() {
    let h = with_threshold(1);
    let body = json!({"same": true});

    let first = h.dispatcher.send(&body, None).await.unwrap();
    let second = h.dispatcher.send(&body, None).await.unwrap();

    let (Route::Offloaded(a), Route::Offloaded(b)) = (first.route, second.route) else {
        panic!("expected both sends to offload");
    };
    assert_ne!(a.key, b.key);
    assert_eq!(h.blob.objects().len(), 2);
}

#[tokio::test]
async fn key_prefix_applied() {
    let h = harness(
        DispatcherConfig::new(QUEUE)
            .with_bucket(BUCKET)
            .with_size_threshold(1)
            .with_key_prefix("orders/"),
    );
    let receipt = h.dispatcher.send(&json!({"x": 1}), None).await.unwrap();
    let Route::Offloaded(pointer) = receipt.route else {
        panic!("expected offload");
    };
    assert!(pointer.key.starts_with("orders/"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sends_share_one_dispatcher() {
    let h = with_threshold(20);

    let mut handles = Vec::new();
    for i in 0..32 {
        let dispatcher = h.dispatcher.clone();
        handles.push(tokio::spawn(async move {
            // Even indices are small, odd ones exceed the threshold.
            let body = if i % 2 == 0 {
                json!(i)
            } else {
                json!({"padding": "x".repeat(64), "i": i})
            };
            dispatcher.send(&body, None).await.unwrap()
        }));
    }

    let mut keys = HashSet::new();
    for handle in handles {
        if let Route::Offloaded(pointer) = handle.await.unwrap().route {
            assert!(keys.insert(pointer.key));
        }
    }

    assert_eq!(keys.len(), 16);
    assert_eq!(h.queue.sent().len(), 32);
    assert_eq!(h.blob.objects().len(), 16);
    let snap = h.dispatcher.metrics().snapshot();
    assert_eq!(snap.direct, 16);
    assert_eq!(snap.offloaded, 16);
}

// -- Construction ---------------------------------------------------------

fn build(config: DispatcherConfig) -> Result<Dispatcher, ConfigError> {
    Dispatcher::new(
        config,
        Arc::new(MemoryQueue::new()),
        Arc::new(MemoryBlobStore::new()),
    )
}

#[test]
fn construction_without_queue_url_fails() {
    let err = build(DispatcherConfig::default().with_bucket(BUCKET)).unwrap_err();
    assert!(matches!(err, ConfigError::MissingQueueUrl));
}

#[test]
fn construction_with_non_text_bucket_fails() {
    let err = DispatcherConfig::from_toml_str(&format!("queue_url = \"{QUEUE}\"\nbucket = 7"))
        .and_then(build)
        .unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn construction_with_non_positive_threshold_fails() {
    let err = build(DispatcherConfig::new(QUEUE).with_size_threshold(0)).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSizeThreshold(0)));

    let err = build(DispatcherConfig::new(QUEUE).with_size_threshold(-5)).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSizeThreshold(-5)));
}

#[test]
fn construction_from_toml() {
    let toml = format!(
        r#"
        queue_url = "{QUEUE}"
        bucket = "{BUCKET}"
        size_threshold = 1024
        "#
    );
    let dispatcher = DispatcherConfig::from_toml_str(&toml)
        .and_then(build)
        .unwrap();
    assert_eq!(dispatcher.config().size_threshold(), 1024);
    assert_eq!(dispatcher.config().bucket(), Some(BUCKET));
}
