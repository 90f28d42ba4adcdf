mod common;

use std::net::SocketAddr;
use std::time::Duration;

use common::*;
use imtag::TagDBBuilder;
use imtag::batch::Batch;
use imtag::classifier::{Classifier, HttpClassifier};
use imtag::config::PipelineOptions;
use imtag::dispatch::Dispatcher;
use imtag::error::BatchError;
use rstest::*;

fn batch(addr: SocketAddr, names: &[&str]) -> Batch {
    Batch { key: 0, items: names.iter().map(|name| format!("http://{addr}/img/{name}")).collect() }
}

#[rstest]
#[case::bad_gateway("broken.jpg", "http")]
#[case::malformed_body("garbled.jpg", "decode")]
#[tokio::test]
async fn test_classify_error_kind(#[case] name: &str, #[case] kind: &str) {
    let (addr, _) = spawn_mock().await;
    let classifier = HttpClassifier::new(&pipeline(addr)).unwrap();

    let err = classifier.classify(&batch(addr, &["a.jpg", name])).await.unwrap_err();
    assert_eq!(err.kind(), kind);
}

#[tokio::test]
async fn test_classify_malformed_body_is_decode_error() {
    let (addr, _) = spawn_mock().await;
    let classifier = HttpClassifier::new(&pipeline(addr)).unwrap();

    let err = classifier.classify(&batch(addr, &["garbled.jpg"])).await.unwrap_err();
    assert!(matches!(err, BatchError::Decode(_)));
}

#[tokio::test]
async fn test_classify_unreachable_is_transport_error() {
    let closed = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let classifier = HttpClassifier::new(&pipeline(closed)).unwrap();

    let err = classifier.classify(&batch(closed, &["a.jpg"])).await.unwrap_err();
    assert_eq!(err.kind(), "transport");
}

#[tokio::test]
async fn test_classify_success() {
    let (addr, _) = spawn_mock().await;
    let classifier = HttpClassifier::new(&pipeline(addr)).unwrap();

    let resp = classifier.classify(&batch(addr, &["a.jpg", "b.jpg"])).await.unwrap();
    assert!(resp.status.is_success());
    assert_eq!(resp.outputs.len(), 2);
    assert_eq!(resp.outputs[0].data.concepts[0].name, "cat");
}

#[tokio::test]
async fn test_malformed_body_fails_only_its_batch() {
    let (addr, _) = spawn_mock().await;
    let opts = PipelineOptions { batch_size: 1, ..pipeline(addr) };
    let db = TagDBBuilder::new(opts).open().unwrap();

    let items = ["a.jpg", "garbled.jpg"].iter().map(|name| format!("http://{addr}/img/{name}"));
    let report = db.ingest_items(items.collect()).await;
    assert_eq!((report.stats.accepted, report.stats.failed), (1, 1));
    assert_eq!(report.stats.annotations, 2);
    assert!(db.image_tags(&format!("http://{addr}/img/garbled.jpg"), 10).await.is_empty());
}

#[tokio::test]
async fn test_slow_response_times_out_in_dispatcher() {
    let (addr, _) = spawn_mock().await;
    let opts = PipelineOptions { request_timeout: Duration::from_millis(200), ..pipeline(addr) };
    let dispatcher = Dispatcher::new(HttpClassifier::new(&opts).unwrap(), opts);

    let outcomes = dispatcher.dispatch(vec![batch(addr, &["slow.jpg"])]).await;
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0].result, Err(BatchError::Timeout(_))));
}
