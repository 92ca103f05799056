// Integration tests for the analyzeEntry pipeline

mod common;

use common::StubGateway;
use mindmitra::auth::CallerIdentity;
use mindmitra::crisis::CrisisDetector;
use mindmitra::errors::ServiceError;
use mindmitra::providers::GenerationConfig;
use mindmitra::services::{AnalysisService, AnalyzeEntryRequest};
use mindmitra::store::{
    DocumentPath, DocumentStore, FieldValue, Fields, MemoryDocumentStore, Precondition,
};
use mindmitra::types::{AnalysisResult, Emotion};
use serde_json::{json, Value};
use std::sync::Arc;

fn service(gateway: Arc<StubGateway>, store: &MemoryDocumentStore) -> AnalysisService {
    AnalysisService::new(gateway, Arc::new(store.clone()), CrisisDetector::default())
}

/// Create the journal entry the way the journaling feature would
async fn seed_entry(store: &MemoryDocumentStore, uid: &str, journal_id: &str, text: &str) {
    let path = DocumentPath::journal(uid, journal_id).unwrap();
    store
        .set_merge(
            &path,
            Fields::from([
                ("text".to_string(), FieldValue::from(text)),
                ("title".to_string(), FieldValue::from("Tuesday")),
            ]),
            Precondition::MustNotExist,
        )
        .await
        .unwrap();
}

async fn entry(store: &MemoryDocumentStore, uid: &str, journal_id: &str) -> (Value, u64) {
    let path = DocumentPath::journal(uid, journal_id).unwrap();
    let snapshot = store.get(&path).await.unwrap().unwrap();
    (Value::Object(snapshot.fields), snapshot.version)
}

#[tokio::test]
async fn test_crisis_entry_end_to_end() {
    let store = MemoryDocumentStore::new();
    let text = "I feel hopeless and want to die";
    seed_entry(&store, "u1", "j1", text).await;
    let gateway = StubGateway::text(r#"{"emotion":"depressed","confidence":0.9}"#);
    let service = service(gateway.clone(), &store);

    let response = service
        .analyze_entry(Some(&CallerIdentity::new("u1")), AnalyzeEntryRequest::new(text, "j1"))
        .await
        .unwrap();

    assert!(response.success);
    assert!(response.has_crisis_trigger);
    assert_eq!(response.analysis.emotion, Emotion::Depressed);
    assert_eq!(response.analysis.confidence, 0.9);

    let (doc, version) = entry(&store, "u1", "j1").await;
    assert_eq!(version, 2);
    assert_eq!(doc["analysis"]["emotion"], "depressed");
    assert_eq!(doc["analysis"]["confidence"], 0.9);
    assert!(doc["analysis"]["timestamp"].is_string());
    assert_eq!(doc["localQuickTrigger"], true);
    assert_eq!(doc["analyzedAt"], doc["analysis"]["timestamp"]);
    // Merge leaves the entry's own fields alone
    assert_eq!(doc["text"], text);
    assert_eq!(doc["title"], "Tuesday");

    let calls = gateway.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0.contains(text));
    assert_eq!(calls[0].1, GenerationConfig::ANALYSIS);
}

#[tokio::test]
async fn test_unauthenticated_call_has_no_side_effects() {
    let store = MemoryDocumentStore::new();
    seed_entry(&store, "u1", "j1", "a calm day").await;
    let gateway = StubGateway::text(r#"{"emotion":"calm","confidence":0.8}"#);
    let service = service(gateway.clone(), &store);

    let err = service
        .analyze_entry(None, AnalyzeEntryRequest::new("a calm day", "j1"))
        .await
        .unwrap_err();

    assert_eq!(err, ServiceError::Unauthenticated);
    assert_eq!(gateway.call_count(), 0);
    let (doc, version) = entry(&store, "u1", "j1").await;
    assert_eq!(version, 1);
    assert!(doc.get("analysis").is_none());
}

#[tokio::test]
async fn test_invalid_arguments() {
    let store = MemoryDocumentStore::new();
    let gateway = StubGateway::text(r#"{"emotion":"calm","confidence":0.8}"#);
    let service = service(gateway.clone(), &store);
    let caller = CallerIdentity::new("u1");

    let requests = [
        AnalyzeEntryRequest::new("", "j1"),
        AnalyzeEntryRequest::new("text", ""),
        AnalyzeEntryRequest {
            text: Some("text".to_string()),
            journal_id: None,
        },
        AnalyzeEntryRequest::default(),
    ];

    for request in requests {
        let err = service.analyze_entry(Some(&caller), request).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }
    assert_eq!(gateway.call_count(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_unusable_caller_id_fails_before_model_call() {
    let store = MemoryDocumentStore::new();
    let gateway = StubGateway::text(r#"{"emotion":"calm","confidence":0.8}"#);
    let service = service(gateway.clone(), &store);

    let err = service
        .analyze_entry(
            Some(&CallerIdentity::new("tenant/u1")),
            AnalyzeEntryRequest::new("a calm day", "j1"),
        )
        .await
        .unwrap_err();

    assert_eq!(err, ServiceError::Internal("Failed to analyze entry".to_string()));
    assert_eq!(gateway.call_count(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_gateway_failure_is_internal_and_writes_nothing() {
    let store = MemoryDocumentStore::new();
    seed_entry(&store, "u1", "j1", "I feel worthless").await;
    let service = service(StubGateway::failing("connection reset by peer"), &store);

    let err = service
        .analyze_entry(
            Some(&CallerIdentity::new("u1")),
            AnalyzeEntryRequest::new("I feel worthless", "j1"),
        )
        .await
        .unwrap_err();

    assert_eq!(err, ServiceError::Internal("Failed to analyze entry".to_string()));
    assert!(!err.to_string().contains("connection reset"));
    let (_, version) = entry(&store, "u1", "j1").await;
    assert_eq!(version, 1);
}

#[tokio::test]
async fn test_unparseable_output_stores_fallback() {
    let store = MemoryDocumentStore::new();
    seed_entry(&store, "u1", "j1", "meh").await;
    let service = service(StubGateway::text("The writer seems fine, I think."), &store);

    let response = service
        .analyze_entry(Some(&CallerIdentity::new("u1")), AnalyzeEntryRequest::new("meh", "j1"))
        .await
        .unwrap();

    assert_eq!(response.analysis, AnalysisResult::FALLBACK);
    assert!(!response.has_crisis_trigger);
    let (doc, _) = entry(&store, "u1", "j1").await;
    assert_eq!(doc["analysis"]["emotion"], "neutral");
    assert_eq!(doc["analysis"]["confidence"], 0.5);
    assert_eq!(doc["localQuickTrigger"], false);
}

#[tokio::test]
async fn test_screen_does_not_depend_on_model_label() {
    let store = MemoryDocumentStore::new();
    seed_entry(&store, "u1", "j1", "x").await;
    let service = service(StubGateway::text(r#"{"emotion":"happy","confidence":0.99}"#), &store);

    let response = service
        .analyze_entry(
            Some(&CallerIdentity::new("u1")),
            AnalyzeEntryRequest::new("Honestly I feel WORTHLESS lately", "j1"),
        )
        .await
        .unwrap();

    assert_eq!(response.analysis.emotion, Emotion::Happy);
    assert!(response.has_crisis_trigger);
}

#[tokio::test]
async fn test_missing_entry_is_internal() {
    let store = MemoryDocumentStore::new();
    seed_entry(&store, "u1", "j1", "mine").await;
    let service = service(StubGateway::text(r#"{"emotion":"sad","confidence":0.3}"#), &store);

    // Another user's entry id does not resolve to u1's document
    let err = service
        .analyze_entry(Some(&CallerIdentity::new("u2")), AnalyzeEntryRequest::new("mine", "j1"))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Internal(_)));
    let (doc, version) = entry(&store, "u1", "j1").await;
    assert_eq!(version, 1);
    assert!(doc.get("analysis").is_none());
    let other = DocumentPath::journal("u2", "j1").unwrap();
    assert!(store.get(&other).await.unwrap().is_none());
}

#[tokio::test]
async fn test_repeat_analysis_is_idempotent() {
    let store = MemoryDocumentStore::new();
    seed_entry(&store, "u1", "j1", "a good day").await;
    let service = service(StubGateway::text(r#"{"emotion":"happy","confidence":0.8}"#), &store);
    let caller = CallerIdentity::new("u1");

    service
        .analyze_entry(Some(&caller), AnalyzeEntryRequest::new("a good day", "j1"))
        .await
        .unwrap();
    let (first, _) = entry(&store, "u1", "j1").await;

    service
        .analyze_entry(Some(&caller), AnalyzeEntryRequest::new("a good day", "j1"))
        .await
        .unwrap();
    let (second, version) = entry(&store, "u1", "j1").await;

    assert_eq!(version, 3);
    let without_time = |doc: &Value| {
        let mut analysis = doc["analysis"].clone();
        analysis.as_object_mut().unwrap().remove("timestamp");
        analysis
    };
    assert_eq!(without_time(&first), json!({"emotion": "happy", "confidence": 0.8}));
    assert_eq!(without_time(&first), without_time(&second));

    let keys = |doc: &Value| doc.as_object().unwrap().keys().cloned().collect::<Vec<_>>();
    assert_eq!(keys(&first), keys(&second));
}
