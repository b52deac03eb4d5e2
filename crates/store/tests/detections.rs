//! Integration tests for `DetectionRepo` against a temporary data directory.

use speedtrap_core::speed::SpeedReading;
use speedtrap_core::trigger::EventSummary;
use speedtrap_store::models::detection::CreateDetection;
use speedtrap_store::repositories::DetectionRepo;
use speedtrap_store::{FileStore, StoreConfig};
use tempfile::TempDir;

async fn open_store(dir: &TempDir, max_detections: usize) -> FileStore {
    let mut config = StoreConfig::new(dir.path().join("data"));
    config.max_detections = max_detections;
    speedtrap_store::open(config).await.unwrap()
}

fn summary(device: &str, line: &str, timestamp: i64) -> EventSummary {
    EventSummary {
        device: device.to_string(),
        line: Some(line.to_string()),
        timestamp,
        event_id: Some(format!("ev-{timestamp}")),
    }
}

fn create(alarm: &str, speed_kmh: f64) -> CreateDetection {
    CreateDetection {
        alarm_name: alarm.to_string(),
        image: None,
        reading: SpeedReading {
            speed_kmh,
            speed_ms: speed_kmh / 3.6,
            time_diff_seconds: 0.5,
            time_diff_ms: 500,
            line_distance_meters: 10.0,
            first_event: summary("cam-1", "1", 1000),
            second_event: summary("cam-2", "2", 1500),
            out_of_range: false,
        },
    }
}

// ---------------------------------------------------------------------------
// Test: open creates the data directory and a fresh store lists nothing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fresh_store_has_no_detections() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir, 10).await;

    assert!(store.data_dir().is_dir());
    speedtrap_store::health_check(&store).await.unwrap();
    assert!(DetectionRepo::list(&store, None).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test: newest detection comes first and survives a reopen
// ---------------------------------------------------------------------------

#[tokio::test]
async fn detections_are_listed_newest_first() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir, 10).await;

    let first = DetectionRepo::insert(&store, &create("Gate", 50.0)).await.unwrap();
    let second = DetectionRepo::insert(&store, &create("Gate", 72.0)).await.unwrap();
    assert_ne!(first.id, second.id);

    let reopened = open_store(&dir, 10).await;
    let all = DetectionRepo::list(&reopened, None).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, second.id);
    assert_eq!(all[0].reading.speed_kmh, 72.0);
    assert_eq!(all[1].id, first.id);
}

// ---------------------------------------------------------------------------
// Test: list honours the limit, zero means everything
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_applies_limit() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir, 10).await;
    for speed in [10.0, 20.0, 30.0] {
        DetectionRepo::insert(&store, &create("Gate", speed)).await.unwrap();
    }

    let two = DetectionRepo::list(&store, Some(2)).await.unwrap();
    assert_eq!(two.len(), 2);
    assert_eq!(two[0].reading.speed_kmh, 30.0);

    assert_eq!(DetectionRepo::list(&store, Some(0)).await.unwrap().len(), 3);
}

// ---------------------------------------------------------------------------
// Test: stored list is capped at max_detections, dropping the oldest
// ---------------------------------------------------------------------------

#[tokio::test]
async fn oldest_detections_are_trimmed() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir, 3).await;
    for speed in [10.0, 20.0, 30.0, 40.0, 50.0] {
        DetectionRepo::insert(&store, &create("Gate", speed)).await.unwrap();
    }

    let all = DetectionRepo::list(&store, None).await.unwrap();
    let speeds: Vec<f64> = all.iter().map(|d| d.reading.speed_kmh).collect();
    assert_eq!(speeds, vec![50.0, 40.0, 30.0]);
}

// ---------------------------------------------------------------------------
// Test: concurrent inserts do not lose records
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_inserts_are_all_kept() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir, 100).await;

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            DetectionRepo::insert(&store, &create("Gate", i as f64)).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(DetectionRepo::list(&store, None).await.unwrap().len(), 16);
}

// ---------------------------------------------------------------------------
// Test: on-disk record is a flat camelCase object
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stored_detection_is_flat_camel_case_json() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir, 10).await;
    let mut input = create("Gate", 72.0);
    input.image = Some("data:image/jpeg;base64,AAAA".to_string());
    DetectionRepo::insert(&store, &input).await.unwrap();

    let raw = std::fs::read_to_string(store.detections_path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();

    let record = &json[0];
    assert_eq!(record["alarmName"], "Gate");
    assert_eq!(record["speedKmh"], 72.0);
    assert_eq!(record["timeDiffMs"], 500);
    assert_eq!(record["firstEvent"]["device"], "cam-1");
    assert_eq!(record["image"], "data:image/jpeg;base64,AAAA");
    assert!(record["id"].is_string());
    assert!(record["timestamp"].is_string());
}

// ---------------------------------------------------------------------------
// Test: a corrupt detections file is reported, not silently replaced
// ---------------------------------------------------------------------------

#[tokio::test]
async fn corrupt_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir, 10).await;
    std::fs::write(store.detections_path(), "{ not json").unwrap();

    let result = DetectionRepo::list(&store, None).await;
    assert!(matches!(result, Err(speedtrap_store::StoreError::Json { .. })));
}
