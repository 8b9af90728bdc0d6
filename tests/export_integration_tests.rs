//! Integration tests for export functionality
//!
//! Tests the export layer across different scenarios:
//! - CSV export with directory creation
//! - Output directory defaulting to input parent
//! - Placeholder cells for unavailable sensors
//! - File upload mirror layout

use pole_telemetry::*;
use std::fs;
use tempfile::TempDir;

fn records() -> Vec<TaggedRecord> {
    vec![
        TaggedRecord::Env(EnvReading {
            temperature: SensorValue::Reading(21.5),
            humidity: SensorValue::Reading(60.0),
            air_quality: SensorValue::Unavailable,
            noise_level: SensorValue::Reading(48.0),
        }),
        TaggedRecord::Gps(GpsRecord::Position {
            latitude: 6.927079,
            longitude: 79.861244,
        }),
        TaggedRecord::Gps(GpsRecord::no_data()),
    ]
}

#[test]
fn test_export_csv_creates_output_directory() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let nonexistent_dir = temp_dir.path().join("nonexistent").join("output");
    let capture_path = temp_dir.path().join("serial.log");

    let export_opts = ExportOptions {
        csv: true,
        output_dir: Some(nonexistent_dir.to_str().unwrap().to_string()),
    };

    let report = export_records_csv(&records(), &capture_path, &export_opts)
        .expect("CSV export should succeed and create directories");

    assert!(nonexistent_dir.exists(), "Output directory should be created");
    assert_eq!(report.env_csv_path, Some(nonexistent_dir.join("serial.env.csv")));
    assert_eq!(report.gps_csv_path, Some(nonexistent_dir.join("serial.gps.csv")));
}

#[test]
fn test_export_csv_defaults_to_input_parent() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let capture_path = temp_dir.path().join("pole7.log");

    let export_opts = ExportOptions {
        csv: true,
        output_dir: None,
    };
    export_records_csv(&records(), &capture_path, &export_opts).expect("CSV export should succeed");

    let env = fs::read_to_string(temp_dir.path().join("pole7.env.csv")).unwrap();
    assert_eq!(
        env,
        "index,temperature,humidity,air_quality,noise_level\n0,21.5,60,N/A,48\n"
    );

    let gps = fs::read_to_string(temp_dir.path().join("pole7.gps.csv")).unwrap();
    assert_eq!(
        gps,
        "index,latitude,longitude,status\n1,6.927079,79.861244,\n2,,,no_data\n"
    );
}

#[test]
fn test_export_csv_without_records_writes_headers_only() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let export_opts = ExportOptions {
        csv: true,
        output_dir: None,
    };
    let report = export_records_csv(&[], &temp_dir.path().join("empty.log"), &export_opts).unwrap();

    let gps_path = report.gps_csv_path.expect("gps CSV written");
    assert_eq!(
        fs::read_to_string(gps_path).unwrap(),
        "index,latitude,longitude,status\n"
    );
}

#[test]
fn test_file_upload_sink_layout() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut sink = FileUploadSink::new(temp_dir.path().join("mirror")).unwrap();
    let paths = UploadOptions {
        device_id: "cam42".to_string(),
    };

    sink.put_json(&paths.lora_path(), &serde_json::json!({"status": "no_data"}))
        .unwrap();
    sink.put_json(&paths.lora_path(), &serde_json::json!({"latitude": 1.5, "longitude": 2.5}))
        .unwrap();
    sink.put_bytes(&paths.image_path(777, 3), &[1, 2, 3], "image/jpeg")
        .unwrap();

    let lora = fs::read_to_string(temp_dir.path().join("mirror/smartpole/cam42/lora.jsonl")).unwrap();
    assert_eq!(
        lora,
        "{\"status\":\"no_data\"}\n{\"latitude\":1.5,\"longitude\":2.5}\n"
    );
    assert_eq!(
        fs::read(temp_dir.path().join("mirror/clog_images/img_777_3.jpg")).unwrap(),
        vec![1, 2, 3]
    );
    assert_eq!(sink.documents(), 2);
    assert_eq!(sink.blobs(), 1);
}
