//! End-to-end tests for the sensor → gateway → uplink pipeline
//!
//! Tests the three node loops wired together:
//! - Stationary ball raises one event, acknowledged over the loopback radio
//! - Gateway serial stream interleaves positional and environmental records
//! - Uplink mirrors uploads on disk and stores confirmed clog images
//! - Alerts without a position fix travel as `no_data` records

use pole_telemetry::*;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tempfile::TempDir;

const AT_REST: AccelSample = AccelSample {
    x: 0.01,
    y: -0.02,
    z: 0.99,
};

fn environment() -> FixedEnvironment {
    FixedEnvironment(EnvReading {
        temperature: SensorValue::Reading(29.5),
        humidity: SensorValue::Reading(78.0),
        air_quality: SensorValue::from_reading(f32::NAN),
        noise_level: SensorValue::Reading(64.0),
    })
}

/// Run ball and gateway side by side for `duration_ms`, returning the serial bytes
fn run_pair(fix: &PositionFix, duration_ms: u64) -> (BallNode<LoopbackRadio>, Vec<u8>) {
    let (ball_radio, pole_radio) = LoopbackRadio::pair("ball", "pole");
    let mut ball = BallNode::start(ball_radio, MotionConfig::default()).expect("ball starts");
    let mut gateway = GatewayNode::start(
        pole_radio,
        Vec::new(),
        Box::new(environment()),
        Box::new(LogDisplay),
        GatewayConfig::default(),
    )
    .expect("gateway starts");

    for now in (0..=duration_ms).step_by(100) {
        ball.tick(now, AT_REST, fix).expect("ball tick");
        gateway.tick(now).expect("gateway tick");
    }
    (ball, gateway.into_serial())
}

fn jsonl_documents(path: &Path) -> Vec<serde_json::Value> {
    fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"))
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid JSON line"))
        .collect()
}

#[test]
fn test_stationary_ball_reaches_uplink_once() {
    let fix = PositionFix::at(6.927079, 79.861244);
    let (ball, serial) = run_pair(&fix, 12_000);

    // One alert for the whole episode, and its ACK made it back
    assert_eq!(ball.trigger().fired_count(), 1);
    assert_eq!(ball.sender().acked(), 1);
    assert_eq!(ball.sender().awaiting_ack(), None);

    let text = String::from_utf8(serial.clone()).expect("serial is UTF-8");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            r#"GPS:{"latitude":6.927079,"longitude":79.861244}"#,
            r#"ENV:{"temperature":29.5,"humidity":78.0,"air_quality":"N/A","noise_level":64.0}"#,
            r#"ENV:{"temperature":29.5,"humidity":78.0,"air_quality":"N/A","noise_level":64.0}"#,
        ]
    );

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let uploads = FileUploadSink::new(temp_dir.path()).expect("upload mirror");
    let dark_frame = ImageBuffer::new(vec![12u8; 320]);
    let mut uplink = UplinkNode::new(
        QueuedFrames::new([dark_frame]),
        uploads,
        ClogConfig::default(),
        UploadOptions::default(),
    );

    let stats = SerialDemultiplexer::new(Cursor::new(serial))
        .run(&mut uplink)
        .expect("demux runs");
    assert_eq!(stats.positional, 1);
    assert_eq!(stats.environmental, 2);
    assert_eq!(uplink.stats().confirmed, 1);

    let device_dir = temp_dir.path().join("smartpole").join("esp32cam001");
    let lora = jsonl_documents(&device_dir.join("lora.jsonl"));
    assert_eq!(lora, vec![serde_json::json!({"latitude": 6.927079, "longitude": 79.861244})]);
    let env = jsonl_documents(&device_dir.join("environmental.jsonl"));
    assert_eq!(env.len(), 2);
    assert_eq!(env[0]["air_quality"], "N/A");

    let images: Vec<_> = fs::read_dir(temp_dir.path().join("clog_images"))
        .expect("image directory created")
        .map(|entry| entry.expect("dir entry").path())
        .collect();
    assert_eq!(images.len(), 1);
    let name = images[0].file_name().and_then(|n| n.to_str()).unwrap_or_default();
    assert!(name.starts_with("img_") && name.ends_with(".jpg"), "unexpected image name {name}");
    assert_eq!(fs::read(&images[0]).unwrap().len(), 320);
}

#[test]
fn test_replayed_confirmations_each_land_on_disk() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let uploads = FileUploadSink::new(temp_dir.path()).expect("upload mirror");
    let dark = || ImageBuffer::new(vec![5u8; 48]);
    let mut uplink = UplinkNode::new(
        QueuedFrames::new([dark(), dark(), dark()]),
        uploads,
        ClogConfig::default(),
        UploadOptions::default(),
    );

    let capture = "GPS:{\"latitude\":6.9,\"longitude\":79.8}\n\
                   GPS:{\"latitude\":6.91,\"longitude\":79.81}\n\
                   GPS:{\"status\":\"no_data\"}\n";
    SerialDemultiplexer::new(Cursor::new(capture))
        .run(&mut uplink)
        .expect("demux runs");

    assert_eq!(uplink.stats().confirmed, 3);
    assert_eq!(uplink.uploads().blobs(), 3);
    let on_disk = fs::read_dir(temp_dir.path().join("clog_images"))
        .expect("image directory created")
        .count();
    assert_eq!(on_disk, 3);
}

#[test]
fn test_alert_without_fix_travels_as_no_data() {
    let (ball, serial) = run_pair(&PositionFix::invalid(), 5_000);

    assert_eq!(ball.trigger().fired_count(), 1);
    assert_eq!(ball.sender().next_sequence(), 0);
    let text = String::from_utf8(serial.clone()).unwrap();
    assert_eq!(text, "GPS:{\"status\":\"no_data\"}\nENV:{\"temperature\":29.5,\"humidity\":78.0,\"air_quality\":\"N/A\",\"noise_level\":64.0}\n");

    let mut uplink = UplinkNode::new(
        NoCamera,
        MemoryUploadSink::new(),
        ClogConfig::default(),
        UploadOptions::default(),
    );
    SerialDemultiplexer::new(Cursor::new(serial))
        .run(&mut uplink)
        .unwrap();

    // Confirmation was attempted for the status record even though there is no camera
    assert_eq!(uplink.stats().no_sample, 1);
    let lora: Vec<_> = uplink.uploads().under("/smartpole/esp32cam001/lora").collect();
    assert_eq!(
        lora,
        vec![&Upload::Json {
            path: "/smartpole/esp32cam001/lora".to_string(),
            document: serde_json::json!({"status": "no_data"}),
        }]
    );
}

#[test]
fn test_gateway_refuses_to_start_without_radio() {
    let result = GatewayNode::start(
        LoopbackRadio::offline("pole"),
        Vec::new(),
        Box::new(environment()),
        Box::new(LogDisplay),
        GatewayConfig::default(),
    );
    match result {
        Err(TelemetryError::LinkUnavailable(msg)) => assert!(msg.contains("pole")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("gateway started without a radio"),
    }
}

#[test]
fn test_capture_with_noise_and_bad_records() {
    let capture = "Setup complete\n\
                   GPS:{\"latitude\":6.9,\"longitude\":79.8}\n\
                   Environmental data sent.\n\
                   ENV:{\"temperature\":\n\
                   GPS:{\"status\":\"no_data\"}\n";
    let mut log = RecordLog::default();
    let stats = SerialDemultiplexer::new(Cursor::new(capture))
        .run(&mut log)
        .unwrap();

    assert_eq!(stats.lines, 5);
    assert_eq!(stats.ignored, 2);
    assert_eq!(stats.malformed, 1);
    assert_eq!(log.records.len(), 2);
    assert_eq!(log.records[1], TaggedRecord::Gps(GpsRecord::no_data()));
}
