//! Simulates a ball getting stuck against a pole and the resulting uploads
//!
//! Run with `cargo run --example clog_pipeline`; set `RUST_LOG=debug` to see
//! every radio and serial message.

use pole_telemetry::*;
use std::io::Cursor;

fn main() -> Result<()> {
    let (ball_radio, pole_radio) = LoopbackRadio::pair("ball", "pole");
    let mut ball = BallNode::start(ball_radio, MotionConfig::default())?;
    let mut gateway = GatewayNode::start(
        pole_radio,
        Vec::new(),
        Box::new(FixedEnvironment(EnvReading {
            temperature: SensorValue::Reading(30.2),
            humidity: SensorValue::Reading(74.0),
            air_quality: SensorValue::Reading(35.0),
            noise_level: SensorValue::Reading(58.0),
        })),
        Box::new(LogDisplay),
        GatewayConfig::default(),
    )?;

    // Raw accelerometer counts: rolling down the drain, then lodged
    let rolling = AccelSample::from_raw_counts(9_000, -4_000, 19_000);
    let lodged = AccelSample::from_raw_counts(120, -80, 16_300);

    let mut gps = NmeaPositionSource::new();
    gps.feed(b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n");

    for now in (0..=15_000u64).step_by(100) {
        let sample = if now < 3_000 { rolling } else { lodged };
        let tick = ball.tick(now, sample, &gps.poll())?;
        if let Some(alert) = tick.alert {
            println!("{now:>6} ms  ball alert: {alert:?}");
        }
        if let Some(ack) = tick.ack {
            println!("{now:>6} ms  ball got ACK for {}", ack.sequence);
        }
        gateway.tick(now)?;
    }

    let serial = gateway.into_serial();
    print!("serial stream:\n{}", String::from_utf8_lossy(&serial));

    let frame: Vec<u8> = (0..400).map(|i| if i % 3 == 0 { 20 } else { 180 }).collect();
    let mut uplink = UplinkNode::new(
        QueuedFrames::new([ImageBuffer::new(frame)]),
        MemoryUploadSink::new(),
        ClogConfig::default(),
        UploadOptions::default(),
    );
    SerialDemultiplexer::new(Cursor::new(serial)).run(&mut uplink)?;

    println!("last clog check: {:?}", uplink.last_confirmation());
    for upload in &uplink.uploads().uploads {
        println!("uploaded {}", upload.path());
    }
    Ok(())
}
