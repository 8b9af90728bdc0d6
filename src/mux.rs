//! Serial multiplexer and demultiplexer
//!
//! The gateway interleaves environmental and positional records on one serial
//! line. The receiving node reads a line at a time and hands each record to
//! the matching sink. Bad lines never stop the stream: untagged chatter is
//! skipped and unparseable records are logged and dropped.

use crate::codec::{decode_line, encode_record};
use crate::error::Result;
use crate::types::{EnvReading, GpsRecord, TaggedRecord};
use log::{debug, warn};
use std::io::{BufRead, Write};

/// Writes tagged records, one per line, to a byte stream
#[derive(Debug)]
pub struct SerialMultiplexer<W: Write> {
    writer: W,
    lines_written: u64,
}

impl<W: Write> SerialMultiplexer<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            lines_written: 0,
        }
    }

    /// Serialize `record`, terminate it with a newline and flush
    pub fn send(&mut self, record: &TaggedRecord) -> Result<()> {
        let line = encode_record(record)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.lines_written += 1;
        debug!("Serial sent: {}", line);
        Ok(())
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Downstream consumer of demultiplexed records
pub trait RecordSink {
    fn on_environmental(&mut self, reading: &EnvReading) -> Result<()>;
    fn on_positional(&mut self, record: &GpsRecord) -> Result<()>;
}

/// Where one serial line ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Environmental,
    Positional,
    /// No recognized stream tag
    Ignored,
    /// Tag recognized, payload unparseable
    Malformed,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DemuxStats {
    pub lines: u64,
    pub environmental: u64,
    pub positional: u64,
    pub ignored: u64,
    pub malformed: u64,
    /// Records that parsed but the sink failed to handle
    pub sink_errors: u64,
}

impl DemuxStats {
    fn record(&mut self, dispatch: Dispatch) {
        self.lines += 1;
        match dispatch {
            Dispatch::Environmental => self.environmental += 1,
            Dispatch::Positional => self.positional += 1,
            Dispatch::Ignored => self.ignored += 1,
            Dispatch::Malformed => self.malformed += 1,
        }
    }
}

/// Decode one line and deliver it to `sink`
///
/// A sink error is logged and returned as text alongside the dispatch; the
/// record still counts as dispatched so the stream keeps going.
pub fn dispatch_line<S: RecordSink + ?Sized>(line: &str, sink: &mut S) -> (Dispatch, Option<String>) {
    let record = match decode_line(line) {
        Ok(Some(record)) => record,
        Ok(None) => {
            debug!("Ignoring untagged serial line: {}", line.trim_end());
            return (Dispatch::Ignored, None);
        }
        Err(e) => {
            warn!("Dropping serial line: {}", e);
            return (Dispatch::Malformed, None);
        }
    };

    let (dispatch, outcome) = match &record {
        TaggedRecord::Env(reading) => (Dispatch::Environmental, sink.on_environmental(reading)),
        TaggedRecord::Gps(gps) => (Dispatch::Positional, sink.on_positional(gps)),
    };

    let failure = outcome.err().map(|e| {
        warn!("Sink failed to handle {:?} record: {}", dispatch, e);
        e.to_string()
    });
    (dispatch, failure)
}

/// Reads tagged lines from a byte stream and dispatches them
#[derive(Debug)]
pub struct SerialDemultiplexer<R: BufRead> {
    reader: R,
    buf: String,
    stats: DemuxStats,
}

impl<R: BufRead> SerialDemultiplexer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            stats: DemuxStats::default(),
        }
    }

    pub fn stats(&self) -> DemuxStats {
        self.stats
    }

    /// Read and dispatch one line; `Ok(None)` at end of stream
    pub fn poll_line<S: RecordSink + ?Sized>(&mut self, sink: &mut S) -> Result<Option<Dispatch>> {
        self.buf.clear();
        if self.reader.read_line(&mut self.buf)? == 0 {
            return Ok(None);
        }

        let (dispatch, sink_error) = dispatch_line(&self.buf, sink);
        self.stats.record(dispatch);
        if sink_error.is_some() {
            self.stats.sink_errors += 1;
        }
        Ok(Some(dispatch))
    }

    /// Dispatch every remaining line
    pub fn run<S: RecordSink + ?Sized>(&mut self, sink: &mut S) -> Result<DemuxStats> {
        while self.poll_line(sink)?.is_some() {}
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TelemetryError;
    use crate::types::SensorValue;
    use std::io::Cursor;

    #[derive(Default)]
    struct CollectingSink {
        env: Vec<EnvReading>,
        gps: Vec<GpsRecord>,
        fail_gps: bool,
    }

    impl RecordSink for CollectingSink {
        fn on_environmental(&mut self, reading: &EnvReading) -> Result<()> {
            self.env.push(*reading);
            Ok(())
        }

        fn on_positional(&mut self, record: &GpsRecord) -> Result<()> {
            if self.fail_gps {
                return Err(TelemetryError::Upload("offline".to_string()));
            }
            self.gps.push(record.clone());
            Ok(())
        }
    }

    #[test]
    fn test_env_line_reaches_only_environmental_sink() {
        let mut sink = CollectingSink::default();
        let line = r#"ENV:{"temperature":21.5,"humidity":60,"air_quality":30,"noise_level":55}"#;
        assert_eq!(dispatch_line(line, &mut sink).0, Dispatch::Environmental);
        assert_eq!(sink.env.len(), 1);
        assert_eq!(sink.env[0].temperature, SensorValue::Reading(21.5));
        assert!(sink.gps.is_empty());
    }

    #[test]
    fn test_unknown_prefix_reaches_no_sink() {
        let mut sink = CollectingSink::default();
        assert_eq!(dispatch_line("XYZ:{\"a\":1}", &mut sink).0, Dispatch::Ignored);
        assert_eq!(dispatch_line("GPS:{broken", &mut sink).0, Dispatch::Malformed);
        assert!(sink.env.is_empty() && sink.gps.is_empty());
    }

    #[test]
    fn test_mux_output_demuxes_back() {
        let mut mux = SerialMultiplexer::new(Vec::new());
        mux.send(&TaggedRecord::Gps(GpsRecord::Position {
            latitude: 6.927079,
            longitude: 79.861244,
        }))
        .unwrap();
        mux.send(&TaggedRecord::Env(EnvReading::default())).unwrap();
        mux.send(&TaggedRecord::Gps(GpsRecord::no_data())).unwrap();
        assert_eq!(mux.lines_written(), 3);

        let bytes = mux.into_inner();
        assert!(bytes.ends_with(b"\n"));

        let mut sink = CollectingSink::default();
        let mut demux = SerialDemultiplexer::new(Cursor::new(bytes));
        let stats = demux.run(&mut sink).unwrap();
        assert_eq!(stats.positional, 2);
        assert_eq!(stats.environmental, 1);
        assert_eq!(sink.gps[1], GpsRecord::no_data());
        assert_eq!(sink.env[0].noise_level, SensorValue::Unavailable);
    }

    #[test]
    fn test_sink_error_does_not_stop_stream() {
        let input = "GPS:{\"status\":\"no_data\"}\nboot chatter\nENV:{\"temperature\":20}\n";
        let mut sink = CollectingSink {
            fail_gps: true,
            ..Default::default()
        };
        let mut demux = SerialDemultiplexer::new(Cursor::new(input));
        let stats = demux.run(&mut sink).unwrap();
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.sink_errors, 1);
        assert_eq!(stats.ignored, 1);
        assert_eq!(sink.env.len(), 1);
    }
}
