use std::fmt;

/// Error types for the telemetry pipeline
#[derive(Debug)]
pub enum TelemetryError {
    /// I/O errors on the serial stream or the upload mirror
    Io(std::io::Error),
    /// Structured payload could not be (de)serialized
    Json(serde_json::Error),
    /// Radio payload that does not follow the delimited wire format
    MalformedPacket(String),
    /// Serial line whose payload after the stream tag failed to parse
    MalformedRecord(String),
    /// Radio module failed to come up; fatal for the node
    LinkUnavailable(String),
    /// Upload collaborator rejected a document or image
    Upload(String),
    /// Export format error
    Export(String),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::Io(err) => write!(f, "I/O error: {}", err),
            TelemetryError::Json(err) => write!(f, "JSON error: {}", err),
            TelemetryError::MalformedPacket(msg) => write!(f, "Malformed packet: {}", msg),
            TelemetryError::MalformedRecord(msg) => write!(f, "Malformed record: {}", msg),
            TelemetryError::LinkUnavailable(msg) => write!(f, "Radio link unavailable: {}", msg),
            TelemetryError::Upload(msg) => write!(f, "Upload failed: {}", msg),
            TelemetryError::Export(msg) => write!(f, "Export error: {}", msg),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::Io(err) => Some(err),
            TelemetryError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        TelemetryError::Io(err)
    }
}

impl From<serde_json::Error> for TelemetryError {
    fn from(err: serde_json::Error) -> Self {
        TelemetryError::Json(err)
    }
}

#[cfg(feature = "csv")]
impl From<csv::Error> for TelemetryError {
    fn from(err: csv::Error) -> Self {
        TelemetryError::Export(err.to_string())
    }
}

impl TelemetryError {
    /// True for errors that end the node's main loop instead of being dropped and logged
    pub fn is_fatal(&self) -> bool {
        matches!(self, TelemetryError::LinkUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, TelemetryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_link_failure_is_fatal() {
        assert!(TelemetryError::LinkUnavailable("init".into()).is_fatal());
        assert!(!TelemetryError::MalformedPacket("abc".into()).is_fatal());
        assert!(!TelemetryError::MalformedRecord("{".into()).is_fatal());
    }

    #[test]
    fn test_display_carries_context() {
        let err = TelemetryError::MalformedPacket("missing delimiter in 'abc'".into());
        assert_eq!(err.to_string(), "Malformed packet: missing delimiter in 'abc'");
    }
}
