use std::fmt;

/// The closed set of failure categories an adapter can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Nothing was said within the listening window.
    Timeout,
    /// Audio was captured but could not be turned into text.
    Unintelligible,
    /// A transcription came back with an empty result set.
    NoSpeechDetected,
    /// Network, HTTP status or service failure.
    UpstreamError,
    /// The backend answered with a payload of an unexpected shape.
    MalformedResponse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::Unintelligible => "unintelligible",
            ErrorKind::NoSpeechDetected => "no speech detected",
            ErrorKind::UpstreamError => "upstream error",
            ErrorKind::MalformedResponse => "malformed response",
        };
        f.write_str(name)
    }
}

/// Adapter-internal failure. The `Display` text is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    #[error("No speech detected within {seconds} seconds. Please try again.")]
    Timeout { seconds: u64 },
    #[error("Sorry, I could not understand the audio. Please try again.")]
    Unintelligible,
    #[error("No speech was detected in the uploaded audio.")]
    NoSpeechDetected,
    #[error("Error: {0}")]
    Upstream(String),
    #[error("Error: {0}")]
    Malformed(String),
}

impl AdapterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::Timeout { .. } => ErrorKind::Timeout,
            AdapterError::Unintelligible => ErrorKind::Unintelligible,
            AdapterError::NoSpeechDetected => ErrorKind::NoSpeechDetected,
            AdapterError::Upstream(_) => ErrorKind::UpstreamError,
            AdapterError::Malformed(_) => ErrorKind::MalformedResponse,
        }
    }
}

/// The normalized result of every adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok(String),
    Failed { kind: ErrorKind, detail: String },
}

impl Outcome {
    pub fn ok(text: impl Into<String>) -> Self {
        Outcome::Ok(text.into())
    }

    pub fn failed(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Outcome::Failed {
            kind,
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Failed { kind, .. } => Some(*kind),
        }
    }

    /// The text shown in the transcript: the answer, or the failure detail.
    pub fn display_text(&self) -> &str {
        match self {
            Outcome::Ok(text) => text,
            Outcome::Failed { detail, .. } => detail,
        }
    }

    pub fn into_display_text(self) -> String {
        match self {
            Outcome::Ok(text) => text,
            Outcome::Failed { detail, .. } => detail,
        }
    }
}

impl From<AdapterError> for Outcome {
    fn from(err: AdapterError) -> Self {
        Outcome::Failed {
            kind: err.kind(),
            detail: err.to_string(),
        }
    }
}

impl From<Result<String, AdapterError>> for Outcome {
    fn from(result: Result<String, AdapterError>) -> Self {
        match result {
            Ok(text) => Outcome::Ok(text),
            Err(err) => err.into(),
        }
    }
}
