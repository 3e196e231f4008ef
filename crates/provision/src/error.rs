use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("openclaw.json not found: {}", path.display())]
    MissingDocument { path: PathBuf },
    #[error("command failed ({status}): {command}")]
    CommandFailed {
        command: String,
        status: String,
        stdout: String,
        stderr: String,
    },
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("verification reply is not valid JSON: {source}")]
    MalformedPayload {
        #[source]
        source: serde_json::Error,
    },
    #[error("{}expected `{section}` to be {expected}", location(path.as_deref()))]
    MalformedDocument {
        path: Option<PathBuf>,
        section: String,
        expected: &'static str,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    /// A section of the document exists but holds the wrong JSON type.
    #[must_use]
    pub fn malformed(section: &[&str], expected: &'static str) -> Self {
        Self::MalformedDocument {
            path: None,
            section: section.join("."),
            expected,
        }
    }

    /// Attach the file path to errors raised while the document was detached
    /// from disk.
    #[must_use]
    pub fn at_path(self, file: impl Into<PathBuf>) -> Self {
        match self {
            Self::MalformedDocument {
                path: None,
                section,
                expected,
            } => Self::MalformedDocument {
                path: Some(file.into()),
                section,
                expected,
            },
            other => other,
        }
    }
}

fn location(path: Option<&std::path::Path>) -> String {
    path.map(|p| format!("{}: ", p.display()))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;
