use std::fmt;

use crate::client::ClientError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AppErrorKind {
    Network,
    Decode,
    Config,
    Navigation,
}

impl AppErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            AppErrorKind::Network => "network",
            AppErrorKind::Decode => "decode",
            AppErrorKind::Config => "config",
            AppErrorKind::Navigation => "navigation",
        }
    }
}

/// Recoverable failure surfaced to the status line. Never fatal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppError {
    pub kind: AppErrorKind,
    pub message: String,
}

impl AppError {
    pub fn new(kind: AppErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind.label(), self.message)
    }
}

impl From<&ClientError> for AppError {
    fn from(err: &ClientError) -> Self {
        let kind = match err {
            ClientError::Decode(_) => AppErrorKind::Decode,
            ClientError::Request(_) | ClientError::Status { .. } => AppErrorKind::Network,
        };
        AppError::new(kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind() {
        let err = AppError::new(AppErrorKind::Network, "connection refused");
        assert_eq!(err.to_string(), "network error: connection refused");
    }

    #[test]
    fn client_errors_map_to_kinds() {
        let decode = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = AppError::from(&ClientError::Decode(decode));
        assert_eq!(err.kind, AppErrorKind::Decode);

        let status = ClientError::Status {
            status: 503,
            body: "busy".into(),
        };
        let err = AppError::from(&status);
        assert_eq!(err.kind, AppErrorKind::Network);
        assert!(err.message.contains("503"));
    }
}
