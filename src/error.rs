/// Broad failure category. Each kind maps to a stable process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Invalid CLI flags or environment.
    Config,
    /// Export / chart file could not be written or read.
    Io,
    /// A fetch or normalize step produced zero usable rows.
    EmptyResult,
    /// The price and weather series share no dates.
    EmptyJoin,
    /// Upstream HTTP failure (connect, status). Never retried.
    Transport,
    /// A response body or a date token could not be decoded.
    MalformedData,
    /// Terminal setup or drawing failed.
    Terminal,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Config | ErrorKind::Io => 2,
            ErrorKind::EmptyResult => 3,
            ErrorKind::Transport | ErrorKind::MalformedData | ErrorKind::Terminal => 4,
            ErrorKind::EmptyJoin => 5,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn empty_result(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EmptyResult, message)
    }

    pub fn empty_join(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EmptyJoin, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedData, message)
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Terminal, message)
    }

    /// Prefix the message with caller context (e.g. commodity and date range).
    pub fn with_context(mut self, context: impl std::fmt::Display) -> Self {
        self.message = format!("[{context}] {}", self.message);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("exit_code", &self.exit_code())
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_prefixed_and_kind_preserved() {
        let err = AppError::empty_join("No overlapping dates.")
            .with_context("commodity=sugar range=2024-01-01..2024-12-31");
        assert_eq!(err.kind(), ErrorKind::EmptyJoin);
        assert_eq!(err.exit_code(), 5);
        assert_eq!(
            err.to_string(),
            "[commodity=sugar range=2024-01-01..2024-12-31] No overlapping dates."
        );
    }
}
