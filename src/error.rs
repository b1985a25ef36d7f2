use std::io;

/// Degenerate sensor vectors, the tick is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OrientationError{
    #[error("undefined orientation: gravity and magnetic field are degenerate or collinear")]
    Undefined,
}

/// Rejected control-surface actions. The session is left untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError{
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("invalid sensitivity {0}: must be a finite value >= 0")]
    InvalidSensitivity(f32),
}

/// Failure of a single datagram send. Only ever logged.
#[derive(Debug, thiserror::Error)]
pub enum TransmitError{
    #[error("failed to resolve {host}: {source}")]
    Resolve{
        host: String,
        #[source]
        source: io::Error,
    },
    #[error("{0} resolved to no usable address")]
    NoAddress(String),
    #[error("send failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError{
    #[error("payload is not valid utf-8")]
    NotUtf8,
    #[error("expected \"<int>,<int>\", got {0:?}")]
    Malformed(String),
    #[error("motor value {0} outside [-100, 100]")]
    OutOfRange(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError{
    #[error("{var} has invalid value {value:?}")]
    InvalidValue{ var: &'static str, value: String },
}
