use std::fmt;

#[derive(Debug)]
pub enum ShipcheckError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (impossible file-count limits, etc.).
    ConfigValidation(String),
    /// Session bundle is not a JSON object of the expected shape.
    BundleParse(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ShipcheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::BundleParse(msg) => write!(f, "bundle parse error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ShipcheckError {}
