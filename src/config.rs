//! Command-line configuration for proxy address prediction.

use std::fmt;
use std::str::FromStr;

use alloy::transports::http::reqwest::Url;
use clap::Parser;

use crate::crypto::{Address, AddressError, SaltVariant, Word, WordError};
use crate::predict::Backend;

/// Upper bound on `--count`; every result is kept in memory and printed.
pub const MAX_SWEEP: u64 = 1_000_000;

/// Safe proxy address predictor
///
/// Computes the address SafeProxyFactory will deploy a proxy at, for
/// createProxyWithNonce, createProxyWithCallback (--callback) or
/// createChainSpecificProxyWithNonce (--chain-id).
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// SafeProxyFactory address (20 bytes, hex with or without 0x)
    #[arg(long)]
    pub factory: String,

    /// Safe singleton (implementation) address
    #[arg(long)]
    pub singleton: String,

    /// Initializer calldata (hex), usually the Safe setup() call
    #[arg(short, long, default_value = "0x")]
    pub initializer: String,

    /// Salt nonce (decimal, or hex with 0x); first nonce when --count > 1
    #[arg(short, long, default_value = "0")]
    pub nonce: String,

    /// Callback address passed to createProxyWithCallback
    #[arg(long, conflicts_with = "chain_id")]
    pub callback: Option<String>,

    /// Chain id for createChainSpecificProxyWithNonce (decimal or 0x hex)
    #[arg(long)]
    pub chain_id: Option<String>,

    /// Address derivation backend of the target chain: standard or zksync
    #[arg(short, long, default_value = "standard")]
    pub backend: Backend,

    /// JSON-RPC endpoint to read proxyCreationCode() from
    #[arg(long, required_unless_present = "creation_code", conflicts_with = "creation_code")]
    pub rpc_url: Option<String>,

    /// proxyCreationCode() bytes (hex), for offline prediction
    #[arg(long)]
    pub creation_code: Option<String>,

    /// Number of consecutive nonces to predict
    #[arg(long, default_value = "1")]
    pub count: u64,

    /// Number of worker threads for sweeps (default: number of CPU cores)
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Address observed after deployment; exit with status 2 if the prediction differs
    #[arg(long)]
    pub expect: Option<String>,

    /// Report whether code already exists at the predicted address(es)
    #[arg(long, requires = "rpc_url")]
    pub check_deployed: bool,

    /// Progress report interval in seconds
    #[arg(short = 'r', long, default_value = "5")]
    pub report_interval: u64,

    /// Log output format: pretty or json
    #[arg(long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Where the proxy creation code is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeSource {
    Rpc(Url),
    Static(Vec<u8>),
}

/// Validated, typed view of [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub factory: Address,
    pub singleton: Address,
    pub initializer: Vec<u8>,
    pub nonce: Word,
    pub variant: SaltVariant,
    pub backend: Backend,
    pub source: CodeSource,
    pub count: u64,
    pub expect: Option<Address>,
    pub check_deployed: bool,
}

impl Config {
    /// Returns the number of workers, defaulting to CPU count.
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(num_cpus::get)
    }

    /// Validates the configuration and parses every field.
    pub fn validate(&self) -> Result<Request, ConfigError> {
        let factory = parse_address("factory", &self.factory)?;
        let singleton = parse_address("singleton", &self.singleton)?;
        let initializer = parse_hex("initializer", &self.initializer)?;
        let nonce = parse_word("nonce", &self.nonce)?;

        let variant = match (&self.callback, &self.chain_id) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::InvalidConfig(
                    "--callback and --chain-id cannot be combined".into(),
                ))
            }
            (Some(callback), None) => SaltVariant::Callback(parse_address("callback", callback)?),
            (None, Some(chain_id)) => SaltVariant::ChainSpecific(parse_word("chain_id", chain_id)?),
            (None, None) => SaltVariant::Plain,
        };

        let source = match (&self.rpc_url, &self.creation_code) {
            (Some(url), None) => CodeSource::Rpc(
                Url::parse(url)
                    .map_err(|e| ConfigError::InvalidConfig(format!("rpc_url: {}", e)))?,
            ),
            (None, Some(code)) => {
                let code = parse_hex("creation_code", code)?;
                if code.is_empty() {
                    return Err(ConfigError::InvalidConfig(
                        "creation_code cannot be empty".into(),
                    ));
                }
                CodeSource::Static(code)
            }
            _ => {
                return Err(ConfigError::InvalidConfig(
                    "exactly one of --rpc-url or --creation-code is required".into(),
                ))
            }
        };

        if self.check_deployed && !matches!(source, CodeSource::Rpc(_)) {
            return Err(ConfigError::InvalidConfig(
                "--check-deployed needs --rpc-url".into(),
            ));
        }

        if self.count == 0 || self.count > MAX_SWEEP {
            return Err(ConfigError::InvalidConfig(format!(
                "count must be between 1 and {}",
                MAX_SWEEP
            )));
        }

        if self.workers == Some(0) {
            return Err(ConfigError::InvalidConfig("workers must be at least 1".into()));
        }

        let expect = self
            .expect
            .as_deref()
            .map(|s| parse_address("expect", s))
            .transpose()?;
        if expect.is_some() && self.count != 1 {
            return Err(ConfigError::InvalidConfig(
                "--expect checks a single prediction; drop --count".into(),
            ));
        }

        Ok(Request {
            factory,
            singleton,
            initializer,
            nonce,
            variant,
            backend: self.backend,
            source,
            count: self.count,
            expect,
            check_deployed: self.check_deployed,
        })
    }
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, ConfigError> {
    value
        .parse()
        .map_err(|source| ConfigError::InvalidAddress { field, source })
}

fn parse_word(field: &'static str, value: &str) -> Result<Word, ConfigError> {
    value
        .parse()
        .map_err(|source| ConfigError::InvalidNumber { field, source })
}

fn parse_hex(field: &'static str, value: &str) -> Result<Vec<u8>, ConfigError> {
    let h = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(h).map_err(|source| ConfigError::InvalidHex { field, source })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid {field}: {source}")]
    InvalidAddress {
        field: &'static str,
        source: AddressError,
    },
    #[error("Invalid {field}: {source}")]
    InvalidNumber {
        field: &'static str,
        source: WordError,
    },
    #[error("Invalid {field}: {source}")]
    InvalidHex {
        field: &'static str,
        source: hex::FromHexError,
    },
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
