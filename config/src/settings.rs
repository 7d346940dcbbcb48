//! Service settings read from `VECTORIZER_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use vectorizer::ModelType;

use crate::LoadError;

pub const ENV_MODEL_URL: &str = "VECTORIZER_MODEL_URL";
pub const ENV_TEMP_DIR: &str = "VECTORIZER_TEMP_DIR";
pub const ENV_MAX_IN_FLIGHT: &str = "VECTORIZER_MAX_IN_FLIGHT";
pub const ENV_BATCH_SIZE: &str = "VECTORIZER_BATCH_SIZE";
pub const ENV_STREAM_BUFFER: &str = "VECTORIZER_STREAM_BUFFER";
pub const ENV_ADDR: &str = "VECTORIZER_ADDR";
pub const ENV_BACKEND: &str = "VECTORIZER_BACKEND";
pub const ENV_OPENAI_BASE_URL: &str = "VECTORIZER_OPENAI_BASE_URL";
pub const ENV_HASHING_DIMENSION: &str = "VECTORIZER_HASHING_DIMENSION";
pub const ENV_LOG_DIR: &str = "VECTORIZER_LOG_DIR";

const DEFAULT_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_HASHING_DIMENSION: usize = 384;

/// Inference backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// OpenAI-compatible embeddings endpoint.
    OpenAi,
    /// Offline feature hashing; no network, deterministic.
    Hashing,
}

impl FromStr for Backend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Backend::OpenAi),
            "hashing" => Ok(Backend::Hashing),
            _ => Err(()),
        }
    }
}

/// Everything the binary needs to build and serve an embedding service.
#[derive(Clone, Debug)]
pub struct Settings {
    pub model_url: String,
    pub temp_dir: PathBuf,
    pub max_in_flight: usize,
    pub batch_size: usize,
    pub stream_buffer: usize,
    pub addr: SocketAddr,
    pub backend: Backend,
    pub openai_base_url: Option<String>,
    pub hashing_dimension: usize,
    pub log_dir: Option<PathBuf>,
}

fn invalid(key: &str, value: &str) -> LoadError {
    LoadError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Parses a capacity-like value; zero is rejected.
fn positive(key: &str, raw: Option<String>, default: usize) -> Result<usize, LoadError> {
    match raw {
        None => Ok(default),
        Some(v) => match v.trim().parse::<usize>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(invalid(key, &v)),
        },
    }
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, LoadError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LoadError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let model_url = get(ENV_MODEL_URL)
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|| ModelType::AllMiniLmL12V2.descriptor().source_uri.to_string());
        let temp_dir = get(ENV_TEMP_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("vectorizer-models"));

        let max_in_flight = positive(
            ENV_MAX_IN_FLIGHT,
            get(ENV_MAX_IN_FLIGHT),
            vectorizer::service::DEFAULT_MAX_IN_FLIGHT,
        )?;
        let batch_size = positive(
            ENV_BATCH_SIZE,
            get(ENV_BATCH_SIZE),
            vectorizer::dispatch::DEFAULT_BATCH_SIZE,
        )?;
        let stream_buffer = positive(
            ENV_STREAM_BUFFER,
            get(ENV_STREAM_BUFFER),
            vectorizer::dispatch::DEFAULT_STREAM_BUFFER,
        )?;
        let hashing_dimension = positive(
            ENV_HASHING_DIMENSION,
            get(ENV_HASHING_DIMENSION),
            DEFAULT_HASHING_DIMENSION,
        )?;

        let addr_raw = get(ENV_ADDR).unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| invalid(ENV_ADDR, &addr_raw))?;

        let backend = match get(ENV_BACKEND) {
            None => Backend::OpenAi,
            Some(v) => v.parse().map_err(|_| invalid(ENV_BACKEND, &v))?,
        };

        Ok(Self {
            model_url,
            temp_dir,
            max_in_flight,
            batch_size,
            stream_buffer,
            addr,
            backend,
            openai_base_url: get(ENV_OPENAI_BASE_URL),
            hashing_dimension,
            log_dir: get(ENV_LOG_DIR).map(PathBuf::from),
        })
    }

    /// Limiter, partition and default-model options for the embedding service.
    pub fn service_options(&self) -> vectorizer::ServiceOptions {
        let mut options = vectorizer::ServiceOptions::new(self.model_url.clone());
        options.max_in_flight = self.max_in_flight;
        options.batch_size = self.batch_size;
        options.stream_buffer = self.stream_buffer;
        options
    }
}
