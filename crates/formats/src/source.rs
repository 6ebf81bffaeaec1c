//! Asynchronous record/boundary sources and the initial dataset join.
//!
//! Both sources are started together and awaited as one outcome: the first
//! failure aborts the load and the other result is discarded. No retries.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use futures_util::future::try_join;
use scene::{BoundaryFeature, Dataset, Record};
use tracing::{error, info};

use crate::boundaries::{BoundaryError, BoundarySchema, parse_boundaries};
use crate::records::{CsvRecordError, RecordSchema, parse_records};

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// The source could not be read at all.
    Unavailable,
    /// The payload was read but could not be decoded.
    Malformed,
    /// The payload decoded but lacks the expected named collection/columns.
    SchemaMismatch,
}

/// Error type for data source operations.
#[derive(Debug)]
pub struct DataSourceError {
    pub kind: SourceErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for DataSourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl DataSourceError {
    pub fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        kind: SourceErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<CsvRecordError> for DataSourceError {
    fn from(e: CsvRecordError) -> Self {
        let kind = match e {
            CsvRecordError::MissingColumn { .. } => SourceErrorKind::SchemaMismatch,
            CsvRecordError::Csv(_) => SourceErrorKind::Malformed,
        };
        Self::with_source(kind, format!("records: {e}"), e)
    }
}

impl From<BoundaryError> for DataSourceError {
    fn from(e: BoundaryError) -> Self {
        let kind = match e {
            BoundaryError::MissingObject { .. } => SourceErrorKind::SchemaMismatch,
            _ => SourceErrorKind::Malformed,
        };
        Self::with_source(kind, format!("boundaries: {e}"), e)
    }
}

/// Supplies the full record collection once.
pub trait RecordSource: Send + Sync {
    fn load_records(&self) -> BoxFuture<'_, Result<Vec<Record>, DataSourceError>>;
}

/// Supplies the named boundary regions once.
pub trait BoundarySource: Send + Sync {
    fn load_boundaries(&self) -> BoxFuture<'_, Result<Vec<BoundaryFeature>, DataSourceError>>;
}

/// Headered CSV file on disk.
pub struct CsvFileSource {
    path: PathBuf,
    schema: RecordSchema,
}

impl CsvFileSource {
    pub fn new(path: impl AsRef<Path>, schema: RecordSchema) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            schema,
        }
    }
}

impl RecordSource for CsvFileSource {
    fn load_records(&self) -> BoxFuture<'_, Result<Vec<Record>, DataSourceError>> {
        Box::pin(async move {
            let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
                DataSourceError::with_source(
                    SourceErrorKind::Unavailable,
                    format!("failed to read {}: {e}", self.path.display()),
                    e,
                )
            })?;
            Ok::<_, DataSourceError>(parse_records(bytes.as_slice(), &self.schema)?)
        })
    }
}

/// TopoJSON or GeoJSON file on disk.
pub struct BoundaryFileSource {
    path: PathBuf,
    schema: BoundarySchema,
}

impl BoundaryFileSource {
    pub fn new(path: impl AsRef<Path>, schema: BoundarySchema) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            schema,
        }
    }
}

impl BoundarySource for BoundaryFileSource {
    fn load_boundaries(&self) -> BoxFuture<'_, Result<Vec<BoundaryFeature>, DataSourceError>> {
        Box::pin(async move {
            let payload = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
                DataSourceError::with_source(
                    SourceErrorKind::Unavailable,
                    format!("failed to read {}: {e}", self.path.display()),
                    e,
                )
            })?;
            Ok::<_, DataSourceError>(parse_boundaries(&payload, &self.schema)?)
        })
    }
}

#[derive(Debug)]
pub enum LoadError {
    Records(DataSourceError),
    Boundaries(DataSourceError),
}

impl LoadError {
    pub fn source_error(&self) -> &DataSourceError {
        match self {
            LoadError::Records(e) | LoadError::Boundaries(e) => e,
        }
    }

    pub fn is_schema_mismatch(&self) -> bool {
        self.source_error().kind == SourceErrorKind::SchemaMismatch
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Records(e) => write!(f, "record load failed: {e}"),
            LoadError::Boundaries(e) => write!(f, "boundary load failed: {e}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source_error())
    }
}

/// Runs both loads concurrently and joins them into a dataset.
pub async fn load_dataset(
    records: &dyn RecordSource,
    boundaries: &dyn BoundarySource,
) -> Result<Dataset, LoadError> {
    let joined = try_join(
        async { records.load_records().await.map_err(LoadError::Records) },
        async {
            boundaries
                .load_boundaries()
                .await
                .map_err(LoadError::Boundaries)
        },
    )
    .await;

    match joined {
        Ok((records, boundaries)) => {
            info!(
                records = records.len(),
                boundaries = boundaries.len(),
                "dataset loaded"
            );
            Ok(Dataset::new(records, boundaries))
        }
        Err(e) => {
            error!(error = %e, "dataset load aborted");
            Err(e)
        }
    }
}
