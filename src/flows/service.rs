//! Search and view entry points
//!
//! Request-handling layer a host (or the CLI) calls into. Every operation
//! checks authorization first, then configuration, and only then touches the
//! filesystem or the search process.

use log::{debug, warn};
use serde::Deserialize;
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::backends::collector;
use crate::core::config::Config;
use crate::core::error::{SearchError, ServiceError, ViewError};
use crate::core::file_reader::{read_file_lines, FileReadConfig};
use crate::core::model::{CollectionResult, FileView, SearchReport, SearchRequest};
use crate::flows::auth::Authorizer;
use crate::flows::project::project;

/// Query parameters of a search, as a host receives them
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub pattern: Option<String>,
    /// Case-insensitive matching
    pub ignore: bool,
    /// Treat the pattern as a literal string
    pub literal: bool,
    /// Include/exclude globs, in order
    pub glob: Vec<String>,
    /// Context lines around each match
    pub context: usize,
}

/// The I/O side of the service: running searches and reading files
pub trait SearchBackend {
    fn collect(
        &self,
        request: &SearchRequest,
    ) -> impl Future<Output = Result<CollectionResult, SearchError>> + Send;

    fn read_lines(&self, root: &Path, relative: &str) -> Result<FileView, ViewError>;
}

/// Backend that shells out to ripgrep and reads files from disk
#[derive(Debug, Clone)]
pub struct RipgrepBackend {
    program: PathBuf,
    read_config: FileReadConfig,
}

impl RipgrepBackend {
    pub fn from_config(config: &Config) -> Self {
        Self {
            program: config.rg_program.clone(),
            read_config: FileReadConfig {
                max_file_size: config.max_view_bytes,
            },
        }
    }
}

impl SearchBackend for RipgrepBackend {
    async fn collect(&self, request: &SearchRequest) -> Result<CollectionResult, SearchError> {
        collector::collect(&self.program, request).await
    }

    fn read_lines(&self, root: &Path, relative: &str) -> Result<FileView, ViewError> {
        read_file_lines(root, relative, &self.read_config)
    }
}

pub struct SearchService<B, A> {
    config: Config,
    backend: B,
    authorizer: A,
}

impl<B: SearchBackend, A: Authorizer> SearchService<B, A> {
    pub fn new(config: Config, backend: B, authorizer: A) -> Self {
        Self {
            config,
            backend,
            authorizer,
        }
    }

    /// Run a bounded search and group its results by file.
    ///
    /// A blank pattern yields an empty report without running anything.
    pub async fn search(
        &self,
        actor: Option<&str>,
        query: &SearchQuery,
    ) -> Result<SearchReport, ServiceError> {
        self.authorize(actor)?;
        let root = self.config.require_root()?;

        let pattern = query.pattern.as_deref().unwrap_or_default();
        if pattern.trim().is_empty() {
            debug!("blank pattern, skipping search");
            return Ok(SearchReport::empty(pattern));
        }

        let request = SearchRequest::builder(pattern, root)
            .ignore_case(query.ignore)
            .literal(query.literal)
            .globs(query.glob.iter().cloned())
            .context_lines(query.context)
            .max_results(self.config.max_results)
            .time_limit(self.config.time_limit)
            .build()?;

        let collected = self.backend.collect(&request).await?;
        let projection = project(&collected);

        Ok(SearchReport {
            pattern: request.pattern().to_string(),
            groups: projection.groups,
            line_number_width: projection.line_number_width,
            match_count: collected.match_count(),
            truncated_by_count: collected.truncated_by_count(),
            truncated_by_time: collected.truncated_by_time(),
            decode_failures: collected.decode_failures,
            elapsed_ms: collected.elapsed.as_millis() as u64,
        })
    }

    /// Read one file under the root as numbered lines
    pub fn view(&self, actor: Option<&str>, path: &str) -> Result<FileView, ServiceError> {
        self.authorize(actor)?;
        let root = self.config.require_root()?;

        Ok(self.backend.read_lines(root, path)?)
    }

    fn authorize(&self, actor: Option<&str>) -> Result<(), ServiceError> {
        if self.authorizer.is_allowed(actor) {
            Ok(())
        } else {
            warn!("denied search access for {:?}", actor.unwrap_or("anonymous"));
            Err(ServiceError::Forbidden)
        }
    }
}
