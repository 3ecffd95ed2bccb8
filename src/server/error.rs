use std::fmt;
use std::io;

use thiserror::Error;

use crate::actor::fs::WatchError;

/// Errors that abort server startup.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("no free port on {host}")]
    PortAllocation {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("{server} server failed to bind {addr}")]
    Bind {
        server: &'static str,
        addr: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid route pattern")]
    Route(#[from] regex::Error),

    #[error("cannot start request pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error("server task failed: {0}")]
    Task(String),
}

impl ServeError {
    pub(crate) fn bind(
        server: &'static str,
        addr: impl fmt::Display,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Bind {
            server,
            addr: addr.to_string(),
            source: source.into(),
        }
    }
}

/// One or more components failed to shut down cleanly.
///
/// Every component is still attempted; this lists the ones that failed.
#[derive(Debug, Error)]
#[error("failed to close {}", describe(.failures))]
pub struct CloseError {
    pub failures: Vec<(&'static str, String)>,
}

fn describe(failures: &[(&'static str, String)]) -> String {
    failures
        .iter()
        .map(|(component, error)| format!("{component} ({error})"))
        .collect::<Vec<_>>()
        .join(", ")
}
