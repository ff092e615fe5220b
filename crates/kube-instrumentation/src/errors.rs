use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsConfigError {
    #[error("cannot read metrics configuration {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse metrics configuration {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
