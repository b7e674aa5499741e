use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GrnError {
    #[error("input file does not exist: {0}")]
    MissingFile(String),
    #[error("malformed input in {path} at line {line}: {msg}")]
    Malformed {
        path: String,
        line: usize,
        msg: String,
    },
    #[error("no {0} column on every row of the network")]
    MissingColumn(String),
    #[error("gene {gene} is not in the expression matrix (pair {regulator} -> {target})")]
    MissingGene {
        gene: String,
        regulator: String,
        target: String,
    },
    #[error("failed to build the worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

pub type GrnResult<T> = Result<T, GrnError>;

impl GrnError {
    pub fn malformed(path: &str, line: usize, msg: impl Into<String>) -> Self {
        GrnError::Malformed {
            path: path.to_string(),
            line,
            msg: msg.into(),
        }
    }

    pub fn io(path: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            return GrnError::MissingFile(path.to_string());
        }
        GrnError::Io {
            path: path.to_string(),
            source,
        }
    }
}
