use std::path::{Path, PathBuf};

use crate::{
    backend::Backend,
    errors::{Error, Result},
};

/// Where the shards of a dataset are.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSpec {
    /// Explicit paths, kept in the given order
    List(Vec<PathBuf>),

    /// A glob pattern, expanded and sorted lexicographically
    Pattern(String),
}

impl From<&str> for PathSpec {
    fn from(pattern: &str) -> Self {
        Self::Pattern(pattern.to_string())
    }
}

impl From<String> for PathSpec {
    fn from(pattern: String) -> Self {
        Self::Pattern(pattern)
    }
}

impl From<&Path> for PathSpec {
    fn from(path: &Path) -> Self {
        Self::List(vec![path.to_path_buf()])
    }
}

impl From<PathBuf> for PathSpec {
    fn from(path: PathBuf) -> Self {
        Self::List(vec![path])
    }
}

impl<P: Into<PathBuf>> From<Vec<P>> for PathSpec {
    fn from(paths: Vec<P>) -> Self {
        Self::List(paths.into_iter().map(Into::into).collect())
    }
}

/// Turn a path spec into the ordered, non-empty list of shards of a dataset.
///
pub(crate) fn resolve<B: Backend>(spec: &PathSpec, backend: &B) -> Result<Vec<PathBuf>> {
    let files = match spec {
        PathSpec::List(paths) => {
            if let Some(missing) = paths.iter().find(|path| !backend.exists(path)) {
                return Err(Error::path(format!("{} does not exist", missing.display())));
            }
            paths.clone()
        }
        PathSpec::Pattern(pattern) => backend.expand(pattern)?,
    };

    if files.is_empty() {
        return Err(Error::path(match spec {
            PathSpec::List(_) => String::from("empty list of files"),
            PathSpec::Pattern(pattern) => format!("no files match {pattern}"),
        }));
    }
    tracing::debug!(files = files.len(), "resolved file set");

    Ok(files)
}
