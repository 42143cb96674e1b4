use crate::{config::ConfigError, graph::GraphError, render::pipeline::RenderError};
use std::{io, path::PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum DepsError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("could not read `{}`: {source}", .path.display())]
    Document { path: PathBuf, source: io::Error },

    #[error("could not scan `{}`", .path.display())]
    Diagnostics { path: PathBuf },

    #[error("`{}` already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("could not write `{}`: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("could not watch for changes: {0}")]
    Watch(#[from] notify::Error),
}
