use std::fs::DirBuilder;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Errors raised when preparing socket directories.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// Parent directory is missing when creating a Unix socket path.
    #[error("socket path '{path}' has no parent directory")]
    MissingParent { path: Utf8PathBuf },
    /// Failed to create or adjust socket directories.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn prepare_parent_directory(path: &Utf8Path) -> Result<(), SocketPreparationError> {
    let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) else {
        return Err(SocketPreparationError::MissingParent {
            path: path.to_path_buf(),
        });
    };

    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }

    if let Err(source) = builder.create(parent.as_std_path())
        && source.kind() != std::io::ErrorKind::AlreadyExists
    {
        return Err(SocketPreparationError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        });
    }

    Ok(())
}
