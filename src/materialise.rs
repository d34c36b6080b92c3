//! Writing fetched remote content into a local directory tree.
//!
//! The materialiser is purely local: it rewrites each node's path, creates
//! intermediate directories and writes file content as UTF-8 text. All
//! network I/O has already happened by the time it runs.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::content::{ContentNode, NodeKind};

#[derive(Debug, Error)]
pub enum MaterialiseError {
    #[error("failed to resolve destination root {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("content of {path} is not valid UTF-8: {source}")]
    Decode {
        path: String,
        #[source]
        source: std::str::Utf8Error,
    },
}

/// Write `contents` under `destination_root`, removing `strip_prefix` from
/// the front of every path that carries it.
///
/// Nodes are processed in ascending order of rewritten path length, so parent
/// directories are handled before their children. Directory nodes and file
/// nodes without content are skipped silently. Existing files are truncated
/// and overwritten; directory creation is idempotent. The input slice is
/// never mutated, so callers may materialise the same collection again with a
/// different prefix or destination.
pub fn materialise(
    strip_prefix: Option<&str>,
    destination_root: impl AsRef<Path>,
    contents: &[ContentNode],
) -> Result<(), MaterialiseError> {
    // Resolve the destination once, up front. Later writes must not depend
    // on the process working directory again.
    let destination_root = absolute_root(destination_root.as_ref())?;
    let prefix = strip_prefix.map(|p| p.trim_matches('/'));

    let mut ordered: Vec<(String, &ContentNode)> = contents
        .iter()
        .map(|node| (relocated_path(&node.path, prefix), node))
        .collect();
    ordered.sort_by_key(|(path, _)| path.len());

    for (relative, node) in ordered {
        let target = destination_root.join(&relative);
        match (node.kind, &node.content) {
            (NodeKind::Dir, _) => {
                debug!(path = %node.path, "Skipping directory node");
            }
            (NodeKind::File, None) => {
                debug!(path = %node.path, "Skipping file node without content");
            }
            (NodeKind::File, Some(bytes)) => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).map_err(|e| MaterialiseError::Io {
                        path: parent.to_path_buf(),
                        source: e,
                    })?;
                }
                let text = std::str::from_utf8(bytes).map_err(|e| MaterialiseError::Decode {
                    path: node.path.clone(),
                    source: e,
                })?;
                fs::write(&target, text).map_err(|e| MaterialiseError::Io {
                    path: target.clone(),
                    source: e,
                })?;
                debug!(path = %target.display(), "Wrote file");
            }
        }
    }

    Ok(())
}

/// Rewrite one path for relocation: remove `strip_prefix` from the front when
/// it actually leads the path, then trim surrounding slashes. A prefix that
/// does not match leaves the path unchanged; that leniency can hide a
/// misconfigured prefix, hence the diagnostic.
pub fn relocated_path(path: &str, strip_prefix: Option<&str>) -> String {
    let stripped = match strip_prefix {
        Some(prefix) => match path.strip_prefix(prefix) {
            Some(rest) => rest,
            None => {
                warn!(
                    path = path,
                    prefix = prefix,
                    "Path does not start with strip prefix, leaving it unchanged"
                );
                path
            }
        },
        None => path,
    };
    stripped.trim_matches('/').to_string()
}

fn absolute_root(root: &Path) -> Result<PathBuf, MaterialiseError> {
    if root.is_absolute() {
        return Ok(root.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| MaterialiseError::Resolve {
        path: root.to_path_buf(),
        source: e,
    })?;
    Ok(cwd.join(root))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_a_true_prefix_exactly_once() {
        assert_eq!(
            relocated_path("api/proto/sub/b.proto", Some("api/proto")),
            "sub/b.proto"
        );
        assert_eq!(relocated_path("api/proto", Some("api/proto")), "");
    }

    #[test]
    fn prefix_is_trimmed_of_slashes_before_matching() {
        assert_eq!(
            relocated_path("api/proto/a.proto", Some("/api/proto/")),
            "a.proto"
        );
    }

    #[test]
    fn non_matching_prefix_is_a_no_op() {
        assert_eq!(
            relocated_path("api/proto/a.proto", Some("other/root")),
            "api/proto/a.proto"
        );
    }

    #[test]
    fn no_prefix_only_trims_slashes() {
        assert_eq!(relocated_path("/google/api/http.proto", None), "google/api/http.proto");
    }
}
