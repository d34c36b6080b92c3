//! Recursive expansion of a remote directory tree into a flat node collection.
//!
//! Directory listings fan out concurrently per level; once the full entry set
//! is known, all file downloads run concurrently. The operation completes only
//! when every listing and every download has finished, so the caller either
//! receives the complete subtree with all file content attached or an error.

use std::collections::HashSet;

use futures::future::{try_join_all, BoxFuture, FutureExt};
use tracing::{debug, info};

use crate::content::{ContentNode, NodeKind};
use crate::remote::{ContentFetcher, FetchError};

/// Fetch every entry transitively reachable under `root_path` at the given
/// ref, with raw content attached to every file node.
///
/// Leading and trailing slashes on `root_path` are stripped before use. The
/// returned collection is unordered and contains directory entries as well as
/// files; paths are unique within one call.
pub async fn fetch_tree<C>(
    client: &C,
    root_path: &str,
    reference: Option<&str>,
) -> Result<Vec<ContentNode>, FetchError>
where
    C: ContentFetcher + ?Sized,
{
    let root = root_path.trim_matches('/');
    let mut nodes = expand_dir(client, root.to_string(), reference).await?;

    // Recursion never revisits a path; a remote that repeats one is malformed.
    let mut seen = HashSet::new();
    for node in &nodes {
        if !seen.insert(node.path.as_str()) {
            return Err(FetchError::DuplicatePath {
                path: node.path.clone(),
            });
        }
    }

    let downloads: Vec<_> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.kind == NodeKind::File)
        .map(|(index, node)| {
            let path = node.path.clone();
            async move {
                let bytes = client.fetch_raw(&path, reference).await?;
                Ok::<_, FetchError>((index, bytes))
            }
        })
        .collect();

    info!(
        root = root,
        entries = nodes.len(),
        files = downloads.len(),
        "Expanded remote tree"
    );

    for (index, bytes) in try_join_all(downloads).await? {
        nodes[index].content = Some(bytes);
    }

    Ok(nodes)
}

/// Fetch one file directly by path, bypassing tree listing. Used when the
/// exact remote path is already known; resolves against the remote's default
/// branch.
pub async fn fetch_file<C>(client: &C, path: &str) -> Result<ContentNode, FetchError>
where
    C: ContentFetcher + ?Sized,
{
    let path = path.trim_matches('/');
    let bytes = client.fetch_raw(path, None).await?;
    Ok(ContentNode::file(path, bytes))
}

/// List one directory and, concurrently, every subdirectory below it,
/// merging all entries into one flat collection.
fn expand_dir<'a, C>(
    client: &'a C,
    path: String,
    reference: Option<&'a str>,
) -> BoxFuture<'a, Result<Vec<ContentNode>, FetchError>>
where
    C: ContentFetcher + ?Sized,
{
    async move {
        let mut entries = client.list_dir(&path, reference).await?;
        debug!(path = %path, entries = entries.len(), "Listed remote directory");

        let subdirs: Vec<String> = entries
            .iter()
            .filter(|entry| entry.kind == NodeKind::Dir)
            .map(|entry| entry.path.clone())
            .collect();

        let children = try_join_all(
            subdirs
                .into_iter()
                .map(|subdir| expand_dir(client, subdir, reference)),
        )
        .await?;

        for child in children {
            entries.extend(child);
        }
        Ok(entries)
    }
    .boxed()
}
