//! Coordinating module for the fetch-materialise-generate pipeline.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use futures::future::try_join_all;
use tracing::{debug, error, info};

use crate::codegen;
use crate::config::{Config, FileSource, SourceAction, TreeSource};
use crate::content::{ContentNode, NodeKind};
use crate::materialise::{materialise, relocated_path};
use crate::remote::GithubClient;
use crate::tree::{fetch_file, fetch_tree};

/// What one pipeline run produced, per source.
#[derive(Debug)]
pub struct GenerateReport {
    pub sources: Vec<SourceReport>,
}

#[derive(Debug)]
pub struct SourceReport {
    pub name: String,
    pub dest: PathBuf,
    pub files: usize,
}

/// Entrypoint: mirror every configured source into the staging directory,
/// run the generator over the merged mirror, then clean up the staging tree.
///
/// Any fetch, materialise or generator failure halts the pipeline. Files
/// already written stay in place; there is no partial-success mode.
pub async fn generate(config: &Config) -> Result<GenerateReport> {
    let http = GithubClient::http_client().context("failed to construct HTTP client")?;

    info!("Starting full generation pipeline");

    let mut reports = Vec::new();
    let mut emit_paths: Vec<String> = Vec::new();

    for source in &config.sources {
        let report = match source {
            SourceAction::Tree(tree) => {
                sync_tree_source(&http, config, tree, &mut emit_paths).await?
            }
            SourceAction::Files(files) => {
                sync_file_source(&http, config, files, &mut emit_paths).await?
            }
        };
        info!(
            source = %report.name,
            files = report.files,
            dest = %report.dest.display(),
            "Source mirrored"
        );
        reports.push(report);
    }

    // The generator resolves the emitted relative paths against the include
    // directories given in its configured args.
    emit_paths.sort();
    codegen::run(&config.generator, &emit_paths)
        .context("code generation over the mirrored sources failed")?;

    if config.keep_staging {
        debug!(staging_dir = %config.staging_dir.display(), "Keeping staging directory");
    } else if config.staging_dir.exists() {
        if let Err(e) = fs::remove_dir_all(&config.staging_dir) {
            error!(
                error = ?e,
                path = %config.staging_dir.display(),
                "Failed to remove staging directory"
            );
            return Err(e).context("failed to remove staging directory");
        }
        debug!(staging_dir = %config.staging_dir.display(), "Removed staging directory");
    }

    Ok(GenerateReport { sources: reports })
}

async fn sync_tree_source(
    http: &reqwest::Client,
    config: &Config,
    tree: &TreeSource,
    emit_paths: &mut Vec<String>,
) -> Result<SourceReport> {
    let client = GithubClient::new(http.clone(), tree.repo.clone(), config.token.clone());

    info!(repo = %tree.repo, path = %tree.path, "Fetching remote tree");
    let contents = fetch_tree(&client, &tree.path, tree.reference.as_deref())
        .await
        .with_context(|| format!("failed to fetch tree {}:{}", tree.repo, tree.path))?;

    let dest = config.staging_dir.join(&tree.dest);
    materialise(tree.strip_prefix.as_deref(), &dest, &contents)
        .with_context(|| format!("failed to materialise {} under {}", tree.repo, dest.display()))?;

    let files = file_paths(&contents, tree.strip_prefix.as_deref());
    if tree.emit {
        emit_paths.extend(files.iter().cloned());
    }

    Ok(SourceReport {
        name: format!("{}:{}", tree.repo, tree.path),
        dest,
        files: files.len(),
    })
}

async fn sync_file_source(
    http: &reqwest::Client,
    config: &Config,
    source: &FileSource,
    emit_paths: &mut Vec<String>,
) -> Result<SourceReport> {
    let client = GithubClient::new(http.clone(), source.repo.clone(), config.token.clone());

    info!(repo = %source.repo, paths = source.paths.len(), "Fetching fixed files");
    let contents = try_join_all(source.paths.iter().map(|path| fetch_file(&client, path)))
        .await
        .with_context(|| format!("failed to fetch files from {}", source.repo))?;

    let dest = config.staging_dir.join(&source.dest);
    materialise(None, &dest, &contents).with_context(|| {
        format!(
            "failed to materialise {} under {}",
            source.repo,
            dest.display()
        )
    })?;

    let files = file_paths(&contents, None);
    if source.emit {
        emit_paths.extend(files.iter().cloned());
    }

    Ok(SourceReport {
        name: source.repo.to_string(),
        dest,
        files: files.len(),
    })
}

/// The post-strip paths of every file node, as handed to the generator.
fn file_paths(contents: &[ContentNode], strip_prefix: Option<&str>) -> Vec<String> {
    let prefix = strip_prefix.map(|p| p.trim_matches('/'));
    contents
        .iter()
        .filter(|node| node.kind == NodeKind::File)
        .map(|node| relocated_path(&node.path, prefix))
        .collect()
}
