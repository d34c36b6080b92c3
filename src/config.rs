use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::remote::GithubRepo;

/// Top-level runtime configuration: which sources to mirror, where the
/// staging mirror lives, and how to invoke the external generator.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub staging_dir: PathBuf,
    /// Leave the staging mirror on disk after generation.
    #[serde(default)]
    pub keep_staging: bool,
    pub sources: Vec<SourceAction>,
    pub generator: GeneratorConfig,
    /// Optional bearer token, injected from the environment; never read from
    /// or written to the config file.
    #[serde(skip)]
    pub token: Option<String>,
}

impl Config {
    pub fn trace_loaded(&self) {
        info!(
            staging_dir = %self.staging_dir.display(),
            sources_count = self.sources.len(),
            "Loaded Config"
        );
        for source in &self.sources {
            source.trace_loaded();
        }
        debug!(?self, "Config loaded (full debug)");
    }
}

/// Selects the kind of source to mirror.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceAction {
    Tree(TreeSource),
    Files(FileSource),
}

impl SourceAction {
    pub fn trace_loaded(&self) {
        match self {
            SourceAction::Tree(tree) => {
                info!(
                    repo = %tree.repo,
                    path = %tree.path,
                    reference = tree.reference.as_deref().unwrap_or("<default>"),
                    dest = %tree.dest,
                    "Loaded tree source"
                );
            }
            SourceAction::Files(files) => {
                info!(
                    repo = %files.repo,
                    paths_count = files.paths.len(),
                    dest = %files.dest,
                    "Loaded files source"
                );
            }
        }
    }
}

/// A directory tree to expand recursively from one repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSource {
    pub repo: GithubRepo,
    /// Remote directory the expansion starts from.
    pub path: String,
    /// Commit hash, tag or branch pinning the snapshot; the remote's default
    /// branch when absent.
    #[serde(default)]
    pub reference: Option<String>,
    /// Prefix removed from retrieved paths before writing them locally.
    #[serde(default)]
    pub strip_prefix: Option<String>,
    /// Subdirectory of the staging dir this source is mirrored into.
    pub dest: String,
    /// Whether this source's file paths become generator arguments.
    #[serde(default)]
    pub emit: bool,
}

/// A fixed set of files pulled by exact path from one repository, typically
/// dependency definitions living in a different repo than the main tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub repo: GithubRepo,
    pub paths: Vec<String>,
    pub dest: String,
    #[serde(default)]
    pub emit: bool,
}

/// How to invoke the external code generator over the staged mirror.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Generator executable, e.g. `protoc`.
    pub program: String,
    /// Fixed arguments (include paths, output flags). The sorted file list
    /// from emitting sources is appended after these.
    #[serde(default)]
    pub args: Vec<String>,
    /// Directory the generator writes into; recreated before every run.
    pub output_dir: PathBuf,
}
