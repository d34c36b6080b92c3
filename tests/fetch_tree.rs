// Integration tests for the tree walker, driven by an in-memory remote so no
// network access is needed.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use proto_mirror::content::{ContentNode, NodeKind};
use proto_mirror::remote::{ContentFetcher, FetchError, MockContentFetcher};
use proto_mirror::tree::{fetch_file, fetch_tree};

/// In-memory remote: directory listings plus raw blobs, keyed by path.
struct FakeRemote {
    listings: HashMap<String, Vec<ContentNode>>,
    blobs: HashMap<String, Vec<u8>>,
    expected_reference: Option<String>,
}

impl FakeRemote {
    fn new(expected_reference: Option<&str>) -> Self {
        Self {
            listings: HashMap::new(),
            blobs: HashMap::new(),
            expected_reference: expected_reference.map(String::from),
        }
    }

    fn listing(mut self, path: &str, entries: Vec<ContentNode>) -> Self {
        self.listings.insert(path.to_string(), entries);
        self
    }

    fn blob(mut self, path: &str, content: &str) -> Self {
        self.blobs.insert(path.to_string(), content.as_bytes().to_vec());
        self
    }
}

#[async_trait]
impl ContentFetcher for FakeRemote {
    async fn list_dir<'a>(
        &'a self,
        path: &'a str,
        reference: Option<&'a str>,
    ) -> Result<Vec<ContentNode>, FetchError> {
        assert_eq!(
            reference,
            self.expected_reference.as_deref(),
            "listing for {path} used an unexpected ref"
        );
        self.listings
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: path.to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            })
    }

    async fn fetch_raw<'a>(
        &'a self,
        path: &'a str,
        reference: Option<&'a str>,
    ) -> Result<Vec<u8>, FetchError> {
        assert_eq!(
            reference,
            self.expected_reference.as_deref(),
            "download of {path} used an unexpected ref"
        );
        self.blobs
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: path.to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            })
    }
}

/// A three-level tree with files at every level and sibling directories.
fn deep_remote() -> FakeRemote {
    FakeRemote::new(None)
        .listing(
            "svc",
            vec![
                ContentNode::dir("svc/types"),
                ContentNode::dir("svc/rpc"),
                ContentNode {
                    path: "svc/root.proto".into(),
                    kind: NodeKind::File,
                    content: None,
                },
            ],
        )
        .listing(
            "svc/types",
            vec![
                ContentNode {
                    path: "svc/types/common.proto".into(),
                    kind: NodeKind::File,
                    content: None,
                },
                ContentNode::dir("svc/types/nested"),
            ],
        )
        .listing(
            "svc/types/nested",
            vec![ContentNode {
                path: "svc/types/nested/deep.proto".into(),
                kind: NodeKind::File,
                content: None,
            }],
        )
        .listing(
            "svc/rpc",
            vec![ContentNode {
                path: "svc/rpc/service.proto".into(),
                kind: NodeKind::File,
                content: None,
            }],
        )
        .blob("svc/root.proto", "root")
        .blob("svc/types/common.proto", "common")
        .blob("svc/types/nested/deep.proto", "deep")
        .blob("svc/rpc/service.proto", "service")
}

#[tokio::test]
async fn returns_every_transitively_reachable_file_with_content() {
    let remote = deep_remote();

    let nodes = fetch_tree(&remote, "svc", None).await.unwrap();

    let files: HashMap<&str, &[u8]> = nodes
        .iter()
        .filter(|n| n.kind == NodeKind::File)
        .map(|n| (n.path.as_str(), n.content.as_deref().expect("file node without content")))
        .collect();

    let expected: HashMap<&str, &[u8]> = [
        ("svc/root.proto", "root".as_bytes()),
        ("svc/types/common.proto", "common".as_bytes()),
        ("svc/types/nested/deep.proto", "deep".as_bytes()),
        ("svc/rpc/service.proto", "service".as_bytes()),
    ]
    .into_iter()
    .collect();

    assert_eq!(files, expected);
}

#[tokio::test]
async fn directory_entries_are_included_and_never_carry_content() {
    let remote = deep_remote();

    let nodes = fetch_tree(&remote, "svc", None).await.unwrap();

    let dirs: HashSet<&str> = nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Dir)
        .map(|n| n.path.as_str())
        .collect();
    assert_eq!(
        dirs,
        HashSet::from(["svc/types", "svc/rpc", "svc/types/nested"])
    );
    assert!(nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Dir)
        .all(|n| n.content.is_none()));
}

#[tokio::test]
async fn no_path_appears_twice() {
    let remote = deep_remote();

    let nodes = fetch_tree(&remote, "svc", None).await.unwrap();

    let mut seen = HashSet::new();
    for node in &nodes {
        assert!(seen.insert(node.path.as_str()), "duplicate path {}", node.path);
    }
}

#[tokio::test]
async fn root_path_slashes_are_stripped() {
    let remote = deep_remote();

    let nodes = fetch_tree(&remote, "/svc/", None).await.unwrap();

    assert!(nodes.iter().any(|n| n.path == "svc/root.proto"));
}

#[tokio::test]
async fn reference_is_threaded_through_every_request() {
    let remote = FakeRemote::new(Some("6f3a9e1"))
        .listing(
            "api",
            vec![
                ContentNode::dir("api/sub"),
                ContentNode {
                    path: "api/a.proto".into(),
                    kind: NodeKind::File,
                    content: None,
                },
            ],
        )
        .listing(
            "api/sub",
            vec![ContentNode {
                path: "api/sub/b.proto".into(),
                kind: NodeKind::File,
                content: None,
            }],
        )
        .blob("api/a.proto", "a")
        .blob("api/sub/b.proto", "b");

    // The fake asserts the ref on every listing and download.
    let nodes = fetch_tree(&remote, "api", Some("6f3a9e1")).await.unwrap();
    assert_eq!(
        nodes.iter().filter(|n| n.kind == NodeKind::File).count(),
        2
    );
}

#[tokio::test]
async fn concrete_proto_tree_scenario() {
    let remote = FakeRemote::new(None)
        .listing(
            "api/proto",
            vec![
                ContentNode {
                    path: "api/proto/a.proto".into(),
                    kind: NodeKind::File,
                    content: None,
                },
                ContentNode::dir("api/proto/sub"),
            ],
        )
        .listing(
            "api/proto/sub",
            vec![ContentNode {
                path: "api/proto/sub/b.proto".into(),
                kind: NodeKind::File,
                content: None,
            }],
        )
        .blob("api/proto/a.proto", "syntax=\"proto3\";")
        .blob("api/proto/sub/b.proto", "message B {}");

    let nodes = fetch_tree(&remote, "api/proto", None).await.unwrap();

    let a = nodes.iter().find(|n| n.path == "api/proto/a.proto").unwrap();
    let b = nodes
        .iter()
        .find(|n| n.path == "api/proto/sub/b.proto")
        .unwrap();
    assert_eq!(a.content.as_deref(), Some("syntax=\"proto3\";".as_bytes()));
    assert_eq!(b.content.as_deref(), Some("message B {}".as_bytes()));
}

#[tokio::test]
async fn one_failed_download_fails_the_whole_fetch() {
    let remote = FakeRemote::new(None)
        .listing(
            "api/proto",
            vec![
                ContentNode {
                    path: "api/proto/a.proto".into(),
                    kind: NodeKind::File,
                    content: None,
                },
                ContentNode::dir("api/proto/sub"),
            ],
        )
        .listing(
            "api/proto/sub",
            vec![ContentNode {
                path: "api/proto/sub/b.proto".into(),
                kind: NodeKind::File,
                content: None,
            }],
        )
        .blob("api/proto/a.proto", "syntax=\"proto3\";");
    // sub/b.proto has no blob, so its download 404s.

    let result = fetch_tree(&remote, "api/proto", None).await;
    assert!(matches!(result, Err(FetchError::Status { .. })));
}

#[tokio::test]
async fn listing_failure_propagates() {
    let mut mock = MockContentFetcher::new();
    mock.expect_list_dir().returning(|path, _| {
        Err(FetchError::Status {
            url: path.to_string(),
            status: reqwest::StatusCode::FORBIDDEN,
        })
    });

    let result = fetch_tree(&mock, "api/proto", None).await;
    assert!(matches!(result, Err(FetchError::Status { .. })));
}

#[tokio::test]
async fn repeated_path_in_listing_is_a_validation_error() {
    let remote = FakeRemote::new(None)
        .listing(
            "api",
            vec![
                ContentNode {
                    path: "api/a.proto".into(),
                    kind: NodeKind::File,
                    content: None,
                },
                ContentNode {
                    path: "api/a.proto".into(),
                    kind: NodeKind::File,
                    content: None,
                },
            ],
        )
        .blob("api/a.proto", "a");

    let result = fetch_tree(&remote, "api", None).await;
    assert!(matches!(result, Err(FetchError::DuplicatePath { .. })));
}

#[tokio::test]
async fn fetch_file_returns_a_resolved_file_node() {
    let remote =
        FakeRemote::new(None).blob("google/api/http.proto", "service annotations");

    let node = fetch_file(&remote, "/google/api/http.proto").await.unwrap();

    assert_eq!(node.path, "google/api/http.proto");
    assert_eq!(node.kind, NodeKind::File);
    assert_eq!(node.content.as_deref(), Some("service annotations".as_bytes()));
}

#[tokio::test]
async fn fetch_file_failure_surfaces_as_error() {
    let remote = FakeRemote::new(None);

    let result = fetch_file(&remote, "missing.proto").await;
    assert!(matches!(result, Err(FetchError::Status { .. })));
}
