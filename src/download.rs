//! Saving returned files to a local directory.

use crate::error::DeskError;
use crate::submission::{DownloadRef, SubmissionResult};
use crate::transport::Transport;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

static RE_UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9._\- ]").unwrap());

/// Local file name for a download reference: its last path segment, with
/// anything outside a conservative character set replaced by `_`.
pub fn local_name(reference: &DownloadRef) -> String {
    let cleaned = RE_UNSAFE_CHARS
        .replace_all(reference.file_name(), "_")
        .trim()
        .to_string();
    match cleaned.trim_matches('.') {
        "" => "download".to_string(),
        _ => cleaned,
    }
}

/// Distinct local names, in reference order. Repeats get `-2`, `-3`, ...
/// before the extension.
fn plan_names(downloads: &[DownloadRef]) -> Vec<String> {
    let mut taken = HashSet::new();
    downloads
        .iter()
        .map(|d| {
            let name = local_name(d);
            if taken.insert(name.clone()) {
                return name;
            }
            let (stem, ext) = match name.rsplit_once('.') {
                Some((s, e)) if !s.is_empty() => (s.to_string(), format!(".{e}")),
                _ => (name.clone(), String::new()),
            };
            (2..)
                .map(|n| format!("{stem}-{n}{ext}"))
                .find(|candidate| taken.insert(candidate.clone()))
                .unwrap_or(name)
        })
        .collect()
}

async fn save_one(
    transport: &Arc<dyn Transport>,
    reference: &DownloadRef,
    path: &Path,
) -> Result<PathBuf, DeskError> {
    let bytes = transport.fetch_download(reference).await?;
    // Write beside the target, then rename, so a partial file never appears.
    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".part");
    let written = match tokio::fs::write(&tmp_path, &bytes).await {
        Ok(()) => tokio::fs::rename(&tmp_path, path).await,
        Err(e) => Err(e),
    };
    if let Err(source) = written {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(DeskError::DownloadWriteFailed {
            path: path.to_path_buf(),
            source,
        });
    }
    debug!("Saved {} ({} bytes) to {}", reference, bytes.len(), path.display());
    Ok(path.to_path_buf())
}

/// Fetch every download of `result` into `dir`, at most `concurrency` at a
/// time. Returns the written paths in the order of `result.downloads`.
///
/// Existing files with the same name are overwritten. The first failure
/// aborts the whole call.
pub async fn save_all(
    transport: Arc<dyn Transport>,
    result: &SubmissionResult,
    dir: impl AsRef<Path>,
    concurrency: usize,
) -> Result<Vec<PathBuf>, DeskError> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| DeskError::DownloadWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let names = plan_names(&result.downloads);
    info!("Downloading {} file(s) to {}", names.len(), dir.display());

    let mut saved: Vec<(usize, PathBuf)> = stream::iter(
        result
            .downloads
            .iter()
            .zip(names)
            .enumerate()
            .map(|(i, (reference, name))| {
                let transport = Arc::clone(&transport);
                let path = dir.join(name);
                async move { save_one(&transport, reference, &path).await.map(|p| (i, p)) }
            }),
    )
    .buffer_unordered(concurrency.max(1))
    .collect::<Vec<_>>()
    .await
    .into_iter()
    .collect::<Result<_, _>>()?;

    saved.sort_by_key(|(i, _)| *i);
    Ok(saved.into_iter().map(|(_, p)| p).collect())
}
