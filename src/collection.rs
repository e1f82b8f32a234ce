//! The ordered set of files selected on one tool page.
//!
//! A [`ManagedFileCollection`] enforces the admission rules of its
//! [`VariantConfig`]: declared type, maximum count and, where enabled, unique
//! names. Admission is checked per candidate in that order. Accepted files are
//! appended; nothing is ever queued for later.

use crate::error::{AdmissionError, DeskError};
use crate::variant::VariantConfig;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// MIME type declared for files whose extension is not recognised.
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// Stable identity of a collection member.
///
/// Names are not unique on every variant (the image tools accept two files
/// called `scan.png`), so members are tracked by an id that is never reused
/// within a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

/// A user-selected file: declared name, declared MIME type, opaque content.
///
/// Immutable once built. Cloning shares the content buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct ManagedFile {
    name: String,
    mime: String,
    content: Arc<[u8]>,
}

impl ManagedFile {
    pub fn new(
        name: impl Into<String>,
        mime: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        let content: Vec<u8> = content.into();
        Self {
            name: name.into(),
            mime: mime.into(),
            content: Arc::from(content),
        }
    }

    /// Read a file from disk, declaring its MIME type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, DeskError> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DeskError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                DeskError::FileRead {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime = mime_from_name(&name);
        debug!("Loaded {} ({}, {} bytes)", name, mime, content.len());
        Ok(Self::new(name, mime, content))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl fmt::Debug for ManagedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedFile")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("content", &format_args!("<{} bytes>", self.content.len()))
            .finish()
    }
}

/// Declared MIME type for a file name, by extension.
pub fn mime_from_name(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        _ => UNKNOWN_MIME,
    }
}

/// Result of admitting a batch of candidates.
///
/// Every candidate is judged independently: a refused one never stops the
/// others.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchAdmission {
    /// Ids of the accepted candidates, in batch order.
    pub accepted: Vec<FileId>,
    /// One entry per refused candidate, in batch order.
    pub rejected: Vec<AdmissionError>,
}

impl BatchAdmission {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    /// All rejections of the batch merged into one user-facing message.
    pub fn message(&self) -> Option<String> {
        if self.rejected.is_empty() {
            return None;
        }
        Some(
            self.rejected
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

/// Ordered, admission-checked files of one workflow instance.
#[derive(Debug, Clone)]
pub struct ManagedFileCollection {
    config: VariantConfig,
    members: Vec<(FileId, ManagedFile)>,
    next_id: u64,
}

impl ManagedFileCollection {
    pub fn new(config: VariantConfig) -> Self {
        Self {
            config,
            members: Vec::new(),
            next_id: 0,
        }
    }

    /// Check a candidate against the admission rules without admitting it.
    pub fn check(&self, candidate: &ManagedFile) -> Result<(), AdmissionError> {
        if !self.config.accepts.matches(candidate.mime()) {
            return Err(AdmissionError::WrongType {
                name: candidate.name().to_string(),
                mime: candidate.mime().to_string(),
                expected: self.config.accepts.describe(),
            });
        }
        if let Some(max) = self.config.max_files {
            if self.members.len() >= max {
                return Err(AdmissionError::CapacityExceeded {
                    name: candidate.name().to_string(),
                    max,
                });
            }
        }
        if self.config.reject_duplicate_names && self.contains_name(candidate.name()) {
            return Err(AdmissionError::DuplicateName {
                name: candidate.name().to_string(),
            });
        }
        Ok(())
    }

    /// Append a candidate if it passes admission.
    pub fn admit(&mut self, candidate: ManagedFile) -> Result<FileId, AdmissionError> {
        self.check(&candidate)?;
        let id = FileId(self.next_id);
        self.next_id += 1;
        debug!("Admitted {} as {}", candidate.name(), id);
        self.members.push((id, candidate));
        Ok(id)
    }

    /// Admit every candidate independently.
    pub fn admit_batch(
        &mut self,
        candidates: impl IntoIterator<Item = ManagedFile>,
    ) -> BatchAdmission {
        let mut report = BatchAdmission::default();
        for candidate in candidates {
            match self.admit(candidate) {
                Ok(id) => report.accepted.push(id),
                Err(e) => {
                    debug!("Refused {}: {}", e.file_name(), e);
                    report.rejected.push(e);
                }
            }
        }
        report
    }

    /// Swap the whole content for a single candidate.
    ///
    /// The candidate is judged as if the collection were empty; when it is
    /// refused the current members stay.
    pub fn replace(&mut self, candidate: ManagedFile) -> Result<FileId, AdmissionError> {
        let previous = std::mem::take(&mut self.members);
        match self.admit(candidate) {
            Ok(id) => Ok(id),
            Err(e) => {
                self.members = previous;
                Err(e)
            }
        }
    }

    /// Remove a member by id. Returns the removed file, `None` if absent.
    pub fn remove(&mut self, id: FileId) -> Option<ManagedFile> {
        let pos = self.members.iter().position(|(m, _)| *m == id)?;
        Some(self.members.remove(pos).1)
    }

    /// Remove the member at `index` in insertion order.
    pub fn remove_at(&mut self, index: usize) -> Option<(FileId, ManagedFile)> {
        (index < self.members.len()).then(|| self.members.remove(index))
    }

    /// Remove every member with this declared name.
    pub fn remove_named(&mut self, name: &str) -> Vec<FileId> {
        let mut removed = Vec::new();
        self.members.retain(|(id, f)| {
            if f.name() == name {
                removed.push(*id);
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, id: FileId) -> Option<&ManagedFile> {
        self.members.iter().find(|(m, _)| *m == id).map(|(_, f)| f)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.members.iter().any(|(_, f)| f.name() == name)
    }

    /// Member ids in insertion order.
    pub fn ids(&self) -> Vec<FileId> {
        self.members.iter().map(|(id, _)| *id).collect()
    }

    /// Members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (FileId, &ManagedFile)> {
        self.members.iter().map(|(id, f)| (*id, f))
    }

    pub fn config(&self) -> &VariantConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::{Variant, MAX_IMAGES};

    fn pdf(name: &str) -> ManagedFile {
        ManagedFile::new(name, "application/pdf", b"%PDF-1.7".to_vec())
    }

    fn png(name: &str) -> ManagedFile {
        ManagedFile::new(name, "image/png", vec![0x89, b'P', b'N', b'G'])
    }

    #[test]
    fn merge_rejects_wrong_type_and_duplicates() {
        let mut c = ManagedFileCollection::new(Variant::Merge.config());
        assert!(c.admit(pdf("a.pdf")).is_ok());
        assert!(matches!(
            c.admit(png("a.png")),
            Err(AdmissionError::WrongType { .. })
        ));
        assert_eq!(
            c.admit(pdf("a.pdf")),
            Err(AdmissionError::DuplicateName { name: "a.pdf".into() })
        );
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn image_batch_stops_at_capacity() {
        let mut c = ManagedFileCollection::new(Variant::ImageToImage.config());
        let batch: Vec<_> = (1..=26).map(|i| png(&format!("{i}.png"))).collect();
        let report = c.admit_batch(batch);
        assert_eq!(report.accepted.len(), MAX_IMAGES);
        assert_eq!(
            report.rejected,
            vec![AdmissionError::CapacityExceeded {
                name: "26.png".into(),
                max: MAX_IMAGES
            }]
        );
        assert_eq!(c.len(), 25);
    }

    #[test]
    fn batch_failures_do_not_block_later_candidates() {
        let mut c = ManagedFileCollection::new(Variant::Merge.config());
        let report = c.admit_batch(vec![
            pdf("a.pdf"),
            png("x.png"),
            pdf("a.pdf"),
            pdf("b.pdf"),
        ]);
        assert_eq!(report.accepted.len(), 2);
        assert_eq!(report.rejected.len(), 2);
        let msg = report.message().unwrap();
        assert_eq!(msg.lines().count(), 2);
        assert!(msg.contains("x.png") && msg.contains("a.pdf"));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn clean_batch_has_no_message() {
        let mut c = ManagedFileCollection::new(Variant::Merge.config());
        let report = c.admit_batch(vec![pdf("a.pdf")]);
        assert!(report.is_clean());
        assert_eq!(report.message(), None);
    }

    #[test]
    fn image_variants_allow_duplicate_names() {
        let mut c = ManagedFileCollection::new(Variant::ImageToPdf.config());
        let a = c.admit(png("scan.png")).unwrap();
        let b = c.admit(png("scan.png")).unwrap();
        assert_ne!(a, b);
        assert_eq!(c.remove_named("scan.png"), vec![a, b]);
        assert!(c.is_empty());
    }

    #[test]
    fn single_file_variant_refuses_second_file() {
        let mut c = ManagedFileCollection::new(Variant::Compress.config());
        c.admit(pdf("one.pdf")).unwrap();
        assert!(matches!(
            c.admit(pdf("two.pdf")),
            Err(AdmissionError::CapacityExceeded { max: 1, .. })
        ));
    }

    #[test]
    fn replace_keeps_current_file_on_rejection() {
        let mut c = ManagedFileCollection::new(Variant::Split.config());
        let first = c.admit(pdf("one.pdf")).unwrap();
        assert!(c.replace(png("pic.png")).is_err());
        assert_eq!(c.ids(), vec![first]);

        let second = c.replace(pdf("two.pdf")).unwrap();
        assert_eq!(c.ids(), vec![second]);
        assert_eq!(c.get(second).unwrap().name(), "two.pdf");
    }

    #[test]
    fn remove_is_noop_when_absent_and_ids_are_not_reused() {
        let mut c = ManagedFileCollection::new(Variant::Merge.config());
        let a = c.admit(pdf("a.pdf")).unwrap();
        assert!(c.remove(a).is_some());
        assert!(c.remove(a).is_none());
        assert!(c.remove_at(3).is_none());
        let b = c.admit(pdf("a.pdf")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn remove_at_shifts_following_members() {
        let mut c = ManagedFileCollection::new(Variant::Merge.config());
        c.admit_batch(vec![pdf("a.pdf"), pdf("b.pdf"), pdf("c.pdf")]);
        let (_, removed) = c.remove_at(0).unwrap();
        assert_eq!(removed.name(), "a.pdf");
        let names: Vec<_> = c.iter().map(|(_, f)| f.name().to_string()).collect();
        assert_eq!(names, vec!["b.pdf", "c.pdf"]);
    }

    #[test]
    fn mime_from_extension() {
        assert_eq!(mime_from_name("Report.PDF"), "application/pdf");
        assert_eq!(mime_from_name("photo.jpeg"), "image/jpeg");
        assert_eq!(mime_from_name("anim.gif"), "image/gif");
        assert_eq!(mime_from_name("README"), UNKNOWN_MIME);
        assert_eq!(mime_from_name("archive.tar.gz"), UNKNOWN_MIME);
    }

    #[tokio::test]
    async fn from_path_reads_and_declares_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        tokio::fs::write(&path, b"%PDF-1.4 test").await.unwrap();
        let f = ManagedFile::from_path(&path).await.unwrap();
        assert_eq!(f.name(), "doc.pdf");
        assert_eq!(f.mime(), "application/pdf");
        assert_eq!(f.content(), b"%PDF-1.4 test");
    }

    #[tokio::test]
    async fn from_path_missing_file() {
        let err = ManagedFile::from_path("/definitely/not/here.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, DeskError::FileNotFound { .. }));
    }
}
