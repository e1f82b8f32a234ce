//! The five tool pages, described as data.
//!
//! Every tool runs the same collect → configure → verify → submit workflow.
//! What differs between them is captured in one [`VariantConfig`] record per
//! [`Variant`]; [`crate::workflow::Workflow`] reads that record and nothing
//! else, so adding a sixth tool means adding a row here.

use crate::submission::{NETWORK_ERROR_MESSAGE, UNKNOWN_ERROR_MESSAGE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of images accepted by the image tools.
pub const MAX_IMAGES: usize = 25;

/// One of the tool configurations sharing the upload workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Combine several PDFs, in a user-chosen order, into one.
    Merge,
    /// Split one PDF into per-page or per-range documents.
    Split,
    /// Re-encode the images inside one PDF at a lower quality.
    Compress,
    /// Convert a batch of images to another image format.
    ImageToImage,
    /// Combine a batch of images, in a user-chosen order, into one PDF.
    ImageToPdf,
}

impl Variant {
    /// All variants, in the order the tool menu lists them.
    pub const ALL: [Variant; 5] = [
        Variant::Merge,
        Variant::Split,
        Variant::Compress,
        Variant::ImageToImage,
        Variant::ImageToPdf,
    ];

    /// The configuration record for this variant.
    pub fn config(self) -> VariantConfig {
        match self {
            Variant::Merge => VariantConfig {
                variant: self,
                endpoint: "/api/merge",
                accepts: TypeFilter::Exact("application/pdf"),
                max_files: None,
                reject_duplicate_names: true,
                reorderable: true,
                requires_challenge: true,
                file_field: "files[]",
                response: ResponseShape::Single,
                progress_label: "Merging your PDFs...",
                complete_label: "Merge complete!",
                failure_message: UNKNOWN_ERROR_MESSAGE,
                network_error_message: NETWORK_ERROR_MESSAGE,
            },
            Variant::Split => VariantConfig {
                variant: self,
                endpoint: "/api/split",
                accepts: TypeFilter::Exact("application/pdf"),
                max_files: Some(1),
                reject_duplicate_names: false,
                reorderable: false,
                requires_challenge: true,
                file_field: "file",
                response: ResponseShape::Multiple,
                progress_label: "Splitting your PDF...",
                complete_label: "Split complete!",
                failure_message: UNKNOWN_ERROR_MESSAGE,
                network_error_message: NETWORK_ERROR_MESSAGE,
            },
            Variant::Compress => VariantConfig {
                variant: self,
                endpoint: "/api/compress",
                accepts: TypeFilter::Exact("application/pdf"),
                max_files: Some(1),
                reject_duplicate_names: false,
                reorderable: false,
                requires_challenge: false,
                file_field: "file",
                response: ResponseShape::Single,
                progress_label: "Compressing your PDF...",
                complete_label: "Compression complete!",
                failure_message: UNKNOWN_ERROR_MESSAGE,
                network_error_message: NETWORK_ERROR_MESSAGE,
            },
            Variant::ImageToImage => VariantConfig {
                variant: self,
                endpoint: "/api/img2img",
                accepts: TypeFilter::Prefix("image/"),
                max_files: Some(MAX_IMAGES),
                reject_duplicate_names: false,
                reorderable: false,
                requires_challenge: true,
                file_field: "files[]",
                response: ResponseShape::Multiple,
                progress_label: "Converting your images...",
                complete_label: "Conversion complete!",
                failure_message: "Conversion failed.",
                network_error_message: "Network error.",
            },
            Variant::ImageToPdf => VariantConfig {
                variant: self,
                endpoint: "/api/img2pdf",
                accepts: TypeFilter::Prefix("image/"),
                max_files: Some(MAX_IMAGES),
                reject_duplicate_names: false,
                reorderable: true,
                requires_challenge: true,
                file_field: "files[]",
                response: ResponseShape::Single,
                progress_label: "Converting your images to PDF...",
                complete_label: "PDF created!",
                failure_message: "Conversion failed.",
                network_error_message: "Network error.",
            },
        }
    }

    /// Page title.
    pub fn title(self) -> &'static str {
        match self {
            Variant::Merge => "Merge PDF",
            Variant::Split => "Split PDF",
            Variant::Compress => "Compress PDF",
            Variant::ImageToImage => "Image Converter",
            Variant::ImageToPdf => "Image to PDF",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Per-variant behaviour record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantConfig {
    pub variant: Variant,
    /// Path of the processing endpoint, relative to the service root.
    pub endpoint: &'static str,
    /// Which declared MIME types are admitted.
    pub accepts: TypeFilter,
    /// Upper bound on collection size. `None` is unbounded.
    pub max_files: Option<usize>,
    /// Refuse a candidate whose name is already in the collection.
    pub reject_duplicate_names: bool,
    /// The user may rearrange the files; an `order[]` list is sent.
    pub reorderable: bool,
    /// A verification answer must accompany the submission.
    pub requires_challenge: bool,
    /// Multipart field name each file is sent under.
    pub file_field: &'static str,
    /// How download references come back.
    pub response: ResponseShape,
    pub progress_label: &'static str,
    pub complete_label: &'static str,
    /// Shown when a rejection carries no `error` text.
    pub failure_message: &'static str,
    /// Shown when no response could be obtained.
    pub network_error_message: &'static str,
}

/// Declared-MIME-type predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFilter {
    /// Exactly this type, e.g. `application/pdf`.
    Exact(&'static str),
    /// Any type starting with this prefix, e.g. `image/`.
    Prefix(&'static str),
}

impl TypeFilter {
    pub fn matches(&self, mime: &str) -> bool {
        match self {
            TypeFilter::Exact(t) => mime.eq_ignore_ascii_case(t),
            TypeFilter::Prefix(p) => {
                mime.len() > p.len()
                    && mime
                        .get(..p.len())
                        .is_some_and(|head| head.eq_ignore_ascii_case(p))
            }
        }
    }

    /// Short noun phrase used in rejection messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TypeFilter::Exact("application/pdf") => "a PDF",
            TypeFilter::Prefix("image/") => "an image",
            TypeFilter::Exact(t) | TypeFilter::Prefix(t) => t,
        }
    }
}

/// Shape of a successful reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{"download_url": "..."}`
    Single,
    /// `{"download_urls": ["...", ...]}`
    Multiple,
}
