//! # Content Classification
//!
//! Decides what pasted or dropped content becomes:
//!
//! ```text
//! files with an image/* payload  → decode each image → image insertion
//! text that is an image URL      → image insertion
//! anything else                  → plain text (lines become blocks)
//! ```

use crate::errors::InvalidUrl;
use serde::{Deserialize, Serialize};
use url::Url;

/// File extensions recognized as images; matched exactly, case included
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "3dv", "ai", "amf", "art", "ase", "avif", "awg", "blp", "bmp", "bw", "cd5", "cdr", "cgm",
    "cit", "cmx", "cpt", "cr2", "cur", "cut", "dds", "dib", "djvu", "dxf", "e2d", "ecw", "egt",
    "emf", "eps", "exif", "fs", "gbr", "gif", "gpl", "grf", "hdp", "heic", "heif", "icns", "ico",
    "iff", "int", "inta", "jfif", "jng", "jp2", "jpeg", "jpg", "jps", "jxr", "lbm", "liff", "max",
    "miff", "mng", "msp", "nitf", "nrrd", "odg", "ota", "pam", "pbm", "pc1", "pc2", "pc3", "pcf",
    "pct", "pcx", "pdd", "pdn", "pgf", "pgm", "PI1", "PI2", "PI3", "pict", "png", "pnm", "pns",
    "ppm", "psb", "psd", "psp", "px", "pxm", "pxr", "qfx", "raw", "rgb", "rgba", "rle", "sct",
    "sgi", "sid", "stl", "sun", "svg", "sxd", "tga", "tif", "tiff", "v2d", "vnd", "vrml", "vtf",
    "wdp", "webp", "wmf", "x3d", "xar", "xbm", "xcf", "xpm",
];

/// A binary payload from a paste or drop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePayload {
    pub name: String,
    /// Media type such as `image/png`
    pub mime: String,
    #[serde(default)]
    pub bytes: Vec<u8>,
}

impl FilePayload {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime.split('/').next() == Some("image")
    }
}

/// Everything an input collaborator hands over for one paste
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalContent {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub files: Vec<FilePayload>,
}

impl ExternalContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            files: Vec::new(),
        }
    }

    pub fn files(files: Vec<FilePayload>) -> Self {
        Self { text: None, files }
    }
}

/// Routing decision for a piece of external content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Image files to decode; non-image files already dropped
    Images(Vec<FilePayload>),
    /// Normalized serialization of the parsed URL
    ImageUrl(String),
    Text(String),
    Empty,
}

pub fn classify(content: &ExternalContent) -> Classification {
    let images: Vec<FilePayload> = content.files.iter().filter(|f| f.is_image()).cloned().collect();
    if !images.is_empty() {
        return Classification::Images(images);
    }

    match content.text.as_deref() {
        Some(text) if text.is_empty() => Classification::Empty,
        Some(text) => match validate_image_url(text) {
            Ok(url) => Classification::ImageUrl(url.into()),
            Err(_) => Classification::Text(text.to_string()),
        },
        None => Classification::Empty,
    }
}

pub fn is_image_url(candidate: &str) -> bool {
    validate_image_url(candidate).is_ok()
}

/// Absolute URL whose last path segment ends in a known image extension.
/// Whitespace anywhere in the candidate rejects it, even where the URL parser would trim it.
pub fn validate_image_url(candidate: &str) -> Result<Url, InvalidUrl> {
    if candidate.is_empty() || candidate.contains(char::is_whitespace) {
        return Err(InvalidUrl::Unparseable(candidate.to_string()));
    }
    let url = Url::parse(candidate).map_err(|_| InvalidUrl::Unparseable(candidate.to_string()))?;

    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    let extension = match segment.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => ext,
        _ => return Err(InvalidUrl::MissingExtension(candidate.to_string())),
    };

    if IMAGE_EXTENSIONS.contains(&extension) {
        Ok(url)
    } else {
        Err(InvalidUrl::UnsupportedExtension {
            url: candidate.to_string(),
            extension: extension.to_string(),
        })
    }
}
