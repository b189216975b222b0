//! Image payload decoding into `data:` URLs.

use crate::classify::FilePayload;
use crate::errors::{EditorError, EditorResult};
use base64::{engine::general_purpose::STANDARD, Engine};
use quire_document::Point;

/// Result of one image decode, with the insertion point captured at paste time
#[derive(Debug)]
pub struct DecodedImage {
    pub name: String,
    pub point: Point,
    pub result: EditorResult<String>,
}

/// Encode a payload as a base64 `data:` URL
pub fn encode_data_url(file: &FilePayload) -> EditorResult<String> {
    if file.bytes.is_empty() {
        return Err(EditorError::Decode(format!("{} has no content", file.name)));
    }
    Ok(format!("data:{};base64,{}", file.mime, STANDARD.encode(&file.bytes)))
}

/// [`encode_data_url`] on the blocking pool
pub async fn data_url(file: FilePayload) -> EditorResult<String> {
    tokio::task::spawn_blocking(move || encode_data_url(&file))
        .await
        .map_err(|e| EditorError::Decode(e.to_string()))?
}
