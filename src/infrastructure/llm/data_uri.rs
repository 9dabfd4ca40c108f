use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Inline image decoded from a `data:<mime>;base64,<data>` URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64 payload as received, validated to decode
    pub data: String,
}

/// Parse a base64 data URI. Remote URLs, other encodings and invalid base64
/// yield `None`.
pub fn parse_data_uri(uri: &str) -> Option<InlineImage> {
    let rest = uri.strip_prefix("data:")?;
    let (mime_type, data) = rest.split_once(";base64,")?;

    if mime_type.is_empty() || data.is_empty() {
        return None;
    }

    if let Err(e) = STANDARD.decode(data) {
        tracing::warn!(mime_type = %mime_type, error = %e, "Skipping image with invalid base64 data");
        return None;
    }

    Some(InlineImage {
        mime_type: mime_type.to_string(),
        data: data.to_string(),
    })
}
