use map_core::RequestDescriptor;

/// Compute a BLAKE3 content-addressed ID for arbitrary bytes.
pub fn cid_b3(bytes: &[u8]) -> String {
    let hash = blake3::hash(bytes);
    format!("b3:{}", hex::encode(hash.as_bytes()))
}

/// Fingerprint of a fully resolved request, used to correlate log lines.
pub fn request_cid(request: &RequestDescriptor) -> String {
    let bytes = serde_json::to_vec(request).unwrap_or_default();
    cid_b3(&bytes)
}
