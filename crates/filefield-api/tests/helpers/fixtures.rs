//! Test fixtures: minimal image and document blobs.

/// Minimal valid 1x1 PNG bytes.
pub fn create_minimal_png() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
        0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x08, 0xD7, 0x63, 0xF8,
        0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x18, 0xDD, 0x8D, 0x89, 0x00, 0x00, 0x00,
        0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ]
}

/// RIFF/WEBP header padded to `size` bytes.
pub fn create_test_webp(size: usize) -> Vec<u8> {
    let mut webp = Vec::with_capacity(size.max(12));
    webp.extend_from_slice(b"RIFF");
    webp.extend_from_slice(&(size.saturating_sub(8) as u32).to_le_bytes());
    webp.extend_from_slice(b"WEBP");
    webp.resize(size.max(12), 0);
    webp
}

pub fn create_markdown(n: usize) -> Vec<u8> {
    format!("# Asset {}\n\nSome notes.\n", n).into_bytes()
}
