//! Test fixtures: small file payloads.

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

/// PNG signature followed by filler up to `size` bytes.
pub fn create_png_of_size(size: usize) -> Vec<u8> {
    let mut png = create_minimal_png();
    png.resize(size.max(png.len()), 0xAB);
    png.truncate(size);
    png
}

/// Markdown document with a numbered heading.
pub fn create_markdown(n: usize) -> Vec<u8> {
    format!("# Asset {}\n\nSome notes.\n", n).into_bytes()
}
