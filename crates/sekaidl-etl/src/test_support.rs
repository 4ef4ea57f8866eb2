//! Fixtures shared by unit tests.

/// A short, silent MPEG-1 Layer III stream (mono, 128 kbit/s, 44.1 kHz).
pub(crate) fn silent_mp3() -> Vec<u8> {
    const FRAME_LEN: usize = 417;
    const HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0xC4];

    let mut bytes = Vec::with_capacity(FRAME_LEN * 40);
    for _ in 0..40 {
        bytes.extend_from_slice(&HEADER);
        bytes.resize(bytes.len() + FRAME_LEN - HEADER.len(), 0);
    }
    bytes
}
