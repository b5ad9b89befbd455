/// The bytes of an instrument that has never been edited
///
/// Songs contain lots of these, so the compression algorithm has a dedicated command for them.
pub const DEFAULT_INSTRUMENT: [u8; 16] = [
    0xA8, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x03, 0x00, 0x00, 0xD0, 0x00, 0x00, 0x00, 0xF3, 0x00, 0x00,
];
