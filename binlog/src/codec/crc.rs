/// CRC32 (ISO-3309 / zlib polynomial) as used by the binlog checksum footer.
pub fn crc32(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn matches_known_vector() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }
}
