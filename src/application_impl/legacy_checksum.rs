//! Password digest of the legacy back office: a plain CRC-32/ISO-HDLC of the
//! UTF-8 bytes, stored as uppercase hex without zero padding. It is not a
//! password hash; it stays only so existing rows keep verifying.

/// CRC-32/ISO-HDLC (reflected polynomial `0xEDB88320`).
pub fn checksum(password: &str) -> u32 {
    crc32fast::hash(password.as_bytes())
}

/// Stored form of [`checksum`], e.g. `"972D361"` for `"123456"`.
pub fn checksum_hex(password: &str) -> String {
    format!("{:X}", checksum(password))
}

/// Empty candidates and blank stored values never match.
pub fn verify(candidate: &str, stored: &str) -> bool {
    let stored = stored.trim();
    if candidate.is_empty() || stored.is_empty() {
        return false;
    }
    checksum_hex(candidate) == stored
}
