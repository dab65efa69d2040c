///
/// FNV-1a 64-bit hash (compile-time safe).
///
/// Used only for **static, non-cryptographic identifiers** such as handler
/// ids and entity-path constants in diagnostics.
///
/// - Deterministic across compilers and platforms
/// - `const fn`-compatible, so hashes can be computed at compile time
/// - Not cryptographically secure; never use for tokens or signatures
///   (token generation goes through XXH3 in `denorm::token`)
///
/// Reference: Fowler–Noll–Vo hash, FNV-1a variant (64-bit, prime = 0x100000001b3)
///
#[must_use]
#[allow(clippy::unreadable_literal)]
pub const fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf29ce484222325u64;
    let mut i = 0;

    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(0x100000001b3);
        i += 1;
    }

    hash
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::fnv1a_64;

    // Compile-time hash should match the runtime calculation for stability across platforms.
    const EMPTY_HASH: u64 = fnv1a_64(b"");

    #[test]
    fn produces_expected_reference_values() {
        assert_eq!(EMPTY_HASH, 0xcbf29ce484222325);
        assert_eq!(fnv1a_64(b"hello"), fnv1a_64(b"hello"));
        assert_ne!(fnv1a_64(b"m2m_pre_save"), fnv1a_64(b"m2m_post_save"));
    }
}
