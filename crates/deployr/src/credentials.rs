use sha1::{Digest, Sha1};

/// Hashes a password the way the login resource expects it: the SHA-1
/// digest as lowercase hex. The plain password never leaves the client.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_is_lowercase_sha1_hex() {
        assert_eq!(
            hash_password("password"),
            "5baa61e4c9b93f3f0682250b6cf8331b7ee68fd8"
        );
        assert_eq!(
            hash_password(""),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }
}
