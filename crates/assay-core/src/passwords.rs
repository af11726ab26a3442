//! Temporary password generation for newly provisioned identities.

use rand::Rng;

/// Generate a random password of the given length using alphanumeric chars + symbols.
pub fn generate_temp_password(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%&*";
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correct_length() {
        for len in [8, 12, 16, 24] {
            let pw = generate_temp_password(len);
            assert_eq!(pw.len(), len);
        }
    }

    #[test]
    fn contains_valid_chars() {
        let pw = generate_temp_password(100);
        let valid: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%&*";
        for c in pw.chars() {
            assert!(valid.contains(c), "invalid character in password: {c}");
        }
    }

    #[test]
    fn not_all_same() {
        let pw = generate_temp_password(20);
        let first = pw.chars().next().unwrap();
        // Extremely unlikely all 20 chars are the same
        assert!(pw.chars().any(|c| c != first));
    }

    #[test]
    fn successive_passwords_differ() {
        let a = generate_temp_password(12);
        let b = generate_temp_password(12);
        assert_ne!(a, b);
    }
}
