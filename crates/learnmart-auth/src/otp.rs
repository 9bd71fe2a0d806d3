//! Sign-up one-time codes.
//!
//! Codes are six random digits. Only a SHA-256 digest bound to the email is
//! stored, so a leaked cache entry does not reveal the code.

use rand::Rng;
use sha2::{Digest, Sha256};

use learnmart_models::normalize_email;

use crate::tokens::constant_time_eq;

pub const OTP_LENGTH: usize = 6;

pub fn generate_otp() -> String {
    let code: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", code)
}

pub fn hash_otp(email: &str, otp: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_email(email).as_bytes());
    hasher.update(b":");
    hasher.update(otp.trim().as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_otp(email: &str, otp: &str, expected_hash: &str) -> bool {
    let actual = hash_otp(email, otp);
    constant_time_eq(actual.as_bytes(), expected_hash.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_otp_is_six_digits() {
        for _ in 0..50 {
            let otp = generate_otp();
            assert_eq!(otp.len(), OTP_LENGTH);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_verify_otp() {
        let hash = hash_otp("Ada@Example.com", "042137");
        assert!(verify_otp("ada@example.com", "042137", &hash));
        assert!(!verify_otp("ada@example.com", "042138", &hash));
        assert!(!verify_otp("eve@example.com", "042137", &hash));
    }
}
