//! Key layout. Every key is `{prefix}:{kind}:{id}`.

use uuid::Uuid;

fn build_key(prefix: &str, parts: &[&str]) -> String {
    format!("{}:{}", prefix, parts.join(":"))
}

pub fn pending_signup(prefix: &str, email: &str) -> String {
    build_key(prefix, &["otp", email])
}

pub fn session(prefix: &str, jti: &str) -> String {
    build_key(prefix, &["session", jti])
}

/// Set of live session ids for one user.
pub fn user_sessions(prefix: &str, user_id: Uuid) -> String {
    build_key(prefix, &["user-sessions", &user_id.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(pending_signup("learnmart", "a@b.com"), "learnmart:otp:a@b.com");
        assert_eq!(session("learnmart", "abc"), "learnmart:session:abc");
        assert_eq!(
            user_sessions("lm", Uuid::nil()),
            "lm:user-sessions:00000000-0000-0000-0000-000000000000"
        );
    }
}
