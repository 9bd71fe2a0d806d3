use learnmart_core::hash_password;
use learnmart_models::{UserRole, normalize_email};
use sqlx::PgPool;
use uuid::Uuid;

/// Creates an admin account, or promotes nothing if the email is taken.
///
/// Admins cannot be created through the API.
pub async fn create_admin(
    db: &PgPool,
    name: &str,
    email: &str,
    password: &str,
) -> Result<Uuid, Box<dyn std::error::Error>> {
    let name = name.trim();
    let email = normalize_email(email);

    if name.is_empty() {
        return Err("Name must not be empty".into());
    }
    if !email.contains('@') {
        return Err("Email address is invalid".into());
    }
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".into());
    }

    let password_hash =
        hash_password(password).map_err(|e| format!("Failed to hash password: {}", e))?;

    let user_id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (id, name, email, password_hash, role)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (email) DO NOTHING
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(&email)
    .bind(&password_hash)
    .bind(UserRole::Admin)
    .fetch_optional(db)
    .await?;

    user_id.ok_or_else(|| "User with this email already exists".into())
}
