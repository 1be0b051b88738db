// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{EmpresaRepository, UserRepository},
    models::auth::{Claims, User, UserEmpresa},
};

const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    empresa_repo: EmpresaRepository,
    jwt_secret: String,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        empresa_repo: EmpresaRepository,
        jwt_secret: String,
        pool: PgPool,
    ) -> Self {
        Self { user_repo, empresa_repo, jwt_secret, pool }
    }

    pub async fn register_user(&self, email: &str, password: &str, nome: &str) -> Result<String, AppError> {
        // 1. Hashing fora da transação, não toca no banco
        let hashed_password = hash_password(password).await?;

        let new_user = self
            .user_repo
            .create_user(&self.pool, email.trim(), &hashed_password, nome.trim())
            .await?;

        tracing::info!("Usuário registrado: {}", new_user.id);
        self.create_token(new_user.id)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let check = check_password(password, &user.password_hash).await?;
        if !check.valid {
            return Err(AppError::InvalidCredentials);
        }

        // Hash legado (SHA-256) migra para bcrypt no primeiro login.
        if check.needs_rehash {
            let new_hash = hash_password(password).await?;
            self.user_repo
                .update_password(&self.pool, user.id, &new_hash)
                .await?;
            tracing::info!("Senha do usuário {} migrada para bcrypt", user.id);
        }

        self.create_token(user.id)
    }

    /// Valida o token e devolve o usuário e as claims (o `jti` é usado no logout).
    pub async fn validate_token(&self, token: &str) -> Result<(User, Claims), AppError> {
        let claims = decode_claims(token, &self.jwt_secret)?;

        if self.user_repo.is_token_revoked(claims.jti).await? {
            return Err(AppError::InvalidToken);
        }

        let user = self
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)?;

        Ok((user, claims))
    }

    /// Revoga o token apresentado até a sua expiração natural.
    pub async fn logout(&self, claims: &Claims) -> Result<(), AppError> {
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp as i64, 0)
            .unwrap_or_else(Utc::now);
        self.user_repo
            .revoke_token(claims.jti, claims.sub, expires_at)
            .await?;
        tracing::info!("Logout do usuário {}", claims.sub);
        Ok(())
    }

    pub async fn my_empresas(&self, user_id: Uuid) -> Result<Vec<UserEmpresa>, AppError> {
        self.empresa_repo.get_empresas_for_user(user_id).await
    }

    pub async fn change_own_password(
        &self,
        user: &User,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let check = check_password(current_password, &user.password_hash).await?;
        if !check.valid {
            return Err(AppError::InvalidCredentials);
        }

        let new_hash = hash_password(new_password).await?;

        let mut tx = self.pool.begin().await?;
        self.user_repo.update_password(&mut *tx, user.id, &new_hash).await?;
        self.user_repo
            .insert_password_log(&mut *tx, None, user.id, user.id, "SELF_CHANGE")
            .await?;
        tx.commit().await?;

        tracing::info!("Usuário {} trocou a própria senha", user.id);
        Ok(())
    }

    fn create_token(&self, user_id: Uuid) -> Result<String, AppError> {
        encode_claims(&new_claims(user_id, Utc::now()), &self.jwt_secret)
    }
}

// ---
// Senhas
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordCheck {
    pub valid: bool,
    /// A senha bateu com um hash legado e deve ser regravada em bcrypt.
    pub needs_rehash: bool,
}

/// bcrypt numa thread de bloqueio.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

/// Compara a senha com o hash gravado, aceitando bcrypt ou SHA-256 legado (hex).
pub async fn check_password(password: &str, stored_hash: &str) -> Result<PasswordCheck, AppError> {
    if is_legacy_sha256(stored_hash) {
        return Ok(PasswordCheck {
            valid: verify_legacy_sha256(password, stored_hash),
            needs_rehash: true,
        });
    }

    let password = password.to_owned();
    let stored_hash = stored_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &stored_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

    Ok(PasswordCheck { valid, needs_rehash: false })
}

fn is_legacy_sha256(stored_hash: &str) -> bool {
    stored_hash.len() == 64 && stored_hash.bytes().all(|b| b.is_ascii_hexdigit())
}

fn verify_legacy_sha256(password: &str, stored_hash: &str) -> bool {
    let digest = Sha256::digest(password.as_bytes());
    let computed: String = digest.iter().map(|b| format!("{:02x}", b)).collect();

    // Comparação sem curto-circuito.
    computed
        .bytes()
        .zip(stored_hash.to_ascii_lowercase().bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

// ---
// Tokens
// ---

fn new_claims(user_id: Uuid, now: DateTime<Utc>) -> Claims {
    let expires_at = now + chrono::Duration::days(TOKEN_TTL_DAYS);
    Claims {
        sub: user_id,
        jti: Uuid::new_v4(),
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    }
}

fn encode_claims(claims: &Claims, secret: &str) -> Result<String, AppError> {
    Ok(encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?)
}

fn decode_claims(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::InvalidToken)?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "segredo-de-teste";

    #[test]
    fn token_round_trip_keeps_subject_and_jti() {
        let user_id = Uuid::new_v4();
        let claims = new_claims(user_id, Utc::now());
        let token = encode_claims(&claims, SECRET).unwrap();

        let decoded = decode_claims(&token, SECRET).unwrap();
        assert_eq!(decoded.sub, user_id);
        assert_eq!(decoded.jti, claims.jti);
        assert_eq!(decoded.exp - decoded.iat, (TOKEN_TTL_DAYS * 24 * 3600) as usize);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = encode_claims(&new_claims(Uuid::new_v4(), Utc::now()), "outro").unwrap();
        assert!(matches!(decode_claims(&token, SECRET), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let issued = Utc::now() - chrono::Duration::days(TOKEN_TTL_DAYS + 1);
        let token = encode_claims(&new_claims(Uuid::new_v4(), issued), SECRET).unwrap();
        assert!(matches!(decode_claims(&token, SECRET), Err(AppError::InvalidToken)));
    }

    #[test]
    fn each_token_gets_its_own_jti() {
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        assert_ne!(new_claims(user_id, now).jti, new_claims(user_id, now).jti);
    }

    #[test]
    fn legacy_hash_detection() {
        // sha256("senha123")
        let legacy = "55a5e9e78207b4df8699d60886fa070079463547b095d1a05bc719bb4e6cd251";
        assert!(is_legacy_sha256(legacy));
        assert!(!is_legacy_sha256("$2b$12$abcdefghijklmnopqrstuv"));
        assert!(!is_legacy_sha256("xyz"));
    }

    #[tokio::test]
    async fn legacy_password_matches_and_asks_for_rehash() {
        let legacy = "55a5e9e78207b4df8699d60886fa070079463547b095d1a05bc719bb4e6cd251";

        let ok = check_password("senha123", legacy).await.unwrap();
        assert_eq!(ok, PasswordCheck { valid: true, needs_rehash: true });

        let upper = check_password("senha123", &legacy.to_uppercase()).await.unwrap();
        assert!(upper.valid);

        let wrong = check_password("senha124", legacy).await.unwrap();
        assert!(!wrong.valid);
    }

    #[tokio::test]
    async fn bcrypt_password_round_trip() {
        let hashed = hash_password("minha-senha").await.unwrap();
        assert!(hashed.starts_with("$2"));

        let ok = check_password("minha-senha", &hashed).await.unwrap();
        assert_eq!(ok, PasswordCheck { valid: true, needs_rehash: false });

        let wrong = check_password("outra", &hashed).await.unwrap();
        assert!(!wrong.valid);
    }
}
