use crate::circuit_breaker::{create_db_circuit_breaker, guarded, StorageBreaker};
use crate::errors::{AppError, ResultExt};
use crate::models::FormState;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Questionnaire records, one opaque JSON document per user.
pub struct ProfileStorage {
    pool: PgPool,
    breaker: StorageBreaker,
}

impl ProfileStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            breaker: create_db_circuit_breaker(),
        }
    }

    /// Inserts or replaces the user's record. `email` is the authenticated
    /// address when known; otherwise the form's own email is stored.
    pub async fn upsert(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        form: &FormState,
    ) -> Result<(), AppError> {
        let email = email
            .filter(|e| !e.trim().is_empty())
            .unwrap_or(&form.email);
        let cpf = digits_only(&form.document_id);

        tracing::info!("Saving questionnaire for user {}", user_id);

        guarded(
            &self.breaker,
            sqlx::query(
                r#"
                INSERT INTO user_profiles (id, email, cpf, dados, updated_at)
                VALUES ($1, $2, $3, $4, now())
                ON CONFLICT (id) DO UPDATE
                   SET email = EXCLUDED.email,
                       cpf = EXCLUDED.cpf,
                       dados = EXCLUDED.dados,
                       updated_at = now()
                "#,
            )
            .bind(user_id)
            .bind(email)
            .bind(cpf)
            .bind(Json(form))
            .execute(&self.pool),
        )
        .await
        .with_context(|| format!("saving profile {}", user_id))?;

        tracing::info!("Questionnaire saved for user {}", user_id);
        Ok(())
    }

    /// The user's stored answers, or `None` when nothing was saved yet.
    /// Missing or `null` fields load as defaults.
    pub async fn fetch(&self, user_id: Uuid) -> Result<Option<FormState>, AppError> {
        let row: Option<(Json<FormState>,)> = guarded(
            &self.breaker,
            sqlx::query_as("SELECT dados FROM user_profiles WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool),
        )
        .await
        .with_context(|| format!("loading profile {}", user_id))?;

        match row {
            Some((Json(form),)) => {
                tracing::debug!("Loaded questionnaire for user {}", user_id);
                Ok(Some(form))
            }
            None => {
                tracing::info!("No stored questionnaire for user {}", user_id);
                Ok(None)
            }
        }
    }

    /// Whether `document_id` may be used by `user_id`: true when no record
    /// carries it or the user's own record does. Punctuation is ignored on
    /// both sides.
    pub async fn is_document_available(
        &self,
        document_id: &str,
        user_id: Uuid,
    ) -> Result<bool, AppError> {
        let digits = digits_only(document_id);
        if digits.is_empty() {
            return Ok(true);
        }

        let owners: Vec<(Uuid,)> = guarded(
            &self.breaker,
            sqlx::query_as(
                r#"
                SELECT id FROM user_profiles
                 WHERE regexp_replace(dados->>'documentId', '\D', '', 'g') = $1
                "#,
            )
            .bind(&digits)
            .fetch_all(&self.pool),
        )
        .await
        .context("checking document availability")?;

        let available = document_owners_allow(&owners, user_id);
        if !available {
            tracing::warn!("Document already registered to another account");
        }
        Ok(available)
    }
}

fn document_owners_allow(owners: &[(Uuid,)], user_id: Uuid) -> bool {
    owners.iter().all(|(owner,)| *owner == user_id)
}

/// Keeps only ASCII digits (CPF punctuation is not significant).
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only("123.456.789-09"), "12345678909");
        assert_eq!(digits_only(" 123 456 "), "123456");
        assert_eq!(digits_only("abc"), "");
    }

    #[test]
    fn test_owner_rules() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert!(document_owners_allow(&[], me));
        assert!(document_owners_allow(&[(me,)], me));
        assert!(!document_owners_allow(&[(other,)], me));
        assert!(!document_owners_allow(&[(me,), (other,)], me));
    }
}
