use std::env;
use uuid::Uuid;

use rust_investor_api::db::Database;
use rust_investor_api::models::{FormState, RiskTolerance};
use rust_investor_api::persistence::ProfileStorage;

/// Smoke test for profile storage against a real database.
/// Marked ignored to avoid running against production by accident; set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn profile_round_trip_smoke_test() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url).await?;
    db.ensure_schema().await?;
    let storage = ProfileStorage::new(db.pool.clone());

    let user = Uuid::new_v4();
    let other = Uuid::new_v4();
    // Unique per run so earlier runs do not claim the document
    let document = format!("{:011}", user.as_u128() % 100_000_000_000);

    assert!(storage.fetch(user).await?.is_none());

    let form = FormState {
        full_name: "Teste Smoke".to_string(),
        document_id: document.clone(),
        risk_tolerance: RiskTolerance::Moderate,
        ..FormState::default()
    };
    storage.upsert(user, Some("smoke@example.com"), &form).await?;

    let loaded = storage.fetch(user).await?.expect("record stored");
    assert_eq!(loaded, form);

    let punctuated = format!("{}.{}-{}", &document[..3], &document[3..9], &document[9..]);
    assert!(storage.is_document_available(&punctuated, user).await?);
    assert!(!storage.is_document_available(&punctuated, other).await?);

    sqlx::query("DELETE FROM user_profiles WHERE id = $1")
        .bind(user)
        .execute(&db.pool)
        .await?;

    Ok(())
}
