use sqlx::PgPool;

use crate::models::{Provider, Verification};

/// Fetch a provider by wallet address (case-insensitive).
pub async fn get_provider(pool: &PgPool, address: &str) -> anyhow::Result<Option<Provider>> {
    let provider = sqlx::query_as::<_, Provider>(
        "SELECT * FROM providers WHERE LOWER(address) = LOWER($1)",
    )
    .bind(address)
    .fetch_optional(pool)
    .await?;

    Ok(provider)
}

/// Addresses of every registered provider, for the verification sweep.
pub async fn list_provider_addresses(pool: &PgPool) -> anyhow::Result<Vec<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT address FROM providers ORDER BY created_at ASC")
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().map(|(a,)| a).collect())
}

/// Overwrite the provider's derived trust projection in one statement.
/// Score, tier, verified flag, badges and the check audit list always move
/// together — a partial update would expose an inconsistent snapshot.
pub async fn update_provider_trust(
    pool: &PgPool,
    verification: &Verification,
) -> anyhow::Result<()> {
    let badges: Vec<String> = verification
        .badges
        .iter()
        .map(|b| b.as_str().to_string())
        .collect();
    let checks_json = serde_json::to_string(&verification.checks)?;

    sqlx::query(
        r#"
        UPDATE providers
        SET overall_score = $2,
            tier = $3,
            verified = $4,
            badges = $5,
            checks = $6,
            trust_updated_at = NOW()
        WHERE LOWER(address) = LOWER($1)
        "#,
    )
    .bind(&verification.address)
    .bind(verification.overall_score)
    .bind(verification.tier.as_str())
    .bind(verification.verified)
    .bind(&badges)
    .bind(checks_json)
    .execute(pool)
    .await?;

    Ok(())
}
