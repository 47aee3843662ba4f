use metrics::counter;
use sqlx::PgPool;
use tokio::time::{interval, Duration};

use crate::db::{provider_repo, signal_repo};
use crate::engine::verification;
use crate::models::Tier;

/// Run the periodic verification sweep. Each provider is an independent
/// unit of work; a failure for one is logged and the sweep continues.
/// Tier changes between runs are detectable because the computation is
/// deterministic over the store contents.
pub async fn run_verification_runner(pool: PgPool, interval_secs: u64) {
    let mut ticker = interval(Duration::from_secs(interval_secs));

    loop {
        ticker.tick().await;

        let addresses = match provider_repo::list_provider_addresses(&pool).await {
            Ok(a) => a,
            Err(e) => {
                tracing::error!(error = %e, "Verification sweep: failed to list providers");
                continue;
            }
        };

        tracing::info!(providers = addresses.len(), "Starting verification sweep");

        for address in &addresses {
            if let Err(e) = verify_one(&pool, address).await {
                tracing::warn!(error = %e, address = %address, "Verification failed for provider");
            }
        }
    }
}

async fn verify_one(pool: &PgPool, address: &str) -> anyhow::Result<()> {
    let Some(provider) = provider_repo::get_provider(pool, address).await? else {
        anyhow::bail!("provider vanished mid-sweep");
    };
    let signals = signal_repo::list_signals_by_provider(pool, address).await?;

    let old_tier = Tier::from_db_str(&provider.tier).unwrap_or(Tier::Unranked);
    let result = verification::calculate_verification(&provider, &signals);

    if result.tier != old_tier {
        counter!("tier_changes_total").increment(1);
        tracing::info!(
            address = %result.address,
            old_tier = %old_tier,
            new_tier = %result.tier,
            score = %result.overall_score,
            "Provider tier changed"
        );
    }

    verification::persist_verification(pool, &result).await
}
