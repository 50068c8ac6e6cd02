//! Background offer refresh.
//!
//! One task, spawned at startup, runs a pass over every live product, then
//! sleeps for the configured interval, forever. Passes never overlap since
//! they run sequentially on the same task.

use std::time::Duration;

use catalog_core::RefreshFailurePolicy;
use catalog_db::NewOffer;
use catalog_offers::OfferClient;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// How a refresh pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Completed,
    /// Ended early at the first failing product under
    /// [`RefreshFailurePolicy::AbortPass`].
    Aborted { product_id: Uuid },
    /// Product ids could not be loaded; nothing was fetched.
    StoreUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub products_checked: usize,
    pub products_failed: usize,
    pub snapshots_appended: u64,
    pub outcome: PassOutcome,
}

/// Spawns the perpetual refresh loop. The first pass starts immediately.
///
/// Abort the returned handle to stop the loop.
pub fn spawn_refresh_loop(
    pool: PgPool,
    client: OfferClient,
    interval: Duration,
    policy: RefreshFailurePolicy,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(
            interval_secs = interval.as_secs(),
            policy = %policy,
            "refresh: loop started"
        );
        loop {
            let report = run_refresh_pass(&pool, &client, policy).await;
            tracing::info!(
                products_checked = report.products_checked,
                products_failed = report.products_failed,
                snapshots_appended = report.snapshots_appended,
                outcome = ?report.outcome,
                "refresh: pass finished"
            );
            tokio::time::sleep(interval).await;
        }
    })
}

/// Runs one pass: fetch current offers for every live product and append
/// them as new snapshots.
///
/// Failures are logged, never returned. A failed fetch or append either ends
/// the pass or skips the product, according to `policy`.
pub async fn run_refresh_pass(
    pool: &PgPool,
    client: &OfferClient,
    policy: RefreshFailurePolicy,
) -> RefreshReport {
    let mut report = RefreshReport {
        products_checked: 0,
        products_failed: 0,
        snapshots_appended: 0,
        outcome: PassOutcome::Completed,
    };

    let product_ids = match catalog_db::list_active_product_ids(pool).await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!(error = %e, "refresh: failed to load product ids");
            report.outcome = PassOutcome::StoreUnavailable;
            return report;
        }
    };

    for product_id in product_ids {
        report.products_checked += 1;

        match refresh_product(pool, client, product_id).await {
            Ok(appended) => report.snapshots_appended += appended,
            Err(reason) => {
                report.products_failed += 1;
                match policy {
                    RefreshFailurePolicy::AbortPass => {
                        tracing::error!(product_id = %product_id, %reason, "refresh: aborting pass");
                        report.outcome = PassOutcome::Aborted { product_id };
                        return report;
                    }
                    RefreshFailurePolicy::SkipProduct => {
                        tracing::warn!(product_id = %product_id, %reason, "refresh: skipping product");
                    }
                }
            }
        }
    }

    report
}

/// Fetches and stores offers for one product, returning the number of
/// snapshots appended or a description of what failed.
async fn refresh_product(
    pool: &PgPool,
    client: &OfferClient,
    product_id: Uuid,
) -> Result<u64, String> {
    let response = client
        .get_product_offers(product_id)
        .await
        .map_err(|e| format!("offer fetch error: {e}"))?;

    if !response.is_success() {
        return Err(format!(
            "offer fetch returned status {}",
            response.status.as_u16()
        ));
    }

    let offers: Vec<NewOffer> = response
        .offers
        .iter()
        .map(|o| NewOffer {
            offer_id: o.id,
            price: o.price,
            items_in_stock: o.items_in_stock,
        })
        .collect();

    let appended = catalog_db::append_offers(pool, product_id, &offers)
        .await
        .map_err(|e| format!("offer append error: {e}"))?;

    tracing::debug!(product_id = %product_id, appended, "refresh: product updated");
    Ok(appended)
}

#[cfg(test)]
#[path = "refresh_test.rs"]
mod tests;
