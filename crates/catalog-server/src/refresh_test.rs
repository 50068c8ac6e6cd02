use super::*;

use catalog_core::TimeWindow;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn insert_product(pool: &PgPool, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    catalog_db::create_product_with_offers(pool, id, name, "refresh test product", &[])
        .await
        .expect("insert product");
    id
}

fn test_client(server: &MockServer) -> OfferClient {
    OfferClient::new(&server.uri(), "refresh-token", 5)
        .expect("client")
        .with_access_token(Some("access".to_string()))
}

async fn mount_offers(server: &MockServer, product_id: Uuid, offer_id: Uuid, price: i64) {
    Mock::given(method("GET"))
        .and(path(format!("/products/{product_id}/offers")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "id": offer_id, "price": price, "items_in_stock": 3 }
        ])))
        .mount(server)
        .await;
}

async fn mount_failure(server: &MockServer, product_id: Uuid) {
    Mock::given(method("GET"))
        .and(path(format!("/products/{product_id}/offers")))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(server)
        .await;
}

#[sqlx::test(migrations = "../../migrations")]
async fn pass_appends_snapshot_per_offer(pool: PgPool) {
    let server = MockServer::start().await;
    let product_id = insert_product(&pool, "Kettle").await;
    let offer_id = Uuid::new_v4();
    mount_offers(&server, product_id, offer_id, 1299).await;

    let report =
        run_refresh_pass(&pool, &test_client(&server), RefreshFailurePolicy::AbortPass).await;

    assert_eq!(report.outcome, PassOutcome::Completed);
    assert_eq!(report.products_checked, 1);
    assert_eq!(report.snapshots_appended, 1);

    let current = catalog_db::list_current_offers(&pool, product_id).await.unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].price, 1299);
}

#[sqlx::test(migrations = "../../migrations")]
async fn abort_policy_stops_at_first_failure(pool: PgPool) {
    let server = MockServer::start().await;
    let failing = insert_product(&pool, "First").await;
    let untouched = insert_product(&pool, "Second").await;
    mount_failure(&server, failing).await;

    Mock::given(method("GET"))
        .and(path(format!("/products/{untouched}/offers")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let report =
        run_refresh_pass(&pool, &test_client(&server), RefreshFailurePolicy::AbortPass).await;

    assert_eq!(
        report.outcome,
        PassOutcome::Aborted {
            product_id: failing
        }
    );
    assert_eq!(report.products_checked, 1);
    assert_eq!(report.products_failed, 1);
    assert_eq!(report.snapshots_appended, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn skip_policy_continues_past_failure(pool: PgPool) {
    let server = MockServer::start().await;
    let failing = insert_product(&pool, "First").await;
    let healthy = insert_product(&pool, "Second").await;
    let offer_id = Uuid::new_v4();
    mount_failure(&server, failing).await;
    mount_offers(&server, healthy, offer_id, 500).await;

    let report =
        run_refresh_pass(&pool, &test_client(&server), RefreshFailurePolicy::SkipProduct).await;

    assert_eq!(report.outcome, PassOutcome::Completed);
    assert_eq!(report.products_checked, 2);
    assert_eq!(report.products_failed, 1);
    assert_eq!(report.snapshots_appended, 1);

    let history = catalog_db::offer_history(&pool, offer_id, TimeWindow::unbounded())
        .await
        .unwrap();
    assert_eq!(history.total, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn deleted_products_are_not_refreshed(pool: PgPool) {
    let server = MockServer::start().await;
    let gone = insert_product(&pool, "Gone").await;
    catalog_db::soft_delete_product(&pool, gone).await.unwrap();

    Mock::given(method("GET"))
        .and(path(format!("/products/{gone}/offers")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let report =
        run_refresh_pass(&pool, &test_client(&server), RefreshFailurePolicy::AbortPass).await;
    assert_eq!(report.products_checked, 0);
    assert_eq!(report.outcome, PassOutcome::Completed);
}

#[sqlx::test(migrations = "../../migrations")]
async fn loop_runs_first_pass_immediately(pool: PgPool) {
    let server = MockServer::start().await;
    let product_id = insert_product(&pool, "Looped").await;
    mount_offers(&server, product_id, Uuid::new_v4(), 42).await;

    let handle = spawn_refresh_loop(
        pool.clone(),
        test_client(&server),
        Duration::from_secs(3600),
        RefreshFailurePolicy::AbortPass,
    );

    let mut appended = false;
    for _ in 0..100 {
        if !catalog_db::list_current_offers(&pool, product_id)
            .await
            .unwrap()
            .is_empty()
        {
            appended = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    handle.abort();

    assert!(appended, "first pass should run without waiting for the interval");
}
