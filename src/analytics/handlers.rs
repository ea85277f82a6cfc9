use axum::{extract::State, routing::get, Router};
use tracing::{debug, instrument};

use super::{
    repo::AnalyticsRepo,
    repo_types::{InventorySummary, SummaryParams},
};
use crate::{
    api::Envelope,
    auth::{Permission, Session},
    dates,
    error::AppResult,
    state::AppState,
};

pub fn analytics_routes() -> Router<AppState> {
    Router::new().route("/analytics/summary", get(summary))
}

#[instrument(skip(state, session), fields(caller = session.user_id()))]
pub async fn summary(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Envelope<InventorySummary>> {
    session.require(Permission::ViewAnalytics)?;
    let cfg = &state.config.analytics;
    let params = SummaryParams {
        today: dates::today(),
        low_stock_threshold: cfg.low_stock_threshold,
        expiry_warning_days: cfg.expiry_warning_days,
    };
    let summary = state.repo.inventory_summary(params).await?;
    debug!(
        low_stock = summary.low_stock.len(),
        expiring = summary.expiring_soon.len(),
        "summary computed"
    );
    Ok(Envelope::ok(summary))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use time::Duration;

    use crate::{
        auth::Role,
        dates,
        testing::{admin_token, call, seed_user, TestApp},
    };

    #[tokio::test]
    async fn summary_reflects_inventory() {
        let app = TestApp::new();
        let token = admin_token(&app).await;
        let soon = dates::today() + Duration::days(5);
        let past = dates::today() - Duration::days(5);

        for (name, stock, expiry) in [("Low", 3, soon), ("Plenty", 500, past)] {
            let (status, _) = call(
                &app,
                "POST",
                "/api/medicines",
                Some(&token),
                Some(json!({
                    "name": name, "manufacturer": "Acme", "batch_number": name,
                    "manufacture_date": "2020-01-01",
                    "expiry_date": expiry.format(dates::ISO_DATE).unwrap(),
                    "price": "2.00", "stock_quantity": stock
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = call(&app, "GET", "/api/analytics/summary", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["counts"]["medicines"], 2);
        assert_eq!(data["counts"]["users"], 1);
        assert_eq!(data["total_stock_units"], 503);
        assert_eq!(data["expired_count"], 1);
        assert_eq!(data["low_stock"][0]["name"], "Low");
        assert_eq!(data["expiring_soon"][0]["days_left"], 5);
        assert_eq!(data["expiring_soon"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn pharmacists_cannot_view_analytics() {
        let app = TestApp::new();
        let (_, token) = seed_user(&app, "ph@example.com", Role::Pharmacist).await;
        let (status, body) = call(&app, "GET", "/api/analytics/summary", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], false);
    }
}
