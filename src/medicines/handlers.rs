use axum::{extract::State, routing::get, Router};
use tracing::{info, instrument};

use super::{
    dto::{MedicineQuery, MedicineRequest},
    repo::MedicineRepo,
    repo_types::Medicine,
};
use crate::{
    api::{ApiJson, ApiPath, ApiQuery, Created, Envelope},
    auth::{Permission, Session},
    error::{AppError, AppResult},
    state::AppState,
};

pub fn medicine_routes() -> Router<AppState> {
    Router::new()
        .route("/medicines", get(list_medicines).post(create_medicine))
        .route(
            "/medicines/:id",
            get(get_medicine).put(update_medicine).delete(delete_medicine),
        )
}

fn medicine_not_found() -> AppError {
    AppError::not_found("Medicine not found")
}

#[instrument(skip(state, session), fields(caller = session.user_id()))]
pub async fn list_medicines(
    State(state): State<AppState>,
    session: Session,
    ApiQuery(query): ApiQuery<MedicineQuery>,
) -> AppResult<Envelope<Vec<Medicine>>> {
    session.require(Permission::ViewInventory)?;
    let medicines = state.repo.list_medicines(query.into()).await?;
    Ok(Envelope::ok(medicines))
}

#[instrument(skip(state, session), fields(caller = session.user_id()))]
pub async fn get_medicine(
    State(state): State<AppState>,
    session: Session,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Envelope<Medicine>> {
    session.require(Permission::ViewInventory)?;
    let medicine = state
        .repo
        .find_medicine(id)
        .await?
        .ok_or_else(medicine_not_found)?;
    Ok(Envelope::ok(medicine))
}

#[instrument(skip(state, session, payload), fields(caller = session.user_id()))]
pub async fn create_medicine(
    State(state): State<AppState>,
    session: Session,
    ApiJson(payload): ApiJson<MedicineRequest>,
) -> AppResult<Created<Medicine>> {
    session.require(Permission::ManageInventory)?;
    let medicine = state.repo.create_medicine(payload.into_new()?).await?;
    info!(medicine_id = medicine.id, name = %medicine.name, "medicine created");
    Ok(Created(
        Envelope::ok(medicine).with_message("Medicine created successfully"),
    ))
}

#[instrument(skip(state, session, payload), fields(caller = session.user_id()))]
pub async fn update_medicine(
    State(state): State<AppState>,
    session: Session,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<MedicineRequest>,
) -> AppResult<Envelope<Medicine>> {
    session.require(Permission::ManageInventory)?;
    let existing = state
        .repo
        .find_medicine(id)
        .await?
        .ok_or_else(medicine_not_found)?;
    let changes = payload.into_changes(&existing)?;
    let medicine = state
        .repo
        .update_medicine(id, changes)
        .await?
        .ok_or_else(medicine_not_found)?;
    info!(medicine_id = medicine.id, "medicine updated");
    Ok(Envelope::ok(medicine).with_message("Medicine updated successfully"))
}

#[instrument(skip(state, session), fields(caller = session.user_id()))]
pub async fn delete_medicine(
    State(state): State<AppState>,
    session: Session,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<Envelope<()>> {
    session.require(Permission::ManageInventory)?;
    if state.repo.find_medicine(id).await?.is_none() {
        return Err(medicine_not_found());
    }
    if !state.repo.delete_medicine(id).await? {
        return Err(medicine_not_found());
    }
    info!(medicine_id = id, "medicine deleted");
    Ok(Envelope::message("Medicine deleted successfully"))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::{
        auth::Role,
        testing::{admin_token, call, seed_user, TestApp},
    };

    fn aspirin() -> Value {
        json!({
            "name": "Aspirin",
            "manufacturer": "Bayer",
            "batch_number": "ASP-2024-01",
            "manufacture_date": "2024-01-15",
            "expiry_date": "2026-01-15",
            "price": "4.99",
            "stock_quantity": 120
        })
    }

    #[tokio::test]
    async fn crud_lifecycle() {
        let app = TestApp::new();
        let token = admin_token(&app).await;

        let (status, body) = call(&app, "POST", "/api/medicines", Some(&token), Some(aspirin())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["expiry_date"], "2026-01-15");
        let id = body["data"]["id"].as_i64().unwrap();
        let path = format!("/api/medicines/{id}");

        let (status, body) = call(&app, "PUT", &path, Some(&token), Some(json!({ "stock_quantity": 80 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["stock_quantity"], 80);
        assert_eq!(body["data"]["name"], "Aspirin");

        let (status, body) = call(&app, "GET", &path, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["stock_quantity"], 80);

        let (status, _) = call(&app, "DELETE", &path, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, "DELETE", &path, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_cannot_move_expiry_before_manufacture() {
        let app = TestApp::new();
        let token = admin_token(&app).await;
        let (_, body) = call(&app, "POST", "/api/medicines", Some(&token), Some(aspirin())).await;
        let path = format!("/api/medicines/{}", body["data"]["id"]);

        let (status, body) = call(&app, "PUT", &path, Some(&token), Some(json!({ "expiry_date": "2023-01-01" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Expiry date cannot be before manufacture date");
    }

    #[tokio::test]
    async fn search_and_pagination() {
        let app = TestApp::new();
        let token = admin_token(&app).await;
        for (name, maker) in [("Ibuprofen", "Advil"), ("Aspirin", "Bayer"), ("Paracetamol", "GSK")] {
            let mut m = aspirin();
            m["name"] = json!(name);
            m["manufacturer"] = json!(maker);
            call(&app, "POST", "/api/medicines", Some(&token), Some(m)).await;
        }

        let (_, body) = call(&app, "GET", "/api/medicines", Some(&token), None).await;
        let names: Vec<_> = body["data"].as_array().unwrap().iter().map(|m| m["name"].clone()).collect();
        assert_eq!(names, vec![json!("Aspirin"), json!("Ibuprofen"), json!("Paracetamol")]);

        let (_, body) = call(&app, "GET", "/api/medicines?search=bay", Some(&token), None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, body) = call(&app, "GET", "/api/medicines?limit=1&offset=1", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["name"], "Ibuprofen");

        let (status, _) = call(&app, "GET", "/api/medicines?limit=abc", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let app = TestApp::new();
        let token = admin_token(&app).await;
        for name in ["Vitamin_C", "Vitamin D", "Zinc 50%"] {
            let mut m = aspirin();
            m["name"] = json!(name);
            call(&app, "POST", "/api/medicines", Some(&token), Some(m)).await;
        }

        let (_, body) = call(&app, "GET", "/api/medicines?search=_", Some(&token), None).await;
        let names: Vec<_> = body["data"].as_array().unwrap().iter().map(|m| m["name"].clone()).collect();
        assert_eq!(names, vec![json!("Vitamin_C")]);

        let (_, body) = call(&app, "GET", "/api/medicines?search=50%25", Some(&token), None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        let (_, body) = call(&app, "GET", "/api/medicines?search=%25", Some(&token), None).await;
        assert_eq!(body["data"][0]["name"], "Zinc 50%");
    }

    #[tokio::test]
    async fn oversized_price_is_rejected_and_summary_stays_up() {
        let app = TestApp::new();
        let token = admin_token(&app).await;

        let mut m = aspirin();
        m["price"] = json!("79228162514264337593543950335");
        m["stock_quantity"] = json!(2);
        let (status, body) = call(&app, "POST", "/api/medicines", Some(&token), Some(m)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let mut m = aspirin();
        m["price"] = json!("9999999999.99");
        m["stock_quantity"] = json!(i32::MAX);
        let (status, _) = call(&app, "POST", "/api/medicines", Some(&token), Some(m)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(&app, "GET", "/api/analytics/summary", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total_stock_units"], i64::from(i32::MAX));
    }

    #[tokio::test]
    async fn pharmacists_read_but_cannot_write() {
        let app = TestApp::new();
        let (_, token) = seed_user(&app, "rx@example.com", Role::Pharmacist).await;

        let (status, _) = call(&app, "GET", "/api/medicines", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, "POST", "/api/medicines", Some(&token), Some(aspirin())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn malformed_body_is_enveloped() {
        let app = TestApp::new();
        let token = admin_token(&app).await;
        let (status, body) = call(
            &app,
            "POST",
            "/api/medicines",
            Some(&token),
            Some(json!({ "name": "X", "manufacture_date": "15/01/2024" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
}
