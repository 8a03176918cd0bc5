use actix_web::{http::header, web, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::error::AppError;
use crate::models::dto::ScanPayload;
use crate::services::ingestion_service::{IngestionService, ScanCommand};

/// POST /api/rfid/scan - Scan d'un badge par le lecteur embarqué (PUBLIC)
/// Accepte JSON ou formulaire
pub async fn scan(
    req: HttpRequest,
    body: web::Bytes,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    // 1. Décoder le corps selon le Content-Type
    let payload = parse_scan_body(&req, &body)?;

    // 2. Valider les champs (aucune écriture si invalide)
    let command = ScanCommand::from_payload(payload)?;

    // 3. Enregistrer et renvoyer le téléphone du parent
    let response = IngestionService::record_scan(db.get_ref(), command).await?;

    Ok(HttpResponse::Ok().json(response))
}

fn parse_scan_body(req: &HttpRequest, body: &[u8]) -> Result<ScanPayload, AppError> {
    let is_json = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));

    if is_json {
        serde_json::from_slice(body).map_err(|_| AppError::invalid("Invalid JSON format."))
    } else {
        serde_urlencoded::from_bytes(body).map_err(|_| AppError::invalid("Error parsing request body."))
    }
}

async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(json!({
        "status": "error",
        "message": "Invalid request method. Only POST is allowed."
    }))
}

pub fn rfid_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/rfid").service(
            web::resource("/scan")
                .route(web::post().to(scan))
                .default_service(web::to(method_not_allowed)),
        ),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use sea_orm::ConnectionTrait;
    use serde_json::{json, Value};

    use crate::models::boarding_history::BoardingAction;
    use crate::services::store_service::StoreService;
    use crate::test_support::{self, test_app};

    #[actix_web::test]
    async fn test_scan_json_success() {
        let (db, fx) = test_support::seeded_db().await;
        let app = test_app!(db);

        let req = test::TestRequest::post()
            .uri("/api/rfid/scan")
            .set_json(json!({"rfid": "TAG42", "bus_id": 7}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"student_name": "Amy", "parent_phone_number": "5551234"}));

        let history = StoreService::history_for_student(&db, fx.student.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, BoardingAction::Board);
    }

    #[actix_web::test]
    async fn test_scan_form_encoded() {
        let (db, _fx) = test_support::seeded_db().await;
        let app = test_app!(db);

        let req = test::TestRequest::post()
            .uri("/api/rfid/scan")
            .set_form([("rfid", "TAG42"), ("bus_id", "7"), ("action", "alight"), ("gps_location", "45.5,-73.6")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(test_support::history_count(&db).await, 1);
    }

    #[actix_web::test]
    async fn test_scan_unknown_student() {
        let (db, _fx) = test_support::seeded_db().await;
        let app = test_app!(db);

        let req = test::TestRequest::post()
            .uri("/api/rfid/scan")
            .set_json(json!({"rfid": "NOPE", "bus_id": 7}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"status": "error", "message": "Student not found."}));
        assert_eq!(test_support::history_count(&db).await, 0);
    }

    #[actix_web::test]
    async fn test_scan_unknown_bus() {
        let (db, _fx) = test_support::seeded_db().await;
        let app = test_app!(db);

        let req = test::TestRequest::post()
            .uri("/api/rfid/scan")
            .set_json(json!({"rfid": "TAG42", "bus_id": "404"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Bus not found.");
        assert_eq!(test_support::history_count(&db).await, 0);
    }

    #[actix_web::test]
    async fn test_scan_missing_fields() {
        let (db, _fx) = test_support::seeded_db().await;
        let app = test_app!(db);

        let cases = [
            (json!({"bus_id": 7}), "RFID is required."),
            (json!({"rfid": "TAG42"}), "Bus ID is required."),
            (json!({"rfid": "TAG42", "bus_id": 7, "action": "fly"}), "Action must be 'board' or 'alight'."),
        ];
        for (payload, message) in cases {
            let req = test::TestRequest::post().uri("/api/rfid/scan").set_json(payload).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({"status": "error", "message": message}));
        }
        assert_eq!(test_support::history_count(&db).await, 0);
    }

    #[actix_web::test]
    async fn test_scan_invalid_json() {
        let (db, _fx) = test_support::seeded_db().await;
        let app = test_app!(db);

        let req = test::TestRequest::post()
            .uri("/api/rfid/scan")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_scan_numeric_rfid() {
        let (db, _fx) = test_support::seeded_db().await;
        let (_, child) = test_support::family(&db, "ben_parent", "5550042", "Ben", "42").await;
        let app = test_app!(db);

        let req = test::TestRequest::post()
            .uri("/api/rfid/scan")
            .set_json(json!({"rfid": 42, "bus_id": 7}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"student_name": "Ben", "parent_phone_number": "5550042"}));
        let history = StoreService::history_for_student(&db, child.id).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[actix_web::test]
    async fn test_scan_storage_failure() {
        let (db, _fx) = test_support::seeded_db().await;
        db.execute_unprepared("DROP TABLE boarding_history").await.unwrap();
        let app = test_app!(db);

        let req = test::TestRequest::post()
            .uri("/api/rfid/scan")
            .set_json(json!({"rfid": "TAG42", "bus_id": 7}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"status": "error", "message": "An unexpected server error occurred."}));
    }

    #[actix_web::test]
    async fn test_scan_wrong_method() {
        let (db, _fx) = test_support::seeded_db().await;
        let app = test_app!(db);

        let req = test::TestRequest::get().uri("/api/rfid/scan").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
