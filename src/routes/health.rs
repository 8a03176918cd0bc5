use actix_web::{get, HttpResponse};
use chrono::Utc;

use crate::models::health::HealthResponse;

/// GET /api/health - Sonde de vie (PUBLIC)
#[get("/health")]
pub async fn health_check() -> HttpResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        time: Utc::now(),
    };

    HttpResponse::Ok().json(response)
}

#[cfg(test)]
mod tests {
    use actix_web::test;
    use serde_json::Value;

    use crate::test_support::{self, test_app};

    #[actix_web::test]
    async fn test_health() {
        let db = test_support::setup_db().await;
        let app = test_app!(db);

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
    }
}
