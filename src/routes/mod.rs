pub mod admin;
pub mod auth;
pub mod bus;
pub mod driver;
pub mod health;
pub mod parent;
pub mod rfid;
pub mod tracking;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(health::health_check)
            .configure(auth::auth_routes)
            .configure(rfid::rfid_routes)
            .configure(bus::bus_routes)
            .configure(tracking::tracking_routes)
            .configure(parent::parent_routes)
            .configure(driver::driver_routes)
            .configure(admin::admin_routes)
    );
}
