use actix_web::{get, http::StatusCode, HttpResponse, Responder};
use askama::Template;

use super::render_template;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub latitude: String,
    pub longitude: String,
    pub error: Option<String>,
}

impl IndexTemplate {
    pub fn new(latitude: f64, longitude: f64, error: Option<String>) -> Self {
        IndexTemplate {
            latitude: format!("{:.6}", latitude),
            longitude: format!("{:.6}", longitude),
            error,
        }
    }
}

#[get("/")]
async fn default() -> HttpResponse {
    render_template(StatusCode::OK, IndexTemplate::new(0.0, 0.0, None))
}

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().body("ok")
}
