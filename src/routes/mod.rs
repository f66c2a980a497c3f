pub mod default_route;
pub mod finder_route;

use actix_web::{
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use askama::Template;

pub fn render_template<T: Template>(status: StatusCode, template: T) -> HttpResponse {
    match template.render() {
        Ok(body) => HttpResponse::build(status)
            .content_type(ContentType::html())
            .body(body),
        Err(e) => {
            log::error!("Failed to render template: {:?}", e);
            HttpResponse::InternalServerError().body("Failed to render page")
        }
    }
}
