use actix_web::{
    get,
    http::{
        header::{ContentDisposition, DispositionParam, DispositionType},
        StatusCode,
    },
    post, web, HttpResponse,
};
use askama::Template;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    domain::{
        coordinate::Coordinate,
        result_table::{TableRow, CSV_FILE_NAME},
    },
    services::{FinderError, PageReport, ReportStore, SearchStatus, TownhouseFinder},
};

use super::{default_route::IndexTemplate, render_template};

#[derive(Template)]
#[template(path = "results.html")]
struct ResultsTemplate {
    address: String,
    links: Vec<String>,
    search_message: &'static str,
    rows: Vec<TableRow>,
    pages: Vec<PageReport>,
    report_id: Uuid,
    csv_file_name: &'static str,
}

fn search_message(status: SearchStatus) -> &'static str {
    match status {
        SearchStatus::Found => "The search returned no usable links.",
        SearchStatus::NoResults => "The search found no results for this address.",
        SearchStatus::Blocked => "The search provider blocked the request, try again later.",
    }
}

#[derive(Deserialize)]
struct FindForm {
    latitude: f64,
    longitude: f64,
}

#[post("/find")]
async fn find_townhouses(
    finder: web::Data<TownhouseFinder>,
    report_store: web::Data<ReportStore>,
    form: web::Form<FindForm>,
) -> HttpResponse {
    let coordinate = match Coordinate::new(form.latitude, form.longitude) {
        Ok(coordinate) => coordinate,
        Err(e) => {
            return render_template(
                StatusCode::BAD_REQUEST,
                IndexTemplate::new(form.latitude, form.longitude, Some(e.to_string())),
            )
        }
    };

    match finder.find(coordinate).await {
        Ok(report) => {
            let table = report.table();
            let rows = table.rows.clone();
            let report_id = report_store.insert(table);

            render_template(
                StatusCode::OK,
                ResultsTemplate {
                    search_message: search_message(report.search),
                    address: report.address,
                    links: report.links,
                    rows,
                    pages: report.pages,
                    report_id,
                    csv_file_name: CSV_FILE_NAME,
                },
            )
        }
        Err(e @ FinderError::AddressNotFound(_)) => render_template(
            StatusCode::NOT_FOUND,
            IndexTemplate::new(form.latitude, form.longitude, Some(e.to_string())),
        ),
    }
}

#[get("/find/{report_id}/csv")]
async fn download_csv(
    report_store: web::Data<ReportStore>,
    report_id: web::Path<Uuid>,
) -> HttpResponse {
    let Some(table) = report_store.get(&report_id) else {
        return HttpResponse::NotFound().body("Results expired, run the search again.");
    };

    match table.to_csv() {
        Ok(csv) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(CSV_FILE_NAME.to_string())],
            })
            .body(csv),
        Err(e) => {
            log::error!("Failed to write csv for report {}: {:?}", report_id, e);
            HttpResponse::InternalServerError().body("Failed to build csv")
        }
    }
}

#[derive(Deserialize)]
struct FindQuery {
    lat: f64,
    lon: f64,
}

#[get("/api/townhouses")]
async fn find_townhouses_json(
    finder: web::Data<TownhouseFinder>,
    query: web::Query<FindQuery>,
) -> HttpResponse {
    let coordinate = match Coordinate::new(query.lat, query.lon) {
        Ok(coordinate) => coordinate,
        Err(e) => return HttpResponse::BadRequest().json(json!({ "error": e.to_string() })),
    };

    match finder.find(coordinate).await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => HttpResponse::NotFound().json(json!({ "error": e.to_string() })),
    }
}
