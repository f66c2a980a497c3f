use std::{net::TcpListener, sync::Arc};

use actix_files::Files;
use actix_web::{
    dev::Server,
    middleware::Logger,
    web::{self, Data},
    App, HttpServer,
};

use crate::{
    configuration::Settings,
    routes::{default_route, finder_route},
    services::{
        GoogleScraper, HttpPageScraper, NominatimClient, OpenaiClient, ReportStore,
        TownhouseFinder,
    },
};

pub fn build_finder(configuration: &Settings) -> Result<TownhouseFinder, reqwest::Error> {
    let geocoder = NominatimClient::new(&configuration.geocoder)?;
    let link_finder = GoogleScraper::new(&configuration.search);
    let page_scraper = HttpPageScraper::new(&configuration.scraper)?;
    let field_extractor =
        OpenaiClient::new(configuration.api_keys.gemini.clone(), &configuration.model);

    Ok(TownhouseFinder::new(
        Arc::new(geocoder),
        Arc::new(link_finder),
        Arc::new(page_scraper),
        Arc::new(field_extractor),
        configuration.search.num_results,
    ))
}

pub fn run(
    listener: TcpListener,
    finder: TownhouseFinder,
    report_store: Data<ReportStore>,
) -> Result<Server, std::io::Error> {
    let finder = web::Data::new(finder);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(Files::new("/static", "./templates/static").prefer_utf8(true))
            .service(default_route::default)
            .service(default_route::health)
            .service(finder_route::find_townhouses)
            .service(finder_route::download_csv)
            .service(finder_route::find_townhouses_json)
            .app_data(finder.clone())
            .app_data(report_store.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
