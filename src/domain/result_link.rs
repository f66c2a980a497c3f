use url::Url;

const GOOGLE_ORIGIN: &str = "https://www.google.com";

/// Turns the href of a search result anchor into the page it points at.
/// Google wraps results as `/url?q=<target>&sa=...`; plain absolute links
/// are taken as they are. Links back into google and anything that is not
/// http(s) are dropped.
pub fn extract_result_url(href: &str) -> Option<String> {
    let href = href.trim();
    let target = match href.strip_prefix("/url?") {
        Some(_) => Url::parse(GOOGLE_ORIGIN)
            .ok()?
            .join(href)
            .ok()?
            .query_pairs()
            .find(|(key, _)| key == "q" || key == "url")
            .map(|(_, value)| value.into_owned())?,
        None => href.to_string(),
    };

    let parsed_url = Url::parse(&target).ok()?;
    if !matches!(parsed_url.scheme(), "http" | "https") {
        return None;
    }

    match parsed_url.host_str() {
        Some("") | None => None,
        Some(any_host) if is_google_host(any_host) => None,
        Some(_) => Some(parsed_url.to_string()),
    }
}

fn is_google_host(host: &str) -> bool {
    let host = host.strip_prefix("www.").unwrap_or(host);
    host == "google.com"
        || host.starts_with("google.")
        || host.ends_with(".google.com")
        || host.contains(".google.")
        || host == "googleusercontent.com"
        || host.ends_with(".googleusercontent.com")
}
