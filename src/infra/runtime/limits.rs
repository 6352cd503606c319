use crate::infra::config::HttpTimeouts;

/// Build a reqwest client with explicit connect and total timeouts, redirects disabled.
pub fn make_http_client_with(timeouts: HttpTimeouts) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(timeouts.connect)
        .timeout(timeouts.total)
        .redirect(reqwest::redirect::Policy::none())
        .build()
}

/// Client with the default timeouts.
pub fn make_http_client() -> Result<reqwest::Client, reqwest::Error> {
    make_http_client_with(HttpTimeouts::default())
}
