//! Map links for addresses shown to volunteers.

use reqwest::Url;

const GOOGLE_MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/";

/// Build a Google Maps search link for a street address.
pub fn google_maps_url(address: &str) -> String {
    match Url::parse_with_params(
        GOOGLE_MAPS_SEARCH_URL,
        &[("api", "1"), ("query", address.trim())],
    ) {
        Ok(url) => url.to_string(),
        // Unreachable for the constant base URL.
        Err(_) => GOOGLE_MAPS_SEARCH_URL.to_string(),
    }
}
