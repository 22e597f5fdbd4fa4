//! Web app manifest route handler.
//!
//! Makes the card installable to a phone home screen; the install prompt
//! itself lives in `static/a2hs.js`.

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

/// Serve the web app manifest.
pub async fn webmanifest() -> Response {
    let manifest = serde_json::json!({
        "name": "Driftwood Coffee Loyalty Card",
        "short_name": "Driftwood",
        "start_url": "/card",
        "icons": [
            {
                "src": "/static/icons/icon-192.png",
                "sizes": "192x192",
                "type": "image/png"
            },
            {
                "src": "/static/icons/icon-512.png",
                "sizes": "512x512",
                "type": "image/png"
            }
        ],
        "theme_color": "#4a2c2a",
        "background_color": "#f7f0e8",
        "display": "standalone"
    });

    (
        [(header::CONTENT_TYPE, "application/manifest+json")],
        manifest.to_string(),
    )
        .into_response()
}
