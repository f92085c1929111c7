pub mod campaigns;
pub mod recipients;
pub mod send;
pub mod settings;

/// `GET /health`
pub async fn health() -> &'static str {
    "OK"
}
