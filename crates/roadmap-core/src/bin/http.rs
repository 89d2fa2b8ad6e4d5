#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use roadmap_engine::{Workspace, http_api, logging};

    if let Err(e) = logging::init_logging() {
        eprintln!("logging disabled: {e}");
    }

    let addr: SocketAddr = std::env::var("ROADMAP_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    tracing::info!("roadmap HTTP API listening on http://{addr}");
    http_api::serve(addr, Workspace::new()).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
