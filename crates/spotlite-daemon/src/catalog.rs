use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use spotlite_core::catalog::{load_catalog_from_file, parse_catalog_json};
use spotlite_core::config::CatalogConfig;
use spotlite_core::Song;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::core::CoreEvent;

/// Fetch the catalog once.  `source` is an http(s) URL or a local JSON file.
pub async fn fetch_catalog(config: &CatalogConfig) -> anyhow::Result<Vec<Song>> {
    let source = config.url.trim();
    info!("Loading catalog from: {}", source);

    if source.starts_with("http://") || source.starts_with("https://") {
        fetch_catalog_url(source, Duration::from_secs(config.timeout_secs)).await
    } else {
        let path = PathBuf::from(source);
        load_catalog_from_file(&path)
            .with_context(|| format!("failed to read catalog file {}", path.display()))
    }
}

async fn fetch_catalog_url(url: &str, timeout: Duration) -> anyhow::Result<Vec<Song>> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("spotlite/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .context("failed to build reqwest client")?;
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    parse_catalog_json(&body).context("malformed catalog response")
}

/// One-shot fetch in the background; the result lands in the core loop.
/// There is no retry: a failure leaves the catalog empty.
pub fn spawn_fetch(
    config: CatalogConfig,
    core_tx: mpsc::Sender<CoreEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let event = match fetch_catalog(&config).await {
            Ok(songs) => {
                info!("Loaded {} songs", songs.len());
                CoreEvent::CatalogLoaded(songs)
            }
            Err(e) => {
                warn!("Catalog fetch failed: {:#}", e);
                CoreEvent::CatalogFailed(format!("{:#}", e))
            }
        };
        let _ = core_tx.send(event).await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use spotlite_core::SongId;

    const BODY: &str = r##"{"data": [
        {"id": 1, "name": "Colors", "artist": "William King", "accent": "#331E00",
         "cover": "abc", "url": "https://media.example/colors.mp3"},
        {"id": 2, "name": "Saudade", "artist": "Gonçalo", "accent": "#8F5B40",
         "cover": "def", "url": "https://media.example/saudade.mp3"}
    ]}"##;

    fn config(url: String) -> CatalogConfig {
        CatalogConfig {
            url,
            ..CatalogConfig::default()
        }
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn loads_from_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("songs.json");
        std::fs::write(&path, BODY).unwrap();

        let songs = fetch_catalog(&config(path.display().to_string()))
            .await
            .unwrap();
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[1].id, SongId(2));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let err = fetch_catalog(&config("/nonexistent/spotlite/songs.json".into()))
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("failed to read catalog file"));
    }

    #[tokio::test]
    async fn fetches_cms_envelope_over_http() {
        let base = serve(Router::new().route("/items/songs", get(|| async { BODY }))).await;
        let songs = fetch_catalog(&config(format!("{}/items/songs", base)))
            .await
            .unwrap();
        assert_eq!(songs[0].name, "Colors");
    }

    #[tokio::test]
    async fn http_error_status_reports_unavailable() {
        let base = serve(Router::new()).await;
        let (tx, mut rx) = mpsc::channel(1);
        spawn_fetch(config(format!("{}/items/songs", base)), tx)
            .await
            .unwrap();
        match rx.recv().await {
            Some(CoreEvent::CatalogFailed(reason)) => assert!(reason.contains("404")),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
