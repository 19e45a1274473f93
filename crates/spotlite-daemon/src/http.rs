use crate::core::CoreEvent;
use crate::state::StateManager;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use spotlite_core::{Category, Command, PlayerError, PlayerSnapshot, SongId};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct HttpState {
    pub state_manager: Arc<StateManager>,
    pub event_tx: mpsc::Sender<CoreEvent>,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    query: String,
}

#[derive(Debug, Serialize)]
struct ApiError {
    error: String,
}

enum ApiFailure {
    Player(PlayerError),
    CoreGone,
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiFailure::Player(e) => {
                let status = match e {
                    PlayerError::InvalidSelection(_) => StatusCode::NOT_FOUND,
                    PlayerError::CatalogEmpty => StatusCode::CONFLICT,
                    PlayerError::UnknownCategory(_) => StatusCode::BAD_REQUEST,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string())
            }
            ApiFailure::CoreGone => (
                StatusCode::SERVICE_UNAVAILABLE,
                "player core is not running".to_string(),
            ),
        };
        (status, Json(ApiError { error: message })).into_response()
    }
}

type ApiResult = Result<Json<PlayerSnapshot>, ApiFailure>;

pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/api/state", get(get_state))
        .route("/api/select/:id", post(select_song))
        .route("/api/toggle", post(toggle))
        .route("/api/next", post(next_song))
        .route("/api/prev", post(prev_song))
        .route("/api/seek/:percent", post(seek))
        .route("/api/search", post(search))
        .route("/api/category/:name", post(set_category))
        .route("/api/logs", get(get_logs))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub fn start_server(
    bind_address: String,
    port: u16,
    state_manager: Arc<StateManager>,
    event_tx: mpsc::Sender<CoreEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let app = router(HttpState {
            state_manager,
            event_tx,
        });

        let addr = format!("{}:{}", bind_address, port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to bind HTTP server to {}: {}", addr, e);
                return;
            }
        };

        info!("HTTP API server listening on http://{}", addr);

        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {}", e);
        }
    })
}

/// Forward `command` to the core, wait until it has been applied, and
/// answer with the snapshot it published.
async fn dispatch(state: &HttpState, command: Command) -> ApiResult {
    let (reply_tx, reply_rx) = oneshot::channel();
    let event = CoreEvent::Client {
        command,
        reply: Some(reply_tx),
    };
    if state.event_tx.send(event).await.is_err() {
        error!("Failed to send command to core");
        return Err(ApiFailure::CoreGone);
    }
    reply_rx
        .await
        .map_err(|_| ApiFailure::CoreGone)?
        .map_err(ApiFailure::Player)?;
    Ok(Json(state.state_manager.get_state().await))
}

async fn get_state(State(state): State<HttpState>) -> Json<PlayerSnapshot> {
    Json(state.state_manager.get_state().await)
}

async fn select_song(State(state): State<HttpState>, Path(id): Path<u64>) -> ApiResult {
    info!("HTTP API: select song {}", id);
    dispatch(&state, Command::SelectSong { id: SongId(id) }).await
}

async fn toggle(State(state): State<HttpState>) -> ApiResult {
    info!("HTTP API: toggle play/pause");
    dispatch(&state, Command::TogglePause).await
}

async fn next_song(State(state): State<HttpState>) -> ApiResult {
    info!("HTTP API: next");
    dispatch(&state, Command::Next).await
}

async fn prev_song(State(state): State<HttpState>) -> ApiResult {
    info!("HTTP API: previous");
    dispatch(&state, Command::Prev).await
}

async fn seek(State(state): State<HttpState>, Path(percent): Path<f64>) -> ApiResult {
    info!("HTTP API: seek to {}%", percent);
    dispatch(&state, Command::Seek { percent }).await
}

async fn search(State(state): State<HttpState>, Json(body): Json<SearchBody>) -> ApiResult {
    dispatch(&state, Command::SetQuery { query: body.query }).await
}

async fn set_category(State(state): State<HttpState>, Path(name): Path<String>) -> ApiResult {
    let category: Category = name.parse().map_err(ApiFailure::Player)?;
    info!("HTTP API: category {}", category);
    dispatch(&state, Command::SetCategory { category }).await
}

async fn get_logs(State(state): State<HttpState>) -> Json<Vec<String>> {
    Json(state.state_manager.recent_logs().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tests::{songs, NullEngine};
    use crate::core::PlayerCore;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use spotlite_core::PlayerStatus;
    use tower::ServiceExt;

    /// Router wired to a live core running on a NullEngine.
    async fn app(with_catalog: bool) -> Router {
        let sm = Arc::new(StateManager::new());
        let (tx, rx) = mpsc::channel(16);
        let core = PlayerCore::new(NullEngine::default(), sm.clone(), "https://a/".into());
        tokio::spawn(core.run(rx));
        if with_catalog {
            tx.send(CoreEvent::CatalogLoaded(songs())).await.unwrap();
        }
        router(HttpState {
            state_manager: sm,
            event_tx: tx,
        })
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Body) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn select_returns_playing_snapshot() {
        let app = app(true).await;
        let (status, body) = call(&app, "POST", "/api/select/3", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "playing");
        assert_eq!(body["current_index"], 2);
        assert_eq!(body["current"]["id"], 3);
    }

    #[tokio::test]
    async fn unknown_song_is_not_found() {
        let app = app(true).await;
        let (status, body) = call(&app, "POST", "/api/select/99", Body::empty()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("99"));
    }

    #[tokio::test]
    async fn transport_before_catalog_conflicts() {
        let app = app(false).await;
        let (status, _) = call(&app, "POST", "/api/next", Body::empty()).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = call(&app, "GET", "/api/state", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "idle");
    }

    #[tokio::test]
    async fn search_and_category_shape_displayed_list() {
        let app = app(true).await;
        let (status, body) = call(
            &app,
            "POST",
            "/api/search",
            Body::from(r#"{"query": "TRACK 2"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["displayed"].as_array().unwrap().len(), 1);
        assert_eq!(body["displayed"][0]["name"], "Track 2");

        let (status, body) = call(&app, "POST", "/api/category/top-songs", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["category"], "top-songs");
        assert_eq!(body["displayed"].as_array().unwrap().len(), 1);

        let (status, _) = call(&app, "POST", "/api/category/recent", Body::empty()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn toggle_and_navigation_round_trip() {
        let app = app(true).await;
        let (_, body) = call(&app, "POST", "/api/toggle", Body::empty()).await;
        assert_eq!(body["is_playing"], true);

        let (_, body) = call(&app, "POST", "/api/prev", Body::empty()).await;
        assert_eq!(body["current_index"], 2);
        let (_, body) = call(&app, "POST", "/api/next", Body::empty()).await;
        assert_eq!(body["current_index"], 0);

        let (status, body) = call(&app, "POST", "/api/seek/50", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["progress_percent"], 0.0);

        let snapshot: PlayerSnapshot = serde_json::from_value(body).unwrap();
        assert_eq!(snapshot.status, PlayerStatus::Playing);
    }

    #[tokio::test]
    async fn logs_endpoint_lists_recent_lines() {
        let sm = Arc::new(StateManager::new());
        sm.push_log("12:00:00 [WARN] Catalog fetch failed".into()).await;
        let (tx, _rx) = mpsc::channel(1);
        let app = router(HttpState {
            state_manager: sm,
            event_tx: tx,
        });
        let (status, body) = call(&app, "GET", "/api/logs", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0], "12:00:00 [WARN] Catalog fetch failed");
    }
}
