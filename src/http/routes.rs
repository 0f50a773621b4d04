//! HTTP route definitions

use std::sync::atomic::Ordering;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::app::AppState;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(&state.config.client_origin))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS origins from a comma-separated list; "*" allows any origin
fn allowed_origins(client_origin: &str) -> AllowOrigin {
    if client_origin.trim() == "*" {
        return AllowOrigin::any();
    }

    let origins: Vec<HeaderValue> = client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    AllowOrigin::list(origins)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_players: usize,
    connected_sessions: usize,
    tick: u64,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_players: state.arena.player_count(),
        connected_sessions: state.sessions.load(Ordering::Relaxed),
        tick: state.arena.tick(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, GameConfig};
    use crate::game::{GameArena, PlayerId};

    fn test_config() -> Config {
        Config {
            server_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "info".to_string(),
            client_origin: "*".to_string(),
            input_rate_limit: 30,
            game: GameConfig {
                seed: Some(3),
                spawn_half_extent: 1000,
                ..GameConfig::default()
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_health_reports_arena_counters() {
        let config = test_config();
        let (arena, handle) = GameArena::new(config.game.clone());
        let task = tokio::spawn(arena.run());
        let state = AppState::new(config, handle.clone());

        handle
            .join(PlayerId::new("conn-1"), "Ram".to_string())
            .await
            .unwrap();

        let Json(health) = health_handler(State(state)).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.active_players, 2);
        assert_eq!(health.connected_sessions, 0);

        handle.shutdown();
        task.await.unwrap();
    }

    #[test]
    fn test_router_builds_with_origin_list() {
        let mut config = test_config();
        config.client_origin = "https://a.example, https://b.example".to_string();
        let (_arena, handle) = GameArena::new(config.game.clone());
        let _router = build_router(AppState::new(config, handle));
    }
}
