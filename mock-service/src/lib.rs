use axum::{
    debug_handler,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Request accounting shared by every handler.
#[derive(Debug, Default)]
pub struct MockState {
    requests: AtomicU64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockState {
    fn enter(self: &Arc<Self>) -> InFlight {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(self.clone())
    }
}

/// Decrements the in-flight gauge even when the client gives up mid-request.
struct InFlight(Arc<MockState>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A running mock bound to an ephemeral port.
pub struct MockService {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn requests(&self) -> u64 {
        self.state.requests.load(Ordering::Relaxed)
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Start the mock on `127.0.0.1:0` in the background.
pub async fn spawn() -> anyhow::Result<MockService> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = Arc::new(MockState::default());

    let app = router(state.clone());
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            tracing::error!("Mock service stopped: {err}");
        }
    });

    Ok(MockService { addr, state })
}

/// An address nothing is listening on, for provoking refused connections.
pub fn unused_addr() -> anyhow::Result<SocketAddr> {
    let listener = StdTcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?)
}

pub fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/animals", get(animals))
        .route("/go-animals", get(animals))
        .route("/status/:code", get(status))
        .route("/malformed", get(malformed))
        .route("/wrong-shape", get(wrong_shape))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[derive(Debug, Deserialize)]
pub struct AnimalsQuery {
    #[serde(default)]
    limit: usize,
    #[serde(default)]
    delay_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct Animal {
    id: usize,
    name: String,
}

#[derive(Debug, Serialize)]
pub struct AnimalsBody {
    animals: Vec<Animal>,
}

#[debug_handler]
async fn animals(
    State(state): State<Arc<MockState>>,
    Query(query): Query<AnimalsQuery>,
) -> Json<AnimalsBody> {
    let _guard = state.enter();
    tokio::time::sleep(Duration::from_millis(query.delay_ms)).await;

    debug!("Serving {} animals.", query.limit);
    Json(AnimalsBody {
        animals: (0..query.limit)
            .map(|id| Animal {
                id,
                name: format!("animal-{id}"),
            })
            .collect(),
    })
}

#[derive(Debug, Deserialize)]
pub struct DelayQuery {
    #[serde(default)]
    delay_ms: u64,
}

#[debug_handler]
async fn status(
    State(state): State<Arc<MockState>>,
    Path(code): Path<u16>,
    Query(query): Query<DelayQuery>,
) -> StatusCode {
    let _guard = state.enter();
    tokio::time::sleep(Duration::from_millis(query.delay_ms)).await;
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

#[debug_handler]
async fn malformed(State(state): State<Arc<MockState>>) -> impl IntoResponse {
    let _guard = state.enter();
    (StatusCode::OK, "{\"animals\": [1, 2,")
}

#[debug_handler]
async fn wrong_shape(State(state): State<Arc<MockState>>) -> Json<serde_json::Value> {
    let _guard = state.enter();
    Json(serde_json::json!({ "animals": 5 }))
}

/** TPS Printer **/

pub async fn tps_measure_task(state: Arc<MockState>) {
    let mut last = 0;
    loop {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let total = state.requests.load(Ordering::Relaxed);
        println!("{} TPS", total - last);
        last = total;
    }
}
