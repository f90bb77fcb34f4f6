use mock_service::{router, tps_measure_task, MockState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter("mock_service=debug,tower_http=info")
        .init();

    let state = Arc::new(MockState::default());
    tokio::spawn(tps_measure_task(state.clone()));

    let addr: SocketAddr = "0.0.0.0:8080".parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}
