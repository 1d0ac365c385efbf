#[tokio::main]
async fn main() {
    talentmatch_observability::init();

    let config = talentmatch_api::config::AppConfig::from_env();
    let bind_addr = config.bind_addr.clone();

    // The worker handle must stay alive for the life of the process; dropping
    // it would orphan the queue consumer.
    let (services, _worker) = talentmatch_api::app::services::build_services(config);
    let app = talentmatch_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {bind_addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
