use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let api_key = std::env::var("REDMINE_API_KEY").unwrap_or_else(|_| "test-key".to_string());
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;
    mock_server::run(listener, &api_key).await
}
