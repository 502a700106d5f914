#[tokio::main]
async fn main() -> std::io::Result<()> {
    impostor_server::run_with_config().await
}
