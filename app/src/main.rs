use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    refhat_lib::init_logging();
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    refhat_lib::run(config_path.as_deref()).await
}
