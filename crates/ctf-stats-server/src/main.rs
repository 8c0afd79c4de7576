use ctf_stats_server::{settings::ConfigSettings, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::build().expect("failed to read config");
    ctf_stats_server::run(settings).await
}
