use dotenv::dotenv;
use provider_kafka_service_common::config::ConfigFromEnv;
use provider_kafka_topic_operator::{run, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    dotenv().ok();

    let config = Config::from_env()?;

    run(config).await
}
