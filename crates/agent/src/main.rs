use elftail_agent::runtime::{boot, run};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    boot::init_logging();
    let (config, client) = boot::boot()?;
    run::run(config, client).await
}
