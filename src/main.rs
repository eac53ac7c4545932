use chp_lighting_lib::config::AppSettings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = AppSettings::from_env()?;
    chp_lighting_lib::init_logging(&settings.log_level);

    chp_lighting_lib::run(settings).await
}
