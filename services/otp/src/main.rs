use anyhow::Context as _;
use sea_orm::Database;
use tracing::info;

use otpgate_core::config::Config;
use otpgate_core::tracing::init_tracing;

use otpgate_otp::config::OtpConfig;
use otpgate_otp::infra::mail::HttpMailNotifier;
use otpgate_otp::router::build_router;
use otpgate_otp::state::AppState;
use otpgate_otp::usecase::code::CodeHasher;
use otpgate_otp::usecase::sweep::run_reaper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = OtpConfig::from_env().context("load otp config from environment")?;
    config.validate().context("invalid otp config")?;

    let db = Database::connect(&config.database_url)
        .await
        .context("connect to database")?;

    let notifier = HttpMailNotifier::new(
        config.mail_relay_url.clone(),
        config.mail_relay_timeout(),
        config.ttl(),
    )?;

    let state = AppState {
        db,
        notifier,
        hasher: CodeHasher::new(config.otp_bcrypt_cost),
        ttl: config.ttl(),
    };

    let sweep_interval = config.sweep_interval();
    info!(every_secs = sweep_interval.as_secs(), "starting otp reaper");
    tokio::spawn(run_reaper(state.sweep_usecase(), sweep_interval));

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.otp_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    info!("otp service listening on {addr}");
    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
