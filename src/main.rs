use newsdesk::db::{self, Config};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[rocket::main]
async fn main() {
    if let Err(e) = fmt().with_env_filter(EnvFilter::from_default_env()).try_init() {
        eprintln!("tracing init failed: {}", e);
    }

    if let Err(e) = run().await {
        error!(error = %e, "newsdesk stopped");
        ::std::process::exit(1);
    }
}

async fn run() -> db::Result<()> {
    let config = Config::from_env()?;
    let pool = db::init_pool(&config)?;
    db::run_migrations(&mut *pool.get()?)?;
    info!(pool_size = config.pool_size, "database ready");

    newsdesk::serve(newsdesk::rocket(pool)).await
}
