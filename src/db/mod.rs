use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness};
use dotenv::dotenv;
use rocket::tokio::task;
use std::env;
use std::time::Duration;
use tracing::{info, warn};

use crate::types::ApiError;

pub mod failure;
pub mod schema;

pub const MIGRATIONS: EmbeddedMigrations = diesel_migrations::embed_migrations!("migrations");

// An alias to the type for a pool of Diesel Postgres connections.
pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

pub type DbConnection = PooledConnection<ConnectionManager<PgConnection>>;

error_chain! {
    foreign_links {
        Var(::std::env::VarError);
        ParseInt(::std::num::ParseIntError);
        R2D2(r2d2::Error);
    }

    errors {
        Migration(reason: String) {
            description("migration failed")
            display("migration failed: {}", reason)
        }

        Launch(reason: String) {
            description("server failed to launch")
            display("server failed to launch: {}", reason)
        }
    }
}

/// Pool settings read from the environment (and `.env`, when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub pool_size: u32,
    pub connection_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Config> {
        dotenv().ok();
        let database_url = env::var("DATABASE_URL")?;
        let pool_size = match env::var("DATABASE_POOL_SIZE") {
            Ok(size) => size.parse::<u32>()?,
            Err(_) => 10,
        };
        let timeout = match env::var("DATABASE_TIMEOUT_SECS") {
            Ok(secs) => secs.parse::<u64>()?,
            Err(_) => 5,
        };
        Ok(Config {
            database_url,
            pool_size,
            connection_timeout: Duration::from_secs(timeout),
        })
    }
}

pub fn init_pool(config: &Config) -> Result<Pool> {
    let manager = ConnectionManager::<PgConnection>::new(config.database_url.as_str());
    let pool = Pool::builder()
        .max_size(config.pool_size)
        .connection_timeout(config.connection_timeout)
        .build(manager)?;
    Ok(pool)
}

/// Builds a pool without opening any connection up front. Checkouts fail
/// only once a handler actually asks for one.
pub fn lazy_pool(config: &Config) -> Pool {
    let manager = ConnectionManager::<PgConnection>::new(config.database_url.as_str());
    Pool::builder()
        .max_size(config.pool_size)
        .connection_timeout(config.connection_timeout)
        .build_unchecked(manager)
}

/// Single-connection pool whose connection lives inside a test transaction
/// that is never committed.
#[cfg(feature = "test-support")]
pub fn test_pool(database_url: &str) -> Result<Pool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(1)
        .connection_customizer(Box::new(TestTransaction))
        .build(manager)?;
    run_migrations(&mut *pool.get()?)?;
    Ok(pool)
}

#[cfg(feature = "test-support")]
#[derive(Debug)]
struct TestTransaction;

#[cfg(feature = "test-support")]
impl diesel::r2d2::CustomizeConnection<PgConnection, diesel::r2d2::Error> for TestTransaction {
    fn on_acquire(&self, conn: &mut PgConnection) -> ::std::result::Result<(), diesel::r2d2::Error> {
        use diesel::Connection;

        conn.begin_test_transaction()
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn run_migrations(conn: &mut PgConnection) -> Result<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::from(ErrorKind::Migration(e.to_string())))?;
    for version in applied {
        info!(%version, "applied migration");
    }
    Ok(())
}

/// Checks a connection out of the managed pool.
pub fn connection(pool: &Pool) -> ::std::result::Result<DbConnection, ApiError> {
    pool.get().map_err(|e| {
        warn!(error = %e, "connection checkout failed");
        ApiError::Unavailable
    })
}

/// Runs `work` on the blocking thread pool with a freshly checked-out
/// connection, leaving the async workers free while the checkout or the
/// query waits. Handlers call this only after their input has been validated.
pub async fn with_connection<T, F>(pool: &Pool, work: F) -> ::std::result::Result<T, ApiError>
where
    F: FnOnce(&mut PgConnection) -> ::std::result::Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    task::spawn_blocking(move || {
        let mut conn = connection(&pool)?;
        work(&mut *conn)
    })
    .await
    .map_err(|e| ApiError::Unhandled(e.to_string()))?
}
