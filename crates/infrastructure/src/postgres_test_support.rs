use permbit_domain::PermissionBitfield;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub(crate) async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres permission tests: {error}");
    }

    Some(pool)
}

/// Category unique to one test run so parallel tests never share rows.
pub(crate) fn unique_category() -> String {
    format!("t{}", uuid::Uuid::new_v4().simple())
}

/// Random single bit far above anything a test run assigns sequentially.
pub(crate) fn unique_bitfield() -> PermissionBitfield {
    let offset = uuid::Uuid::new_v4().as_u128() % 4_000;
    PermissionBitfield::from_bit_position(512 + u64::try_from(offset).unwrap_or(0))
}
