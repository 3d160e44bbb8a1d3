use chrono::Utc;
use sqlx::SqliteConnection;

use launchdesk_core::domain::market::Market;

use super::{column, MarketRepository, RepositoryError};
use crate::DbPool;

pub struct SqlMarketRepository {
    pool: DbPool,
}

impl SqlMarketRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub async fn insert_market_if_absent(
    conn: &mut SqliteConnection,
    market: &Market,
) -> Result<bool, RepositoryError> {
    let outcome = sqlx::query(
        "INSERT INTO markets (market_name, created_at) VALUES (?, ?)
         ON CONFLICT(market_name) DO NOTHING",
    )
    .bind(&market.market_name)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *conn)
    .await?;
    Ok(outcome.rows_affected() > 0)
}

pub async fn count_markets(conn: &mut SqliteConnection) -> Result<i64, RepositoryError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM markets")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

#[async_trait::async_trait]
impl MarketRepository for SqlMarketRepository {
    async fn list(&self) -> Result<Vec<Market>, RepositoryError> {
        let rows = sqlx::query("SELECT market_name FROM markets ORDER BY created_at, market_name")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| Ok(Market { market_name: column(row, "market_name")? }))
            .collect()
    }

    async fn create(&self, market: &Market) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        insert_market_if_absent(&mut conn, market).await
    }
}

#[cfg(test)]
mod tests {
    use launchdesk_core::domain::market::Market;

    use super::SqlMarketRepository;
    use crate::repositories::MarketRepository;
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn create_is_idempotent_per_name() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let repo = SqlMarketRepository::new(pool);

        let nepal = Market { market_name: "Nepal".to_string() };
        assert!(repo.create(&nepal).await.expect("create"));
        assert!(!repo.create(&nepal).await.expect("create again"));
        assert!(repo.create(&Market { market_name: "UAE".to_string() }).await.expect("create"));

        let names = repo
            .list()
            .await
            .expect("list")
            .into_iter()
            .map(|market| market.market_name)
            .collect::<Vec<_>>();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"Nepal".to_string()));
        assert!(names.contains(&"UAE".to_string()));
    }
}
