use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::info;

use launchdesk_core::baseline::{default_channels, default_cts, default_settings, starter_markets};

use crate::repositories::config::{
    insert_channel_if_absent, insert_cts_if_absent, insert_setting_if_absent,
};
use crate::repositories::market::{count_markets, insert_market_if_absent};
use crate::repositories::RepositoryError;
use crate::DbPool;

/// Rows inserted per table by one seeding pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub settings: usize,
    pub channels: usize,
    pub cts_rows: usize,
    pub markets: usize,
}

impl SeedReport {
    pub fn total(&self) -> usize {
        self.settings + self.channels + self.cts_rows + self.markets
    }
}

/// Installs the reference configuration without touching rows that exist.
pub struct DefaultConfigSeeder;

impl DefaultConfigSeeder {
    pub async fn seed(pool: &DbPool) -> Result<SeedReport, RepositoryError> {
        let mut tx = pool.begin().await?;
        let report = Self::seed_with(&mut tx).await?;
        tx.commit().await?;

        info!(
            event_name = "seed.completed",
            settings = report.settings,
            channels = report.channels,
            cts_rows = report.cts_rows,
            markets = report.markets,
            "default configuration ensured"
        );
        Ok(report)
    }

    /// Seeds on a caller-owned connection so ingestion can fold it into its
    /// own transaction.
    pub async fn seed_with(conn: &mut SqliteConnection) -> Result<SeedReport, RepositoryError> {
        let mut report = SeedReport::default();

        for setting in default_settings() {
            if insert_setting_if_absent(conn, &setting).await? {
                report.settings += 1;
            }
        }
        for channel in default_channels() {
            if insert_channel_if_absent(conn, &channel).await? {
                report.channels += 1;
            }
        }
        for cts in default_cts() {
            if insert_cts_if_absent(conn, &cts).await? {
                report.cts_rows += 1;
            }
        }

        if count_markets(conn).await? == 0 {
            for market in starter_markets() {
                if insert_market_if_absent(conn, &market).await? {
                    report.markets += 1;
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use launchdesk_core::domain::market::Market;
    use launchdesk_core::domain::settings::GlobalSetting;

    use super::{DefaultConfigSeeder, SeedReport};
    use crate::repositories::{
        ConfigRepository, MarketRepository, SqlConfigRepository, SqlMarketRepository,
    };
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn first_pass_fills_every_table() {
        let pool = setup().await;

        let report = DefaultConfigSeeder::seed(&pool).await.expect("seed");
        assert_eq!(report, SeedReport { settings: 24, channels: 4, cts_rows: 12, markets: 3 });

        let markets = SqlMarketRepository::new(pool).list().await.expect("markets");
        assert_eq!(markets.len(), 3);
    }

    #[tokio::test]
    async fn second_pass_is_a_no_op() {
        let pool = setup().await;
        DefaultConfigSeeder::seed(&pool).await.expect("seed");

        let report = DefaultConfigSeeder::seed(&pool).await.expect("seed again");
        assert_eq!(report.total(), 0);
    }

    #[tokio::test]
    async fn operator_edits_survive_reseeding() {
        let pool = setup().await;
        let config = SqlConfigRepository::new(pool.clone());
        config
            .upsert_settings(&[GlobalSetting {
                setting_key: "gm_floor_pct".to_string(),
                setting_value: 0.5,
            }])
            .await
            .expect("edit");

        let report = DefaultConfigSeeder::seed(&pool).await.expect("seed");
        assert_eq!(report.settings, 23);

        let snapshot = config.load_snapshot().await.expect("snapshot");
        assert_eq!(snapshot.settings().gm_floor_pct, 0.5);
    }

    #[tokio::test]
    async fn starter_markets_only_fill_an_empty_table() {
        let pool = setup().await;
        let markets = SqlMarketRepository::new(pool.clone());
        markets.create(&Market { market_name: "UAE".to_string() }).await.expect("create");

        let report = DefaultConfigSeeder::seed(&pool).await.expect("seed");
        assert_eq!(report.markets, 0);
        assert_eq!(markets.list().await.expect("list").len(), 1);
    }
}
