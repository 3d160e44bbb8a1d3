use sqlx::sqlite::SqliteRow;
use sqlx::SqliteConnection;

use launchdesk_core::domain::channel::{
    ChannelConfig, ChannelConfigUpdate, CtsComponents, MarketChannelCts,
};
use launchdesk_core::domain::settings::GlobalSetting;
use launchdesk_core::scoring::ConfigSnapshot;
use tracing::warn;

use super::{column, ConfigRepository, RepositoryError};
use crate::DbPool;

const CHANNEL_COLUMNS: &str = "channel_name, base_units_per_month, channel_weight,
    retail_adoption_fraction, marketing_budget_multiplier";

const CTS_COLUMNS: &str = "market_name, channel_name, commission_pct, fulfillment_pct,
    payment_cod_pct, returns_allowance_pct, listing_fees_pct, trade_terms_pct, rebates_pct,
    promo_accrual_pct, total_cts_pct";

/// Settings, channel terms, and the cost-to-serve matrix.
pub struct SqlConfigRepository {
    pool: DbPool,
}

impl SqlConfigRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_setting(row: &SqliteRow) -> Result<GlobalSetting, RepositoryError> {
    Ok(GlobalSetting {
        setting_key: column(row, "setting_key")?,
        setting_value: column(row, "setting_value")?,
    })
}

fn row_to_channel(row: &SqliteRow) -> Result<ChannelConfig, RepositoryError> {
    Ok(ChannelConfig {
        channel_name: column(row, "channel_name")?,
        base_units_per_month: column(row, "base_units_per_month")?,
        channel_weight: column(row, "channel_weight")?,
        retail_adoption_fraction: column(row, "retail_adoption_fraction")?,
        marketing_budget_multiplier: column(row, "marketing_budget_multiplier")?,
    })
}

fn row_to_cts(row: &SqliteRow) -> Result<MarketChannelCts, RepositoryError> {
    Ok(MarketChannelCts {
        market_name: column(row, "market_name")?,
        channel_name: column(row, "channel_name")?,
        components: CtsComponents {
            commission_pct: column(row, "commission_pct")?,
            fulfillment_pct: column(row, "fulfillment_pct")?,
            payment_cod_pct: column(row, "payment_cod_pct")?,
            returns_allowance_pct: column(row, "returns_allowance_pct")?,
            listing_fees_pct: column(row, "listing_fees_pct")?,
            trade_terms_pct: column(row, "trade_terms_pct")?,
            rebates_pct: column(row, "rebates_pct")?,
            promo_accrual_pct: column(row, "promo_accrual_pct")?,
        },
        total_cts_pct: column(row, "total_cts_pct")?,
    })
}

pub async fn fetch_settings(
    conn: &mut SqliteConnection,
) -> Result<Vec<GlobalSetting>, RepositoryError> {
    let rows = sqlx::query(
        "SELECT setting_key, setting_value FROM global_settings ORDER BY setting_key",
    )
    .fetch_all(&mut *conn)
    .await?;
    rows.iter().map(row_to_setting).collect()
}

pub async fn fetch_channels(
    conn: &mut SqliteConnection,
) -> Result<Vec<ChannelConfig>, RepositoryError> {
    let rows = sqlx::query(&format!(
        "SELECT {CHANNEL_COLUMNS} FROM channel_configs ORDER BY rowid"
    ))
    .fetch_all(&mut *conn)
    .await?;
    rows.iter().map(row_to_channel).collect()
}

pub async fn fetch_cts(
    conn: &mut SqliteConnection,
) -> Result<Vec<MarketChannelCts>, RepositoryError> {
    let rows = sqlx::query(&format!("SELECT {CTS_COLUMNS} FROM market_channel_cts ORDER BY rowid"))
        .fetch_all(&mut *conn)
        .await?;
    rows.iter().map(row_to_cts).collect()
}

/// Reads the three configuration tables into one immutable snapshot. Callers
/// inside a transaction pass the transaction's connection so scoring sees
/// the same state the writes will commit against.
pub async fn load_snapshot_with(
    conn: &mut SqliteConnection,
) -> Result<ConfigSnapshot, RepositoryError> {
    let settings = fetch_settings(conn).await?;
    let channels = fetch_channels(conn).await?;
    let cts = fetch_cts(conn).await?;
    let snapshot = ConfigSnapshot::from_records(&settings, &channels, &cts);

    let layers = snapshot.settings().unnormalized_layers();
    if !layers.is_empty() {
        warn!(
            event_name = "scoring.weights.unnormalized",
            layers = ?layers,
            "layer weights do not sum to 1; scores drift from the 1-5 scale"
        );
    }
    Ok(snapshot)
}

/// Inserts the setting unless its key exists. Returns true when inserted.
pub async fn insert_setting_if_absent(
    conn: &mut SqliteConnection,
    setting: &GlobalSetting,
) -> Result<bool, RepositoryError> {
    let outcome = sqlx::query(
        "INSERT INTO global_settings (setting_key, setting_value) VALUES (?, ?)
         ON CONFLICT(setting_key) DO NOTHING",
    )
    .bind(&setting.setting_key)
    .bind(setting.setting_value)
    .execute(&mut *conn)
    .await?;
    Ok(outcome.rows_affected() > 0)
}

pub async fn insert_channel_if_absent(
    conn: &mut SqliteConnection,
    channel: &ChannelConfig,
) -> Result<bool, RepositoryError> {
    let outcome = sqlx::query(&format!(
        "INSERT INTO channel_configs ({CHANNEL_COLUMNS}) VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(channel_name) DO NOTHING"
    ))
    .bind(&channel.channel_name)
    .bind(channel.base_units_per_month)
    .bind(channel.channel_weight)
    .bind(channel.retail_adoption_fraction)
    .bind(channel.marketing_budget_multiplier)
    .execute(&mut *conn)
    .await?;
    Ok(outcome.rows_affected() > 0)
}

pub async fn insert_cts_if_absent(
    conn: &mut SqliteConnection,
    cts: &MarketChannelCts,
) -> Result<bool, RepositoryError> {
    let components = &cts.components;
    let outcome = sqlx::query(&format!(
        "INSERT INTO market_channel_cts ({CTS_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(market_name, channel_name) DO NOTHING"
    ))
    .bind(&cts.market_name)
    .bind(&cts.channel_name)
    .bind(components.commission_pct)
    .bind(components.fulfillment_pct)
    .bind(components.payment_cod_pct)
    .bind(components.returns_allowance_pct)
    .bind(components.listing_fees_pct)
    .bind(components.trade_terms_pct)
    .bind(components.rebates_pct)
    .bind(components.promo_accrual_pct)
    .bind(cts.total_cts_pct)
    .execute(&mut *conn)
    .await?;
    Ok(outcome.rows_affected() > 0)
}

#[async_trait::async_trait]
impl ConfigRepository for SqlConfigRepository {
    async fn list_settings(&self) -> Result<Vec<GlobalSetting>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch_settings(&mut conn).await
    }

    async fn upsert_settings(&self, settings: &[GlobalSetting]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;
        for setting in settings {
            sqlx::query(
                "INSERT INTO global_settings (setting_key, setting_value) VALUES (?, ?)
                 ON CONFLICT(setting_key) DO UPDATE SET setting_value = excluded.setting_value",
            )
            .bind(&setting.setting_key)
            .bind(setting.setting_value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list_channels(&self) -> Result<Vec<ChannelConfig>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch_channels(&mut conn).await
    }

    async fn update_channel(
        &self,
        channel_name: &str,
        update: ChannelConfigUpdate,
    ) -> Result<ChannelConfig, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {CHANNEL_COLUMNS} FROM channel_configs WHERE channel_name = ?"
        ))
        .bind(channel_name)
        .fetch_optional(&mut *tx)
        .await?;
        let mut channel = match row {
            Some(ref row) => row_to_channel(row)?,
            None => return Err(RepositoryError::NotFound(format!("channel `{channel_name}`"))),
        };

        update.apply(&mut channel);
        sqlx::query(
            "UPDATE channel_configs SET
                base_units_per_month = ?, channel_weight = ?,
                retail_adoption_fraction = ?, marketing_budget_multiplier = ?
             WHERE channel_name = ?",
        )
        .bind(channel.base_units_per_month)
        .bind(channel.channel_weight)
        .bind(channel.retail_adoption_fraction)
        .bind(channel.marketing_budget_multiplier)
        .bind(&channel.channel_name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(channel)
    }

    async fn list_cts(&self) -> Result<Vec<MarketChannelCts>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch_cts(&mut conn).await
    }

    async fn update_cts_total(
        &self,
        market_name: &str,
        channel_name: &str,
        total_cts_pct: f64,
    ) -> Result<MarketChannelCts, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let outcome = sqlx::query(
            "UPDATE market_channel_cts SET total_cts_pct = ?
             WHERE market_name = ? AND channel_name = ?",
        )
        .bind(total_cts_pct)
        .bind(market_name)
        .bind(channel_name)
        .execute(&mut *tx)
        .await?;
        if outcome.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!(
                "cost to serve for `{market_name}` / `{channel_name}`"
            )));
        }

        let row = sqlx::query(&format!(
            "SELECT {CTS_COLUMNS} FROM market_channel_cts WHERE market_name = ? AND channel_name = ?"
        ))
        .bind(market_name)
        .bind(channel_name)
        .fetch_one(&mut *tx)
        .await?;
        let cts = row_to_cts(&row)?;

        tx.commit().await?;
        Ok(cts)
    }

    async fn load_snapshot(&self) -> Result<ConfigSnapshot, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        load_snapshot_with(&mut conn).await
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use launchdesk_core::baseline::{default_channels, default_cts};
    use launchdesk_core::domain::channel::ChannelConfigUpdate;
    use launchdesk_core::domain::settings::GlobalSetting;

    use super::{insert_channel_if_absent, insert_cts_if_absent, SqlConfigRepository};
    use crate::repositories::{ConfigRepository, RepositoryError};
    use crate::{connect_with_settings, migrations};
    use tracing_subscriber::fmt::MakeWriter;

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        {
            let mut conn = pool.acquire().await.expect("acquire");
            for channel in default_channels() {
                insert_channel_if_absent(&mut conn, &channel).await.expect("channel");
            }
            for cts in default_cts() {
                insert_cts_if_absent(&mut conn, &cts).await.expect("cts");
            }
        }
        pool
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl CapturedLog {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().expect("log buffer")).into_owned()
        }
    }

    impl Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("log buffer").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLog {
        type Writer = CapturedLog;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn setting(key: &str, value: f64) -> GlobalSetting {
        GlobalSetting { setting_key: key.to_string(), setting_value: value }
    }

    #[tokio::test]
    async fn upsert_settings_inserts_and_overwrites() {
        let repo = SqlConfigRepository::new(setup().await);

        repo.upsert_settings(&[setting("gm_floor_pct", 0.35), setting("custom_flag", 1.0)])
            .await
            .expect("first upsert");
        repo.upsert_settings(&[setting("gm_floor_pct", 0.4)]).await.expect("second upsert");

        let settings = repo.list_settings().await.expect("list");
        assert_eq!(settings, vec![setting("custom_flag", 1.0), setting("gm_floor_pct", 0.4)]);
    }

    #[tokio::test]
    async fn update_channel_patches_supplied_fields() {
        let repo = SqlConfigRepository::new(setup().await);

        let updated = repo
            .update_channel(
                "MT",
                ChannelConfigUpdate { channel_weight: Some(0.5), ..ChannelConfigUpdate::default() },
            )
            .await
            .expect("update");
        assert_eq!(updated.channel_weight, 0.5);
        assert_eq!(updated.base_units_per_month, 350);

        let channels = repo.list_channels().await.expect("list");
        let modern_trade =
            channels.iter().find(|channel| channel.channel_name == "MT").expect("MT exists");
        assert_eq!(modern_trade.channel_weight, 0.5);

        let missing = repo.update_channel("Door-to-Door", ChannelConfigUpdate::default()).await;
        assert!(matches!(missing, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn update_cts_total_leaves_components() {
        let repo = SqlConfigRepository::new(setup().await);

        let cts = repo.update_cts_total("Nepal", "E-Com", 0.25).await.expect("update");
        assert_eq!(cts.total_cts_pct, 0.25);
        assert_eq!(cts.components.commission_pct, 0.12);

        let snapshot = repo.load_snapshot().await.expect("snapshot");
        assert_eq!(snapshot.cts_pct("Nepal", "E-Com"), 0.25);
        assert_eq!(snapshot.cts_pct("India", "E-Com"), 0.19);

        let missing = repo.update_cts_total("Atlantis", "E-Com", 0.1).await;
        assert!(matches!(missing, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn insert_if_absent_never_overwrites() {
        let pool = setup().await;
        let mut conn = pool.acquire().await.expect("acquire");

        let mut channel = default_channels().remove(0);
        channel.channel_weight = 0.99;
        assert!(!insert_channel_if_absent(&mut conn, &channel).await.expect("insert"));

        let weight: f64 = sqlx::query_scalar(
            "SELECT channel_weight FROM channel_configs WHERE channel_name = 'E-Com'",
        )
        .fetch_one(&mut *conn)
        .await
        .expect("weight");
        assert_eq!(weight, 0.35);
    }

    #[tokio::test]
    async fn snapshot_load_warns_about_unnormalized_weights() {
        let log = CapturedLog::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(log.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let repo = SqlConfigRepository::new(setup().await);
        let snapshot = repo.load_snapshot().await.expect("default snapshot");
        assert_eq!(snapshot.channel_count(), 4);
        assert!(!log.contents().contains("scoring.weights.unnormalized"));

        repo.upsert_settings(&[setting("consumer_trend_weight", 0.5)]).await.expect("upsert");
        repo.load_snapshot().await.expect("drifted snapshot");

        let output = log.contents();
        assert!(output.contains("scoring.weights.unnormalized"), "{output}");
        assert!(output.contains("layer_b"), "{output}");
        assert!(!output.contains("layer_c"), "{output}");
    }
}
