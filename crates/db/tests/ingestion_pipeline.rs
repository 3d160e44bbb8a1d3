use launchdesk_core::domain::candidate::SkuId;
use launchdesk_core::domain::result::Recommendation;
use launchdesk_core::ingest::{ColumnMapping, IngestError, IngestOptions};
use launchdesk_db::{
    connect_with_settings, migrations, CandidateRepository, DbPool, IngestionFailure,
    IngestionPipeline, RepositoryError, SqlCandidateRepository, DEFAULT_PAGE_LIMIT,
};
use rust_xlsxwriter::{Workbook, Worksheet};

const HEADERS: [&str; 12] = [
    "SKU ID",
    "SKU Name",
    "Category",
    "Target Market",
    "Primary Channel",
    "Regulatory Eligible",
    "IP Risk High",
    "Supply Ready",
    "Local List Price (calc)",
    "Landed Cost (calc)",
    "Consumer Trend",
    "Price War",
];

async fn pool() -> DbPool {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrations");
    pool
}

fn write_row(sheet: &mut Worksheet, row: u32, values: &[&str]) {
    for (column, value) in values.iter().enumerate() {
        if value.is_empty() {
            continue;
        }
        let column = column as u16;
        match value.parse::<f64>() {
            Ok(number) => sheet.write_number(row, column, number).expect("number cell"),
            Err(_) => sheet.write_string(row, column, *value).expect("text cell"),
        };
    }
}

fn shortlist(rows: &[[&str; 12]]) -> Vec<u8> {
    let mut xlsx = Workbook::new();
    let sheet = xlsx.add_worksheet();
    sheet.set_name("SKUs Shortlist").expect("name sheet");
    sheet.write_string(0, 0, "FY26 launch shortlist").expect("title");
    write_row(sheet, 2, &HEADERS);
    for (offset, row) in rows.iter().enumerate() {
        write_row(sheet, 3 + offset as u32, row);
    }

    let cts = xlsx.add_worksheet();
    cts.set_name("CTS_Components").expect("name sheet");
    write_row(cts, 0, &["Market", "Channel", "Total"]);
    write_row(cts, 1, &["Nepal", "E-Com", "0.19"]);
    write_row(cts, 2, &["Nepal", "MT", "0.17"]);

    xlsx.save_to_buffer().expect("save workbook")
}

fn reference_rows() -> Vec<[&'static str; 12]> {
    vec![
        [
            "SKU-100", "Vitamin C Serum", "Skincare", "Nepal", "E-Com", "Yes", "No", "Yes", "10",
            "5", "5", "1",
        ],
        ["", "Nameless Row", "Skincare", "Nepal", "E-Com", "", "", "", "", "", "", ""],
        [
            "SKU-200", "Retinol Night Oil", "Skincare", "Nepal", "E-Com", "yes", "YES", "yes",
            "40", "8", "5", "1",
        ],
        ["SKU-300", "Travel Kit", "Accessories", "", "", "", "", "", "", "", "", ""],
    ]
}

#[tokio::test]
async fn ingest_scores_every_inserted_candidate() {
    let pool = pool().await;
    let pipeline = IngestionPipeline::new(pool.clone());

    let summary = pipeline
        .ingest(&shortlist(&reference_rows()), &IngestOptions::default())
        .await
        .expect("ingest");
    assert_eq!(summary.candidate_row_count, 3);
    assert_eq!(summary.skipped_row_count, 1);
    assert_eq!(summary.cts_row_count, 2);
    assert_eq!(summary.settings_row_count, 0);
    assert_eq!(summary.channel_row_count, 0);

    let repository = SqlCandidateRepository::new(pool);
    let serum = repository
        .find_by_id(&SkuId("SKU-100".to_string()))
        .await
        .expect("lookup")
        .expect("SKU-100 stored");
    let cache = serum.cache.expect("result cached");
    assert!((cache.gm_dollar_per_unit.expect("gm") - 3.1).abs() < 1e-9);
    assert!((cache.gm_pct.expect("gm pct") - 0.31).abs() < 1e-9);
    assert_eq!(cache.pass_gm_floor, Some(false));
    assert_eq!(cache.final_recommendation, Some(Recommendation::PhaseLater));

    let vetoed = repository
        .find_by_id(&SkuId("SKU-200".to_string()))
        .await
        .expect("lookup")
        .and_then(|scored| scored.cache)
        .expect("SKU-200 result");
    assert_eq!(vetoed.final_recommendation, Some(Recommendation::DoNotLaunch));
    assert_eq!(vetoed.select_for_wave_1, Some(false));

    let untargeted = repository
        .find_by_id(&SkuId("SKU-300".to_string()))
        .await
        .expect("lookup")
        .and_then(|scored| scored.cache)
        .expect("SKU-300 result");
    assert!(!untargeted.is_evaluated());
}

#[tokio::test]
async fn reingesting_replaces_instead_of_appending() {
    let pool = pool().await;
    let pipeline = IngestionPipeline::new(pool.clone());
    let bytes = shortlist(&reference_rows());
    let repository = SqlCandidateRepository::new(pool);

    pipeline.ingest(&bytes, &IngestOptions::default()).await.expect("first ingest");
    let first = repository.list(0, DEFAULT_PAGE_LIMIT).await.expect("list");

    pipeline.ingest(&bytes, &IngestOptions::default()).await.expect("second ingest");
    let second = repository.list(0, DEFAULT_PAGE_LIMIT).await.expect("list");

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);

    let smaller = shortlist(&reference_rows()[..1]);
    pipeline.ingest(&smaller, &IngestOptions::default()).await.expect("third ingest");
    assert_eq!(repository.count().await.expect("count"), 1);
}

#[tokio::test]
async fn default_market_and_mapping_reach_the_store() {
    let pool = pool().await;
    let pipeline = IngestionPipeline::new(pool.clone());
    let options = IngestOptions {
        mapping: ColumnMapping::from_json(r#"{"Brand": "Category"}"#).expect("mapping"),
        default_market: Some("India".to_string()),
    };

    pipeline.ingest(&shortlist(&reference_rows()), &options).await.expect("ingest");

    let kit = SqlCandidateRepository::new(pool)
        .find_by_id(&SkuId("SKU-300".to_string()))
        .await
        .expect("lookup")
        .expect("SKU-300 stored");
    assert_eq!(kit.candidate.target_market.as_deref(), Some("India"));
    assert_eq!(kit.candidate.brand.as_deref(), Some("Accessories"));
}

#[tokio::test]
async fn failed_ingest_leaves_previous_set_untouched() {
    let pool = pool().await;
    let pipeline = IngestionPipeline::new(pool.clone());
    pipeline
        .ingest(&shortlist(&reference_rows()), &IngestOptions::default())
        .await
        .expect("ingest");

    let mut bad = reference_rows();
    bad[0][8] = "ten dollars";
    let failure = pipeline
        .ingest(&shortlist(&bad), &IngestOptions::default())
        .await
        .expect_err("unparseable price must fail");
    assert!(matches!(
        failure,
        IngestionFailure::Ingest(IngestError::InvalidCell { expected: "number", .. })
    ));

    let garbage = pipeline.ingest(b"not a workbook", &IngestOptions::default()).await;
    assert!(matches!(garbage, Err(IngestionFailure::Ingest(IngestError::Workbook(_)))));

    assert_eq!(SqlCandidateRepository::new(pool).count().await.expect("count"), 3);
}

#[tokio::test]
async fn write_failure_rolls_back_the_whole_replacement() {
    let pool = pool().await;
    let pipeline = IngestionPipeline::new(pool.clone());
    pipeline
        .ingest(&shortlist(&reference_rows()), &IngestOptions::default())
        .await
        .expect("ingest");

    sqlx::query(
        "CREATE TRIGGER reject_results BEFORE INSERT ON sku_calculation_cache
         BEGIN SELECT RAISE(ABORT, 'result store unavailable'); END",
    )
    .execute(&pool)
    .await
    .expect("create trigger");

    let failure = pipeline
        .ingest(&shortlist(&reference_rows()[..1]), &IngestOptions::default())
        .await
        .expect_err("result write must fail");
    assert!(matches!(failure, IngestionFailure::Repository(RepositoryError::Database(_))));

    let repository = SqlCandidateRepository::new(pool);
    let kept = repository.list(0, DEFAULT_PAGE_LIMIT).await.expect("list");
    let ids = kept.iter().map(|scored| scored.candidate.sku_id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["SKU-100", "SKU-200", "SKU-300"]);
    assert!(kept.iter().all(|scored| scored.cache.is_some()));
}

#[tokio::test]
async fn concurrent_ingestions_run_one_at_a_time() {
    let pool = pool().await;
    let pipeline = IngestionPipeline::new(pool.clone());
    let full = shortlist(&reference_rows());
    let single = shortlist(&reference_rows()[..1]);
    let options = IngestOptions::default();

    let (first, second) =
        tokio::join!(pipeline.ingest(&full, &options), pipeline.ingest(&single, &options));
    assert_eq!(first.expect("first ingest").candidate_row_count, 3);
    assert_eq!(second.expect("second ingest").candidate_row_count, 1);

    let stored = SqlCandidateRepository::new(pool.clone())
        .list(0, DEFAULT_PAGE_LIMIT)
        .await
        .expect("list");
    assert!(stored.len() == 1 || stored.len() == 3, "one whole upload wins: {}", stored.len());
    assert!(stored.iter().all(|scored| scored.cache.is_some()));

    let results: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sku_calculation_cache")
        .fetch_one(&pool)
        .await
        .expect("count results");
    assert_eq!(results as usize, stored.len());
}
