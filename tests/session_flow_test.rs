// ==========================================
// BOQ 自动核价系统 - 会话流程与主数据集成测试
// ==========================================
// 覆盖: 取消、失败路径、SQLite 目录 + CSV 导入联动
// ==========================================


use boq_costing::api::{ApiError, ProcessApi, SessionManager};
use boq_costing::config::ProcessingConfig;
use boq_costing::domain::types::{Domain, SessionState};
use boq_costing::importer::CatalogImporter;
use boq_costing::logging;
use boq_costing::repository::SqliteCatalogRepository;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_cancel_before_processing() {
    logging::init_test();
    let api = ProcessApi::new(
        test_helpers::seeded_catalog(),
        ProcessingConfig::default(),
        Arc::new(SessionManager::new()),
    )
    .unwrap();

    let id = api
        .upload(test_helpers::build_boq_workbook(), None)
        .await
        .unwrap();
    api.cancel(&id).await.unwrap();

    let result = api.process(&id, 130).await;
    assert!(result.is_err());

    let report = api.status(&id).await.unwrap();
    assert_eq!(report.state, SessionState::Failed);
    assert!(report
        .failure_reason
        .as_deref()
        .unwrap_or("")
        .contains("取消"));
}

#[tokio::test]
async fn test_unreadable_workbook_fails_session() {
    let api = ProcessApi::new(
        test_helpers::seeded_catalog(),
        ProcessingConfig::default(),
        Arc::new(SessionManager::new()),
    )
    .unwrap();

    let id = api.upload(b"garbage bytes".to_vec(), None).await.unwrap();
    let result = api.process(&id, 130).await;
    assert!(matches!(result, Err(ApiError::ProcessingFailed(_))));

    let report = api.status(&id).await.unwrap();
    assert_eq!(report.state, SessionState::Failed);
    assert!(report.sheets.is_empty());
}

#[tokio::test]
async fn test_empty_catalog_still_finalizes_with_unmatched() {
    // 目录为空: 全部行未匹配、成本为 0，但会话正常完成
    logging::init_test();
    let api = ProcessApi::new(
        Arc::new(boq_costing::repository::InMemoryCatalogRepository::new()),
        ProcessingConfig::default(),
        Arc::new(SessionManager::new()),
    )
    .unwrap();

    let id = api
        .upload(test_helpers::build_boq_workbook(), None)
        .await
        .unwrap();
    let report = api.process(&id, 130).await.unwrap();

    assert_eq!(report.state, SessionState::Finalized);
    assert!((report.grand_total - 0.0).abs() < f64::EPSILON);
    for sheet in report.sheets.iter().filter(|s| s.matched + s.unmatched > 0) {
        assert_eq!(sheet.matched, 0);
    }
}

#[tokio::test]
async fn test_sqlite_catalog_with_csv_import_end_to_end() {
    logging::init_test();

    // 1. CSV 主数据 → SQLite 目录
    let db_file = NamedTempFile::new().unwrap();
    let catalog =
        Arc::new(SqliteCatalogRepository::new(db_file.path().to_str().unwrap()).unwrap());

    let mut csv = NamedTempFile::with_suffix(".csv").unwrap();
    writeln!(csv, "code,name,unit,material_cost,labor_cost").unwrap();
    writeln!(csv, "INT001,Ceiling tile,sqm,50,20").unwrap();
    writeln!(csv, ",Edge trim,m,12.5,3").unwrap();
    writeln!(csv, ",Total,,,").unwrap();

    let importer = CatalogImporter::new(catalog.clone());
    let import_report = importer.import_file(csv.path(), Domain::Interior).unwrap();
    assert_eq!(import_report.imported, 2);
    assert_eq!(import_report.skipped_rows, 1);

    // 2. 用 SQLite 目录跑核价
    let api = ProcessApi::new(
        catalog,
        ProcessingConfig::default(),
        Arc::new(SessionManager::new()),
    )
    .unwrap();
    let id = api
        .upload(test_helpers::build_boq_workbook(), None)
        .await
        .unwrap();
    let report = api.process(&id, 150).await.unwrap();

    let int1 = report
        .sheets
        .iter()
        .find(|s| s.sheet_name == "INT-1")
        .unwrap();
    assert_eq!(int1.matched, 2);

    // 加成 1.50: 700*1.5 + 62*1.5 = 1143
    assert!((int1.total_cost - 1143.0).abs() < 1e-6);

    // 电气/空调目录为空: 表仍完成但全未匹配
    let ee1 = report
        .sheets
        .iter()
        .find(|s| s.sheet_name == "EE-1")
        .unwrap();
    assert_eq!(ee1.matched, 0);
    assert_eq!(ee1.unmatched, 1);

    let output = api.download(&id).await.unwrap();
    let book = test_helpers::read_workbook(&output);
    let ws = book.get_sheet_by_name("INT-1").unwrap();
    assert_eq!(ws.get_value((8u32, 11u32)), "1050"); // 700 × 1.5
}
