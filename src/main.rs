// ==========================================
// BOQ 自动核价系统 - 命令行入口
// ==========================================
// 用法:
//   boq-costing process <BOQ.xlsx> <目录.db> <加成百分比> [输出.xlsx]
//   boq-costing import-master <主数据.xlsx|.csv> <目录.db> [领域]
// ==========================================

use boq_costing::api::{ProcessApi, SessionManager};
use boq_costing::config::ProcessingConfig;
use boq_costing::domain::types::Domain;
use boq_costing::importer::CatalogImporter;
use boq_costing::repository::SqliteCatalogRepository;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    // 初始化日志系统
    boq_costing::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", boq_costing::APP_NAME);
    tracing::info!("系统版本: {}", boq_costing::VERSION);
    tracing::info!("==================================================");

    let args: Vec<String> = std::env::args().collect();
    let result = match args.get(1).map(String::as_str) {
        Some("process") => run_process(&args[2..]).await,
        Some("import-master") => run_import_master(&args[2..]),
        _ => {
            eprintln!("用法:");
            eprintln!("  boq-costing process <BOQ.xlsx> <目录.db> <加成百分比> [输出.xlsx]");
            eprintln!("  boq-costing import-master <主数据.xlsx|.csv> <目录.db> [领域]");
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("执行失败: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// 核价: 读 BOQ 工作簿 → 匹配主数据 → 计价 → 写出结果文件
async fn run_process(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let [boq_path, db_path, markup] = match args {
        [a, b, c] | [a, b, c, _] => [a, b, c],
        _ => return Err("process 需要参数: <BOQ.xlsx> <目录.db> <加成百分比>".into()),
    };
    let markup_percent: u32 = markup
        .parse()
        .map_err(|_| format!("加成百分比须为整数: {}", markup))?;

    let catalog = Arc::new(SqliteCatalogRepository::new(db_path)?);
    let manager = Arc::new(SessionManager::new());
    let api = ProcessApi::new(catalog, ProcessingConfig::default(), manager)?;

    let bytes = std::fs::read(boq_path)?;
    let file_name = PathBuf::from(boq_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string());
    let session_id = api.upload(bytes, file_name).await?;

    let report = api.process(&session_id, markup_percent).await?;
    for sheet in &report.sheets {
        tracing::info!(
            sheet = %sheet.sheet_name,
            domain = %sheet.domain,
            status = ?sheet.status,
            matched = sheet.matched,
            unmatched = sheet.unmatched,
            total = sheet.total_cost,
            "工作表结果"
        );
    }
    tracing::info!(grand_total = report.grand_total, "核价完成");
    println!("{}", serde_json::to_string_pretty(&report)?);

    let output_bytes = api.download(&session_id).await?;
    let output_path = args
        .get(3)
        .cloned()
        .unwrap_or_else(|| default_output_path(boq_path));
    std::fs::write(&output_path, output_bytes)?;
    tracing::info!(output = %output_path, "输出已写出");
    Ok(())
}

/// 主数据导入: 同步主数据文件到目录数据库
fn run_import_master(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let (master_path, db_path) = match args {
        [a, b] | [a, b, _] => (a, b),
        _ => return Err("import-master 需要参数: <主数据文件> <目录.db>".into()),
    };
    // CSV 导入需要显式领域（xlsx 按表名模式归属）
    let csv_domain = args
        .get(2)
        .map(|s| {
            Domain::from_db_str(s).ok_or_else(|| format!("未知领域: {}", s))
        })
        .transpose()?
        .unwrap_or(Domain::Interior);

    let catalog = Arc::new(SqliteCatalogRepository::new(db_path)?);
    let importer = CatalogImporter::new(catalog);
    let report = importer.import_file(master_path, csv_domain)?;

    tracing::info!(
        total_rows = report.total_rows,
        imported = report.imported,
        skipped = report.skipped_rows,
        "主数据导入完成"
    );
    Ok(())
}

fn default_output_path(input: &str) -> String {
    let path = PathBuf::from(input);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "boq".to_string());
    let parent = path.parent().unwrap_or_else(|| std::path::Path::new("."));
    parent
        .join(format!("{}_costed.xlsx", stem))
        .to_string_lossy()
        .to_string()
}
