// ==========================================
// BOQ 自动核价系统 - 主数据目录导入器
// ==========================================
// 职责: 主数据文件（xlsx / csv）→ 目录条目 → 仓储
// xlsx 主数据文件的工作表布局与对应领域的 BOQ 模式一致，
// 区别仅在成本列存放"单价"而非待写回的合计
// ==========================================

use crate::domain::catalog::CatalogEntryDraft;
use crate::domain::grid::SheetGrid;
use crate::domain::normalize::is_totals_keyword;
use crate::domain::schema::SchemaDescriptor;
use crate::domain::types::Domain;
use crate::engine::classifier::SheetClassifier;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::workbook_parser::WorkbookParser;
use crate::repository::catalog_repo::CatalogRepository;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

// ==========================================
// CatalogImportReport - 导入报告
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogImportReport {
    pub total_rows: usize,
    pub imported: usize,
    pub skipped_rows: usize,
    pub per_domain: HashMap<String, usize>,
}

// ==========================================
// CatalogImporter
// ==========================================
pub struct CatalogImporter {
    repo: Arc<dyn CatalogRepository>,
}

impl CatalogImporter {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self { repo }
    }

    /// 导入主数据文件（按扩展名分流）
    pub fn import_file<P: AsRef<Path>>(
        &self,
        path: P,
        csv_domain: Domain,
    ) -> ImportResult<CatalogImportReport> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "xlsx" => {
                let bytes = std::fs::read(path)?;
                self.import_workbook_bytes(&bytes)
            }
            "csv" => self.import_csv(path, csv_domain),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }

    /// 导入 xlsx 主数据工作簿: 每张表按名称模式归入领域
    pub fn import_workbook_bytes(&self, bytes: &[u8]) -> ImportResult<CatalogImportReport> {
        let grids = WorkbookParser::parse_bytes(bytes)?;
        let mut report = CatalogImportReport::default();

        for grid in &grids {
            let schema = SheetClassifier::classify(&grid.name);
            if schema.domain == Domain::Default {
                // 主数据文件中未识别的表不猜领域
                warn!(sheet = %grid.name, "主数据表未命中任何领域模式，跳过");
                continue;
            }

            let drafts = Self::extract_master_rows(grid, schema, &mut report);
            if drafts.is_empty() {
                continue;
            }

            let written = self
                .repo
                .upsert(schema.domain, &drafts)
                .map_err(|e| ImportError::CatalogWriteError(e.to_string()))?;

            info!(
                sheet = %grid.name,
                domain = %schema.domain,
                rows = drafts.len(),
                written,
                "主数据表导入完成"
            );
            report.imported += written;
            *report
                .per_domain
                .entry(schema.domain.to_string())
                .or_insert(0) += written;
        }

        Ok(report)
    }

    /// 主数据表行提取: 表头行之后读到首个全空行
    fn extract_master_rows(
        grid: &SheetGrid,
        schema: &SchemaDescriptor,
        report: &mut CatalogImportReport,
    ) -> Vec<CatalogEntryDraft> {
        let cols = &schema.columns;
        let mut drafts = Vec::new();

        let mut row = schema.header_row_index + 1;
        while row < grid.row_count() {
            let code = grid.cell(row, cols.code).as_text();
            let name = grid.cell(row, cols.name).as_text();

            if code.is_none() && name.is_none() {
                break; // 数据块结束
            }
            report.total_rows += 1;

            // 合计/小计等控制行不入目录
            let code_is_totals = code.as_deref().map(is_totals_keyword).unwrap_or(false);
            let name_is_totals = name.as_deref().map(is_totals_keyword).unwrap_or(false);
            if code_is_totals || name_is_totals {
                report.skipped_rows += 1;
                row += 1;
                continue;
            }

            let Some(name) = name else {
                warn!(sheet = %grid.name, row, "主数据行无名称，跳过");
                report.skipped_rows += 1;
                row += 1;
                continue;
            };

            drafts.push(CatalogEntryDraft {
                code,
                name,
                unit: grid.cell(row, cols.unit).as_text(),
                material_unit_cost: grid.cell(row, cols.material_cost).as_number().unwrap_or(0.0),
                labor_unit_cost: grid.cell(row, cols.labor_cost).as_number().unwrap_or(0.0),
                source_row: row + 1, // 报告用 1-based 行号
            });
            row += 1;
        }

        drafts
    }

    /// 导入 CSV 主数据（固定表头: code,name,unit,material_cost,labor_cost）
    pub fn import_csv<P: AsRef<Path>>(
        &self,
        path: P,
        domain: Domain,
    ) -> ImportResult<CatalogImportReport> {
        let file = File::open(path.as_ref())?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();
        let col = |key: &str| headers.iter().position(|h| h == key);

        let (Some(name_idx), material_idx, labor_idx) = (
            col("name"),
            col("material_cost"),
            col("labor_cost"),
        ) else {
            return Err(ImportError::CsvParseError(
                "缺少必需表头 name".to_string(),
            ));
        };
        let code_idx = col("code");
        let unit_idx = col("unit");

        let mut report = CatalogImportReport::default();
        let mut drafts = Vec::new();

        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            let source_row = idx + 2; // 表头占第 1 行
            let get = |i: Option<usize>| -> Option<String> {
                i.and_then(|i| record.get(i))
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            };

            let Some(name) = get(Some(name_idx)) else {
                continue; // 空行
            };
            report.total_rows += 1;
            if is_totals_keyword(&name) {
                report.skipped_rows += 1;
                continue;
            }

            let parse_cost = |i: Option<usize>, field: &str| -> ImportResult<f64> {
                match get(i) {
                    None => Ok(0.0),
                    Some(v) => v.replace(',', "").parse::<f64>().map_err(|_| {
                        ImportError::TypeConversionError {
                            row: source_row,
                            field: field.to_string(),
                            message: format!("无法解析为数值: {}", v),
                        }
                    }),
                }
            };

            drafts.push(CatalogEntryDraft {
                code: get(code_idx),
                name,
                unit: get(unit_idx),
                material_unit_cost: parse_cost(material_idx, "material_cost")?,
                labor_unit_cost: parse_cost(labor_idx, "labor_cost")?,
                source_row,
            });
        }

        let written = self
            .repo
            .upsert(domain, &drafts)
            .map_err(|e| ImportError::CatalogWriteError(e.to_string()))?;
        report.imported = written;
        report.per_domain.insert(domain.to_string(), written);

        info!(domain = %domain, rows = drafts.len(), written, "CSV 主数据导入完成");
        Ok(report)
    }
}
