// ==========================================
// BOQ 自动核价系统 - 清单项提取器
// ==========================================
// 职责: 工作表网格 + 模式 → 结构化清单项
// 规则:
// - 从表头行之后第一行起连续读取
// - 编码与名称同时为空 = 数据块结束（不做向后跳空查找）
// - 无编码但有名称 = 依附子项，保留并独立计价
// - 合计/小计关键字行为控制行，跳过但不终止
// ==========================================

use crate::domain::grid::SheetGrid;
use crate::domain::item::LineItem;
use crate::domain::normalize::is_totals_keyword;
use crate::domain::schema::SchemaDescriptor;
use crate::engine::error::{ProcessError, ProcessResult};
use tracing::{debug, warn};

pub struct LineItemExtractor;

impl LineItemExtractor {
    /// 提取单张工作表的清单项
    pub fn extract(grid: &SheetGrid, schema: &SchemaDescriptor) -> ProcessResult<Vec<LineItem>> {
        let header_row = schema.header_row_index;
        let cols = &schema.columns;

        // 表头行必须存在且非全空，否则视为工作表不符合模式
        if header_row >= grid.row_count() {
            return Err(ProcessError::SheetFormat {
                sheet: grid.name.clone(),
                message: format!(
                    "表头行不存在: 期望第 {} 行, 实际仅 {} 行",
                    header_row + 1,
                    grid.row_count()
                ),
            });
        }
        let header_blank = cols
            .all_columns()
            .iter()
            .all(|&c| grid.cell(header_row, c).is_blank());
        if header_blank {
            return Err(ProcessError::SheetFormat {
                sheet: grid.name.clone(),
                message: format!("表头行(第 {} 行)为空", header_row + 1),
            });
        }

        let mut items = Vec::new();
        let data_start = header_row + 1;

        for row in data_start..grid.row_count() {
            let code = grid.cell(row, cols.code).as_text();
            let name = grid.cell(row, cols.name).as_text();

            // 全空行终止数据块
            if code.is_none() && name.is_none() {
                break;
            }

            // 合计/小计控制行: 跳过
            let code_is_totals = code.as_deref().map(is_totals_keyword).unwrap_or(false);
            let name_is_totals = name.as_deref().map(is_totals_keyword).unwrap_or(false);
            if code_is_totals || name_is_totals {
                debug!(sheet = %grid.name, row = row + 1, "跳过合计控制行");
                continue;
            }

            // 有编码无名称: 无法计价，跳过并告警
            let Some(name) = name else {
                warn!(
                    sheet = %grid.name,
                    row = row + 1,
                    code = code.as_deref().unwrap_or(""),
                    "行有编码但无名称，跳过"
                );
                continue;
            };

            // 工程量: 空/非数值按 0 处理（非致命，记录告警）
            let quantity_cell = grid.cell(row, cols.quantity);
            let quantity = match quantity_cell.as_number() {
                Some(q) => q,
                None => {
                    if !quantity_cell.is_blank() {
                        warn!(
                            sheet = %grid.name,
                            row = row + 1,
                            "工程量非数值，按 0 处理"
                        );
                    }
                    0.0
                }
            };

            items.push(LineItem {
                source_row_index: row - data_start,
                code,
                name,
                quantity,
                unit: grid.cell(row, cols.unit).as_text(),
            });
        }

        debug!(sheet = %grid.name, items = items.len(), "清单项提取完成");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::CellValue;
    use crate::domain::schema::SCHEMA_REGISTRY;

    /// 按 INTERIOR 模式造网格: 表头在 0-based 第 9 行
    fn interior_grid(data_rows: Vec<Vec<(u32, CellValue)>>) -> SheetGrid {
        let mut grid = SheetGrid::new("INT-1");
        for _ in 0..9 {
            grid.rows.push(Vec::new());
        }
        // 表头行
        grid.rows.push(vec![
            CellValue::Empty,
            CellValue::Text("CODE".to_string()),
            CellValue::Text("DESCRIPTION".to_string()),
            CellValue::Text("QTY".to_string()),
            CellValue::Text("UNIT".to_string()),
        ]);
        // 数据行
        for cells in data_rows {
            let mut row = vec![CellValue::Empty; 8];
            for (excel_col, value) in cells {
                row[(excel_col - 1) as usize] = value;
            }
            grid.rows.push(row);
        }
        grid
    }

    fn interior_schema() -> &'static SchemaDescriptor {
        SCHEMA_REGISTRY
            .iter()
            .find(|s| s.domain == crate::domain::types::Domain::Interior)
            .unwrap()
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_extract_basic_rows() {
        let grid = interior_grid(vec![
            vec![
                (2, text("INT001")),
                (3, text("Ceiling tile")),
                (4, CellValue::Number(10.0)),
                (5, text("sqm")),
            ],
            vec![
                (2, text("INT002")),
                (3, text("Gypsum wall")),
                (4, CellValue::Number(25.5)),
                (5, text("sqm")),
            ],
        ]);

        let items = LineItemExtractor::extract(&grid, interior_schema()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source_row_index, 0);
        assert_eq!(items[0].code.as_deref(), Some("INT001"));
        assert_eq!(items[0].quantity, 10.0);
        assert_eq!(items[1].source_row_index, 1);
        assert_eq!(items[1].quantity, 25.5);
    }

    #[test]
    fn test_extract_stops_at_blank_row_no_lookahead() {
        let grid = interior_grid(vec![
            vec![(2, text("INT001")), (3, text("Ceiling tile"))],
            vec![], // 全空行 → 终止
            vec![(2, text("INT002")), (3, text("After gap"))],
        ]);

        let items = LineItemExtractor::extract(&grid, interior_schema()).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_extract_keeps_sub_items() {
        let grid = interior_grid(vec![
            vec![
                (2, text("INT001")),
                (3, text("Ceiling tile")),
                (4, CellValue::Number(10.0)),
            ],
            // 子项: 无编码有名称
            vec![(3, text("Edge trim")), (4, CellValue::Number(4.0))],
        ]);

        let items = LineItemExtractor::extract(&grid, interior_schema()).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[1].is_sub_item());
        assert_eq!(items[1].source_row_index, 1);
    }

    #[test]
    fn test_extract_skips_totals_rows_without_terminating() {
        let grid = interior_grid(vec![
            vec![(2, text("INT001")), (3, text("Ceiling tile"))],
            vec![(3, text("Total"))],
            vec![(2, text("INT002")), (3, text("Gypsum wall"))],
        ]);

        let items = LineItemExtractor::extract(&grid, interior_schema()).unwrap();
        assert_eq!(items.len(), 2);
        // 控制行占位: 后续行的块内下标保持与工作表行对应
        assert_eq!(items[1].source_row_index, 2);
    }

    #[test]
    fn test_extract_non_numeric_quantity_defaults_zero() {
        let grid = interior_grid(vec![vec![
            (2, text("INT001")),
            (3, text("Ceiling tile")),
            (4, text("n/a")),
        ]]);

        let items = LineItemExtractor::extract(&grid, interior_schema()).unwrap();
        assert_eq!(items[0].quantity, 0.0);
    }

    #[test]
    fn test_extract_missing_header_band_is_format_error() {
        let mut grid = SheetGrid::new("INT-short");
        grid.rows.push(vec![CellValue::Text("x".to_string())]);

        let err = LineItemExtractor::extract(&grid, interior_schema()).unwrap_err();
        assert!(matches!(err, ProcessError::SheetFormat { .. }));
    }

    #[test]
    fn test_extract_blank_header_is_format_error() {
        // 行数够但表头带为空
        let mut grid = SheetGrid::new("INT-blankhdr");
        for _ in 0..12 {
            grid.rows.push(vec![CellValue::Empty; 8]);
        }
        let err = LineItemExtractor::extract(&grid, interior_schema()).unwrap_err();
        assert!(matches!(err, ProcessError::SheetFormat { .. }));
    }
}
