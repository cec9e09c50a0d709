// ==========================================
// BOQ 自动核价系统 - 工作簿解析器
// ==========================================
// 职责: 工作簿字节流 → 各工作表内存网格（只读提取路径）
// 写回路径另行使用原位编辑器，两条路径互不干扰
// ==========================================

use crate::domain::grid::{CellValue, SheetGrid};
use crate::importer::error::{ImportError, ImportResult};
use calamine::{Data, Range, Reader, Xlsx};
use std::io::Cursor;
use tracing::debug;

pub struct WorkbookParser;

impl WorkbookParser {
    /// 解析工作簿字节流，按工作簿内顺序返回全部工作表网格
    pub fn parse_bytes(bytes: &[u8]) -> ImportResult<Vec<SheetGrid>> {
        if bytes.is_empty() {
            return Err(ImportError::WorkbookParseError("字节流为空".to_string()));
        }

        let cursor = Cursor::new(bytes);
        let mut workbook: Xlsx<_> =
            Xlsx::new(cursor).map_err(|e| ImportError::WorkbookParseError(e.to_string()))?;

        let sheet_names = workbook.sheet_names().to_owned();
        if sheet_names.is_empty() {
            return Err(ImportError::NoWorksheets);
        }

        let mut grids = Vec::with_capacity(sheet_names.len());
        for name in sheet_names {
            let range = workbook
                .worksheet_range(&name)
                .map_err(|e| ImportError::WorkbookParseError(format!("{}: {}", name, e)))?;

            let grid = Self::range_to_grid(&name, &range);
            debug!(sheet = %name, rows = grid.row_count(), "工作表解析完成");
            grids.push(grid);
        }

        Ok(grids)
    }

    /// Range → 绝对坐标网格
    ///
    /// calamine 的 Range 只覆盖"已使用区域"，起点未必是 A1;
    /// 这里按起点偏移补齐空行/空列，保证网格行列与工作表绝对坐标一致
    fn range_to_grid(name: &str, range: &Range<Data>) -> SheetGrid {
        let mut grid = SheetGrid::new(name);

        let (start_row, start_col) = match range.start() {
            Some((r, c)) => (r as usize, c as usize),
            None => return grid, // 空表
        };

        // 起点之前的行补空
        grid.rows = Vec::with_capacity(start_row + range.height());
        for _ in 0..start_row {
            grid.rows.push(Vec::new());
        }

        for row in range.rows() {
            let mut cells = Vec::with_capacity(start_col + row.len());
            // 起点之前的列补空
            cells.resize(start_col, CellValue::Empty);
            cells.extend(row.iter().map(Self::convert_cell));
            grid.rows.push(cells);
        }

        grid
    }

    fn convert_cell(data: &Data) -> CellValue {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => {
                if s.trim().is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(s.clone())
                }
            }
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Text(format!("{:?}", e)),
        }
    }
}
