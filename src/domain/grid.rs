// ==========================================
// BOQ 自动核价系统 - 工作表内存网格
// ==========================================
// 职责: 提取阶段的只读单元格网格（与具体解析库解耦）
// 坐标: 行为 0-based 下标，列为 Excel 1-based 列号
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// CellValue - 类型化单元格值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl CellValue {
    /// 是否为空（空单元格或纯空白文本）
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 取文本（去首尾空白；空返回 None）
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Empty => None,
        }
    }

    /// 取数值（文本可解析时也接受；否则 None）
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().replace(',', "").parse::<f64>().ok(),
            _ => None,
        }
    }
}

/// 数值转文本: 整数值不带小数点（与 Excel 显示一致，编码列常为数字）
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// ==========================================
// SheetGrid - 单张工作表的内存网格
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetGrid {
    pub name: String,
    /// 行集合; 行内为 0-based 列序; 行允许长短不一
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetGrid {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// 按 (0-based 行, 1-based Excel 列) 取单元格; 越界视为 Empty
    pub fn cell(&self, row_index: usize, excel_col: u32) -> &CellValue {
        if excel_col == 0 {
            return &EMPTY_CELL;
        }
        let col_index = (excel_col - 1) as usize;
        self.rows
            .get(row_index)
            .and_then(|row| row.get(col_index))
            .unwrap_or(&EMPTY_CELL)
    }

    /// 行数
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
