// ==========================================
// BOQ 自动核价系统 - 工作簿写回器
// ==========================================
// 职责: 把计价结果写回源工作簿的精确单元格
// 铁律:
// - 只写模式指定的三个成本列，其余内容/公式/样式不触碰
// - 单表原子性: 先全量校验目标行边界，再落笔; 任一越界则本表一格不写
// - 行号换算只经由 row_addr::absolute_row
// 舍入: 货币值在此统一舍入到分（两位小数），全链路唯一舍入点
// ==========================================

use crate::domain::schema::SchemaDescriptor;
use crate::domain::session::SheetOutcome;
use crate::engine::error::{ProcessError, ProcessResult};
use crate::engine::row_addr::absolute_row;
use tracing::{debug, warn};
use umya_spreadsheet::Spreadsheet;

/// 货币舍入: 两位小数（四舍五入）
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct WorkbookWriter;

impl WorkbookWriter {
    /// 写回一张工作表的成本列; 返回写入的行数
    ///
    /// 仅 status 为 Costed 的行落笔（未匹配/非法行不写，保持原单元格）
    pub fn write_sheet(
        book: &mut Spreadsheet,
        outcome: &SheetOutcome,
        schema: &SchemaDescriptor,
    ) -> ProcessResult<usize> {
        let sheet_name = &outcome.sheet_name;
        let worksheet =
            book.get_sheet_by_name_mut(sheet_name)
                .ok_or_else(|| ProcessError::SheetFormat {
                    sheet: sheet_name.clone(),
                    message: "写回目标工作表不存在".to_string(),
                })?;

        let max_row = worksheet.get_highest_row();
        let writable: Vec<_> = outcome.items.iter().filter(|i| i.is_writable()).collect();

        // 第一遍: 全量边界校验（任一越界 → 本表一格不写）
        for item in &writable {
            let target = absolute_row(schema.header_row_index, item.item.source_row_index);
            if target > max_row {
                warn!(
                    sheet = %sheet_name,
                    target,
                    max_row,
                    "写回目标行越界，本表放弃写回"
                );
                return Err(ProcessError::RowIndex {
                    sheet: sheet_name.clone(),
                    row: target,
                    max_row,
                });
            }
        }

        // 第二遍: 落笔
        let cols = &schema.columns;
        for item in &writable {
            let target = absolute_row(schema.header_row_index, item.item.source_row_index);
            worksheet
                .get_cell_mut((cols.material_cost, target))
                .set_value_number(round2(item.material_cost));
            worksheet
                .get_cell_mut((cols.labor_cost, target))
                .set_value_number(round2(item.labor_cost));
            worksheet
                .get_cell_mut((cols.total_cost, target))
                .set_value_number(round2(item.total_cost));
        }

        debug!(sheet = %sheet_name, rows = writable.len(), "成本写回完成");
        Ok(writable.len())
    }
}
