// ==========================================
// BOQ 自动核价系统 - 汇总聚合器
// ==========================================
// 职责: 各领域合计 → 汇总表固定坐标
// 前置: 全部成员工作表已到达 COSTED 步骤
// 失败的领域表计 0 并标记，不拖垮整个汇总
// ==========================================

use crate::config::summary::SummaryLayout;
use crate::domain::session::{SheetOutcome, SheetStatus};
use crate::domain::types::Domain;
use crate::engine::error::ProcessResult;
use crate::engine::writer::round2;
use std::collections::BTreeMap;
use tracing::{info, warn};
use umya_spreadsheet::Spreadsheet;

pub struct SummaryAggregator;

impl SummaryAggregator {
    /// 写入汇总表; 返回命中的汇总表名（工作簿内无汇总表时为 None，不视为错误）
    pub fn write_summary(
        book: &mut Spreadsheet,
        outcomes: &[SheetOutcome],
        layout: &SummaryLayout,
    ) -> ProcessResult<Option<String>> {
        // 定位汇总表: 取工作簿内第一张命中模式的表
        let summary_sheet = book
            .get_sheet_collection()
            .iter()
            .map(|ws| ws.get_name().to_string())
            .find(|name| layout.matches_sheet(name));

        let Some(sheet_name) = summary_sheet else {
            info!("工作簿无汇总表，跳过汇总");
            return Ok(None);
        };

        let totals = Self::domain_totals(outcomes);

        let worksheet = book
            .get_sheet_by_name_mut(&sheet_name)
            .expect("汇总表名刚由本工作簿枚举得到");

        for (domain, total) in &totals {
            let Some(cell) = layout.position_for(*domain) else {
                continue; // 未配置落点的领域不写
            };
            worksheet
                .get_cell_mut((cell.col, cell.row))
                .set_value_number(round2(*total));
        }

        info!(sheet = %sheet_name, domains = totals.len(), "汇总写入完成");
        Ok(Some(sheet_name))
    }

    /// 各领域合计; 失败/跳过的表计 0 并告警标记
    fn domain_totals(outcomes: &[SheetOutcome]) -> BTreeMap<Domain, f64> {
        let mut totals: BTreeMap<Domain, f64> = BTreeMap::new();
        for outcome in outcomes {
            let entry = totals.entry(outcome.domain).or_insert(0.0);
            match outcome.status {
                SheetStatus::Written | SheetStatus::Costed => {
                    *entry += outcome.total_cost;
                }
                SheetStatus::Failed => {
                    warn!(
                        sheet = %outcome.sheet_name,
                        domain = %outcome.domain,
                        "工作表处理失败，汇总计 0"
                    );
                }
                SheetStatus::Skipped => {}
            }
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::SheetStage;

    fn outcome(name: &str, domain: Domain, status: SheetStatus, total: f64) -> SheetOutcome {
        let mut o = SheetOutcome::skipped(name, domain, "");
        o.status = status;
        o.message = None;
        o.total_cost = total;
        o
    }

    #[test]
    fn test_domain_totals_sum_and_zero_for_failed() {
        let outcomes = vec![
            outcome("INT-1", Domain::Interior, SheetStatus::Written, 910.0),
            outcome("INT-2", Domain::Interior, SheetStatus::Written, 90.0),
            outcome("EE-1", Domain::Electrical, SheetStatus::Failed, 0.0),
        ];
        let totals = SummaryAggregator::domain_totals(&outcomes);
        assert_eq!(totals[&Domain::Interior], 1000.0);
        assert_eq!(totals[&Domain::Electrical], 0.0);
    }

    #[test]
    fn test_write_summary_to_configured_cells() {
        let mut book = umya_spreadsheet::new_file();
        let _ = book.remove_sheet_by_name("Sheet1");
        book.new_sheet("INT-1").unwrap();
        book.new_sheet("Summary").unwrap();

        let outcomes = vec![outcome("INT-1", Domain::Interior, SheetStatus::Written, 910.0)];
        let layout = SummaryLayout::default();
        let written_to = SummaryAggregator::write_summary(&mut book, &outcomes, &layout).unwrap();
        assert_eq!(written_to.as_deref(), Some("Summary"));

        // 默认布局: 室内合计落 B5
        let ws = book.get_sheet_by_name("Summary").unwrap();
        assert_eq!(ws.get_value((2u32, 5u32)), "910");
    }

    #[test]
    fn test_no_summary_sheet_is_not_an_error() {
        let mut book = umya_spreadsheet::new_file();
        let _ = book.remove_sheet_by_name("Sheet1");
        book.new_sheet("INT-1").unwrap();

        let outcomes = vec![outcome(
            "INT-1",
            Domain::Interior,
            SheetStatus::Written,
            1.0,
        )];
        let result =
            SummaryAggregator::write_summary(&mut book, &outcomes, &SummaryLayout::default());
        assert_eq!(result.unwrap(), None);
    }

    #[test]
    fn test_failed_stage_preserved_in_outcome() {
        let mut o = outcome("EE-1", Domain::Electrical, SheetStatus::Costed, 5.0);
        o.mark_failed(SheetStage::Write, "越界");
        assert_eq!(o.status, SheetStatus::Failed);
        assert_eq!(o.failed_stage, Some(SheetStage::Write));
    }
}
