// ==========================================
// BOQ 自动核价系统 - 核价编排器
// ==========================================
// 用途: 按会话状态机推进五个阶段
//   解析 → PARSED → 匹配 → MATCHED → 计价 → COSTED
//   → 写回 + 汇总 → FINALIZED
// 铁律:
// - 单表失败只影响本表，其余表继续; 全表失败或工作簿打不开才算会话失败
// - 取消请求只在工作表边界采纳，不中断进行中的表
// ==========================================

use crate::config::ProcessingConfig;
use crate::domain::item::CostedLineItem;
use crate::domain::schema::SchemaDescriptor;
use crate::domain::session::{ProcessingSession, SheetOutcome, SheetStage, SheetStatus};
use crate::domain::types::{Domain, SessionState};
use crate::engine::classifier::SheetClassifier;
use crate::engine::cost::CostCalculator;
use crate::engine::error::{ProcessError, ProcessResult};
use crate::engine::extractor::LineItemExtractor;
use crate::engine::matcher::MatchingEngine;
use crate::engine::summary::SummaryAggregator;
use crate::engine::writer::WorkbookWriter;
use crate::importer::workbook_parser::WorkbookParser;
use crate::repository::catalog_repo::CatalogRepository;
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 待处理工作表（提取成功后进入匹配/计价/写回）
struct SheetWork {
    outcome_index: usize,
    schema: &'static SchemaDescriptor,
    items: Vec<crate::domain::item::LineItem>,
}

// ==========================================
// BoqOrchestrator - 核价编排器
// ==========================================
pub struct BoqOrchestrator {
    matcher: MatchingEngine,
    config: ProcessingConfig,
}

impl BoqOrchestrator {
    /// 创建编排器（配置在此一次性校验）
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        config: ProcessingConfig,
    ) -> ProcessResult<Self> {
        config
            .validate()
            .map_err(ProcessError::InternalError)?;
        Ok(Self {
            matcher: MatchingEngine::new(catalog, config.matching),
            config,
        })
    }

    /// 执行完整核价流程（单会话）
    ///
    /// 会话级失败（工作簿打不开 / 全表失败 / 取消）置 FAILED 并返回错误;
    /// 单表失败记录在对应 SheetOutcome 中，不向上抛
    pub async fn process_session(
        &self,
        session: &mut ProcessingSession,
        markup_percent: u32,
    ) -> ProcessResult<()> {
        info!(
            session_id = %session.session_id,
            markup_percent,
            "开始核价流程"
        );

        let multiplier = self
            .config
            .markup
            .multiplier_for(markup_percent)
            .ok_or(ProcessError::MarkupNotConfigured(markup_percent))?;

        // ==========================================
        // 阶段1: 解析工作簿 → PARSED
        // ==========================================
        let grids = match WorkbookParser::parse_bytes(&session.source_bytes) {
            Ok(grids) => grids,
            Err(e) => {
                session.mark_failed(format!("工作簿解析失败: {}", e));
                return Err(e.into());
            }
        };
        debug!(sheets = grids.len(), "工作簿解析完成");

        // 分类 + 提取（逐表，表边界检查取消）
        let mut outcomes: Vec<SheetOutcome> = Vec::with_capacity(grids.len());
        let mut work_list: Vec<SheetWork> = Vec::new();

        for grid in &grids {
            if session.is_cancel_requested() {
                session.mark_failed("会话已取消");
                return Err(ProcessError::Cancelled);
            }

            // 汇总表不作为清单表处理
            if self.config.summary.matches_sheet(&grid.name) {
                outcomes.push(SheetOutcome::skipped(
                    &grid.name,
                    Domain::Default,
                    "汇总表",
                ));
                continue;
            }

            let schema = SheetClassifier::classify(&grid.name);

            // 未命中领域模式的表默认不触碰
            if schema.domain == Domain::Default && !self.config.process_default_sheets {
                debug!(sheet = %grid.name, "未命中领域模式，跳过");
                outcomes.push(SheetOutcome::skipped(
                    &grid.name,
                    Domain::Default,
                    "未命中领域模式",
                ));
                continue;
            }

            match LineItemExtractor::extract(grid, schema) {
                Ok(items) => {
                    let mut outcome =
                        SheetOutcome::skipped(&grid.name, schema.domain, "待处理");
                    outcome.status = SheetStatus::Costed; // 占位，计价阶段覆写
                    outcome.message = None;
                    work_list.push(SheetWork {
                        outcome_index: outcomes.len(),
                        schema,
                        items,
                    });
                    outcomes.push(outcome);
                }
                Err(e) => {
                    warn!(sheet = %grid.name, error = %e, "提取失败，本表跳过");
                    outcomes.push(SheetOutcome::failed(
                        &grid.name,
                        schema.domain,
                        SheetStage::Extract,
                        e.to_string(),
                    ));
                }
            }
        }

        session.per_sheet_results = outcomes;
        if let Err(e) = session.advance(SessionState::Parsed) {
            session.mark_failed(e.to_string());
            return Err(ProcessError::InternalError(e.to_string()));
        }

        // ==========================================
        // 阶段2: 匹配 → MATCHED
        // ==========================================
        let mut matches_per_sheet: Vec<Vec<Option<crate::domain::item::MatchInfo>>> =
            Vec::with_capacity(work_list.len());

        for work in &work_list {
            if session.is_cancel_requested() {
                session.mark_failed("会话已取消");
                return Err(ProcessError::Cancelled);
            }

            let sheet_name = session.per_sheet_results[work.outcome_index]
                .sheet_name
                .clone();
            match self.matcher.match_items(work.schema.domain, &work.items).await {
                Ok(matches) => matches_per_sheet.push(matches),
                Err(ProcessError::CatalogAccess { domain, message }) => {
                    // 目录不可用: 本领域全部按未匹配降级处理
                    warn!(
                        sheet = %sheet_name,
                        domain = %domain,
                        error = %message,
                        "主数据目录访问失败，本表全部按未匹配处理"
                    );
                    matches_per_sheet.push(vec![None; work.items.len()]);
                }
                Err(e) => return Err(e),
            }
        }

        if let Err(e) = session.advance(SessionState::Matched) {
            session.mark_failed(e.to_string());
            return Err(ProcessError::InternalError(e.to_string()));
        }

        // ==========================================
        // 阶段3: 计价 → COSTED
        // ==========================================
        let calculator = CostCalculator::new(multiplier);

        for (work, matches) in work_list.iter().zip(matches_per_sheet.into_iter()) {
            let outcome = &mut session.per_sheet_results[work.outcome_index];
            let mut costed_items: Vec<CostedLineItem> = Vec::with_capacity(work.items.len());

            for (item, matched) in work.items.iter().cloned().zip(matches.into_iter()) {
                match calculator.cost_item(&outcome.sheet_name, item.clone(), matched) {
                    Ok(costed) => costed_items.push(costed),
                    Err(e) => {
                        // 行级校验失败: 跳过本行，表继续
                        warn!(
                            sheet = %outcome.sheet_name,
                            row = item.source_row_index,
                            error = %e,
                            "行校验失败，跳过本行"
                        );
                        costed_items.push(CostedLineItem::invalid(item, e.to_string()));
                    }
                }
            }

            outcome.items = costed_items;
            outcome.recompute_totals();
            outcome.status = SheetStatus::Costed;
            info!(
                sheet = %outcome.sheet_name,
                matched = outcome.matched_count(),
                unmatched = outcome.unmatched_count(),
                invalid = outcome.invalid_count(),
                total = outcome.total_cost,
                "计价完成"
            );
        }

        if let Err(e) = session.advance(SessionState::Costed) {
            session.mark_failed(e.to_string());
            return Err(ProcessError::InternalError(e.to_string()));
        }

        // ==========================================
        // 阶段4: 写回 + 汇总 → FINALIZED
        // ==========================================
        let mut book =
            match umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(&session.source_bytes[..]), true)
            {
                Ok(book) => book,
                Err(e) => {
                    session.mark_failed(format!("工作簿写回打开失败: {}", e));
                    return Err(ProcessError::Workbook(e.to_string()));
                }
            };

        for work in &work_list {
            let outcome = &mut session.per_sheet_results[work.outcome_index];
            if outcome.status != SheetStatus::Costed {
                continue;
            }
            match WorkbookWriter::write_sheet(&mut book, outcome, work.schema) {
                Ok(_) => outcome.status = SheetStatus::Written,
                Err(e) => {
                    // 单表写回失败（越界等）: 本表原子放弃，其余表继续
                    warn!(sheet = %outcome.sheet_name, error = %e, "写回失败");
                    outcome.mark_failed(SheetStage::Write, e.to_string());
                }
            }
        }

        // 全部成员表到达 COSTED 之后才聚合（失败表计 0 并已标记）
        SummaryAggregator::write_summary(
            &mut book,
            &session.per_sheet_results,
            &self.config.summary,
        )?;

        // 会话失败判定: 存在可处理表但无一成功
        let processable = session
            .per_sheet_results
            .iter()
            .filter(|o| o.status != SheetStatus::Skipped)
            .count();
        let written = session
            .per_sheet_results
            .iter()
            .filter(|o| o.status == SheetStatus::Written)
            .count();
        if processable > 0 && written == 0 {
            session.mark_failed("全部工作表处理失败");
            return Err(ProcessError::AllSheetsFailed);
        }

        // 序列化输出字节
        let mut cursor = Cursor::new(Vec::new());
        if let Err(e) = umya_spreadsheet::writer::xlsx::write_writer(&book, &mut cursor) {
            session.mark_failed(format!("输出序列化失败: {}", e));
            return Err(ProcessError::Workbook(e.to_string()));
        }
        session.output_bytes = Some(cursor.into_inner());

        if let Err(e) = session.advance(SessionState::Finalized) {
            session.mark_failed(e.to_string());
            return Err(ProcessError::InternalError(e.to_string()));
        }

        info!(
            session_id = %session.session_id,
            sheets = session.per_sheet_results.len(),
            written,
            "核价流程完成"
        );
        Ok(())
    }
}
