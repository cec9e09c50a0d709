// ==========================================
// BOQ 自动核价系统 - 匹配引擎
// ==========================================
// 三级解析顺序（命中即止）:
//   1. 编码精确匹配（大小写敏感）
//   2. 标准化名称精确匹配
//   3. 模糊名称匹配（最高分且达阈值; 平分取最小 internal_id）
// 铁律: 匹配必须确定性, 相同输入永远得到相同结果
// 表内各行相互独立，可并行匹配，结果按原行序回装
// ==========================================

use crate::config::matching::MatchingConfig;
use crate::domain::catalog::MasterCatalogEntry;
use crate::domain::item::{LineItem, MatchInfo};
use crate::domain::normalize::normalize_name;
use crate::domain::types::{Domain, MatchMethod};
use crate::engine::error::{ProcessError, ProcessResult};
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::error::RepositoryResult;
use std::sync::Arc;
use tracing::debug;

/// 并行匹配的分块大小
const MATCH_CHUNK_SIZE: usize = 64;

/// 模糊匹配候选（名称预标准化，避免每行重复规整全目录）
struct Candidate {
    entry: MasterCatalogEntry,
    normalized_name: String,
}

pub struct MatchingEngine {
    catalog: Arc<dyn CatalogRepository>,
    config: MatchingConfig,
}

impl MatchingEngine {
    pub fn new(catalog: Arc<dyn CatalogRepository>, config: MatchingConfig) -> Self {
        Self { catalog, config }
    }

    /// 匹配一张表的全部清单项（按原行序返回）
    ///
    /// 目录访问失败整体返回 CatalogAccess，由编排器降级为
    /// "该领域全部未匹配"
    pub async fn match_items(
        &self,
        domain: Domain,
        items: &[LineItem],
    ) -> ProcessResult<Vec<Option<MatchInfo>>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        // 模糊候选集快照: 一次加载 + 预标准化
        let candidates: Vec<Candidate> = self
            .catalog
            .list(domain)
            .map_err(|e| ProcessError::CatalogAccess {
                domain: domain.to_string(),
                message: e.to_string(),
            })?
            .into_iter()
            .map(|entry| Candidate {
                normalized_name: normalize_name(&entry.name),
                entry,
            })
            .collect();
        let candidates = Arc::new(candidates);

        // 分块并行; join_all 保证块序 = 提交序 = 原行序
        let mut tasks = Vec::new();
        for chunk in items.chunks(MATCH_CHUNK_SIZE) {
            let chunk: Vec<LineItem> = chunk.to_vec();
            let catalog = self.catalog.clone();
            let candidates = candidates.clone();
            let config = self.config;
            let task = tokio::task::spawn_blocking(move || {
                chunk
                    .iter()
                    .map(|item| match_one(&*catalog, &candidates, &config, domain, item))
                    .collect::<RepositoryResult<Vec<Option<MatchInfo>>>>()
            });
            tasks.push(task);
        }

        let mut results = Vec::with_capacity(items.len());
        for joined in futures::future::join_all(tasks).await {
            let chunk_result = joined
                .map_err(|e| ProcessError::InternalError(format!("匹配任务失败: {}", e)))?
                .map_err(|e| ProcessError::CatalogAccess {
                    domain: domain.to_string(),
                    message: e.to_string(),
                })?;
            results.extend(chunk_result);
        }

        debug!(
            domain = %domain,
            total = items.len(),
            matched = results.iter().filter(|r| r.is_some()).count(),
            "匹配完成"
        );
        Ok(results)
    }
}

/// 单行匹配（纯读，确定性）
fn match_one(
    catalog: &dyn CatalogRepository,
    candidates: &[Candidate],
    config: &MatchingConfig,
    domain: Domain,
    item: &LineItem,
) -> RepositoryResult<Option<MatchInfo>> {
    // 1. 编码精确匹配
    if let Some(code) = item.code.as_deref().filter(|c| !c.is_empty()) {
        let hits = catalog.find(domain, code)?;
        if let Some(entry) = hits.first() {
            debug!(code, entry_id = entry.internal_id, "编码精确命中");
            return Ok(Some(match_info(entry, MatchMethod::ExactCode, 1.0)));
        }
    }

    // 2. 标准化名称精确匹配
    let normalized = normalize_name(&item.name);
    if normalized.is_empty() {
        return Ok(None);
    }
    let hits = catalog.find_by_name(domain, &normalized)?;
    if let Some(entry) = hits.first() {
        debug!(name = %item.name, entry_id = entry.internal_id, "标准化名称命中");
        return Ok(Some(match_info(entry, MatchMethod::NormalizedName, 1.0)));
    }

    // 3. 模糊匹配: 候选集按 internal_id 升序，
    //    只有严格更高分才替换 → 平分自然落在最小 id 上
    let mut best: Option<(&Candidate, f64)> = None;
    for candidate in candidates {
        let score = config.algorithm.score(&normalized, &candidate.normalized_name);
        let better = match best {
            None => true,
            Some((_, best_score)) => score > best_score,
        };
        if better {
            best = Some((candidate, score));
        }
    }

    match best {
        Some((candidate, score)) if score >= config.min_similarity => {
            debug!(
                name = %item.name,
                entry_id = candidate.entry.internal_id,
                score,
                "模糊命中"
            );
            Ok(Some(match_info(&candidate.entry, MatchMethod::Fuzzy, score)))
        }
        _ => Ok(None),
    }
}

fn match_info(entry: &MasterCatalogEntry, method: MatchMethod, similarity: f64) -> MatchInfo {
    MatchInfo {
        entry_id: entry.internal_id,
        entry_name: entry.name.clone(),
        method,
        similarity,
        material_unit_cost: entry.material_unit_cost,
        labor_unit_cost: entry.labor_unit_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory_catalog_repo::InMemoryCatalogRepository;

    fn entry(id: i64, code: Option<&str>, name: &str) -> MasterCatalogEntry {
        MasterCatalogEntry::new(id, code.map(|s| s.to_string()), name, None, 50.0, 20.0)
    }

    fn line_item(code: Option<&str>, name: &str) -> LineItem {
        LineItem {
            source_row_index: 0,
            code: code.map(|s| s.to_string()),
            name: name.to_string(),
            quantity: 1.0,
            unit: None,
        }
    }

    fn engine(entries: Vec<MasterCatalogEntry>) -> MatchingEngine {
        let repo = InMemoryCatalogRepository::with_entries(Domain::Interior, entries);
        MatchingEngine::new(Arc::new(repo), MatchingConfig::default())
    }

    #[tokio::test]
    async fn test_exact_code_match_first() {
        let engine = engine(vec![
            entry(1, Some("INT001"), "Something else entirely"),
            entry(2, None, "Ceiling tile"),
        ]);
        let results = engine
            .match_items(Domain::Interior, &[line_item(Some("INT001"), "Ceiling tile")])
            .await
            .unwrap();

        let info = results[0].as_ref().unwrap();
        assert_eq!(info.method, MatchMethod::ExactCode);
        assert_eq!(info.entry_id, 1);
        assert_eq!(info.similarity, 1.0);
    }

    #[tokio::test]
    async fn test_code_match_case_sensitive() {
        let engine = engine(vec![entry(1, Some("INT001"), "Ceiling tile")]);
        // 编码大小写不一致 → 落到名称精确匹配
        let results = engine
            .match_items(Domain::Interior, &[line_item(Some("int001"), "CEILING  TILE")])
            .await
            .unwrap();
        let info = results[0].as_ref().unwrap();
        assert_eq!(info.method, MatchMethod::NormalizedName);
    }

    #[tokio::test]
    async fn test_normalized_name_match() {
        let engine = engine(vec![entry(7, None, "Gypsum  Board Wall")]);
        let results = engine
            .match_items(Domain::Interior, &[line_item(None, "gypsum board   wall")])
            .await
            .unwrap();
        let info = results[0].as_ref().unwrap();
        assert_eq!(info.method, MatchMethod::NormalizedName);
        assert_eq!(info.entry_id, 7);
    }

    #[tokio::test]
    async fn test_fuzzy_match_above_threshold() {
        let engine = engine(vec![
            entry(1, None, "Fire rated door 60min"),
            entry(2, None, "Ceiling tile 60x60 cm"),
        ]);
        let results = engine
            .match_items(Domain::Interior, &[line_item(None, "Ceiling tile 60x60")])
            .await
            .unwrap();
        let info = results[0].as_ref().unwrap();
        assert_eq!(info.method, MatchMethod::Fuzzy);
        assert_eq!(info.entry_id, 2);
        assert!(info.similarity >= 0.80);
    }

    #[tokio::test]
    async fn test_fuzzy_below_threshold_unmatched() {
        let engine = engine(vec![entry(1, None, "Fire pump assembly")]);
        let results = engine
            .match_items(Domain::Interior, &[line_item(None, "Unknown Panel")])
            .await
            .unwrap();
        assert!(results[0].is_none());
    }

    #[tokio::test]
    async fn test_fuzzy_tie_breaks_to_lowest_id() {
        // 两个候选与查询的相似度完全一致 → 取 internal_id 较小者
        let engine = engine(vec![
            entry(3, None, "Steel door type A"),
            entry(9, None, "Steel door type B"),
        ]);
        let results = engine
            .match_items(Domain::Interior, &[line_item(None, "Steel door type C")])
            .await
            .unwrap();
        let info = results[0].as_ref().unwrap();
        assert_eq!(info.entry_id, 3);
    }

    #[tokio::test]
    async fn test_results_preserve_row_order() {
        let engine = engine(vec![
            entry(1, Some("A1"), "Alpha"),
            entry(2, Some("B2"), "Beta"),
        ]);
        // 超过一个分块的行数，验证回装顺序
        let mut items = Vec::new();
        for i in 0..200 {
            let code = if i % 2 == 0 { Some("A1") } else { Some("B2") };
            items.push(line_item(code, "x"));
        }
        let results = engine.match_items(Domain::Interior, &items).await.unwrap();
        assert_eq!(results.len(), 200);
        for (i, result) in results.iter().enumerate() {
            let expected = if i % 2 == 0 { 1 } else { 2 };
            assert_eq!(result.as_ref().unwrap().entry_id, expected);
        }
    }

    #[tokio::test]
    async fn test_deterministic_repeat() {
        let engine = engine(vec![
            entry(1, None, "Cable tray 100mm"),
            entry(2, None, "Cable tray 200mm"),
        ]);
        let items = [line_item(None, "Cable tray 100 mm")];
        let first = engine.match_items(Domain::Interior, &items).await.unwrap();
        let second = engine.match_items(Domain::Interior, &items).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_domain_catalog_all_unmatched() {
        let engine = engine(Vec::new());
        let results = engine
            .match_items(Domain::Interior, &[line_item(Some("X"), "Anything")])
            .await
            .unwrap();
        assert!(results[0].is_none());
    }
}
