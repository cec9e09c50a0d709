// ==========================================
// BOQ 自动核价系统 - 主数据目录仓储契约
// ==========================================
// 核心只依赖此读取契约，不关心底层存储形态
// 铁律: 查询为同步、无副作用读; 按领域分目录，互不引用
// ==========================================

use crate::domain::catalog::{CatalogEntryDraft, MasterCatalogEntry};
use crate::domain::types::Domain;
use crate::repository::error::RepositoryResult;

/// 主数据目录仓储
///
/// 编码查询按"原样大小写"精确比较; 名称查询的入参必须是
/// `domain::normalize::normalize_name` 之后的标准化名称
pub trait CatalogRepository: Send + Sync {
    /// 按编码查询（精确，大小写敏感），按 internal_id 升序返回
    fn find(&self, domain: Domain, code: &str) -> RepositoryResult<Vec<MasterCatalogEntry>>;

    /// 按标准化名称查询（精确），按 internal_id 升序返回
    fn find_by_name(
        &self,
        domain: Domain,
        normalized_name: &str,
    ) -> RepositoryResult<Vec<MasterCatalogEntry>>;

    /// 全量列出领域目录（模糊匹配候选集），按 internal_id 升序返回
    fn list(&self, domain: Domain) -> RepositoryResult<Vec<MasterCatalogEntry>>;

    /// 批量写入（主数据导入用）; 返回实际新增/更新的条数
    ///
    /// 重复规则: 同编码 + 同标准化名称视为同一条目，
    /// 新条目单价信息量更大时覆盖，否则忽略
    fn upsert(&self, domain: Domain, drafts: &[CatalogEntryDraft]) -> RepositoryResult<usize>;
}
