// ==========================================
// BOQ 自动核价系统 - 工作表分类器
// ==========================================
// 职责: 工作表名 → 领域模式描述符
// 纯函数、全函数: 任何名称都有归属（DEFAULT 兜底）
// ==========================================

use crate::domain::schema::{SchemaDescriptor, SCHEMA_REGISTRY};

pub struct SheetClassifier;

impl SheetClassifier {
    /// 按注册表顺序取第一个命中的模式（first-match-wins）
    ///
    /// DEFAULT 位于注册表末尾且无模式，保证总有返回值
    pub fn classify(sheet_name: &str) -> &'static SchemaDescriptor {
        SCHEMA_REGISTRY
            .iter()
            .find(|schema| schema.matches(sheet_name))
            .expect("注册表末尾必有 DEFAULT 兜底")
    }
}
