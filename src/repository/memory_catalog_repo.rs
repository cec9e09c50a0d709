// ==========================================
// BOQ 自动核价系统 - 内存主数据目录仓储
// ==========================================
// 用途: 测试与演示; 语义与 SQLite 实现对齐
// （编码大小写敏感、名称按标准化值比较、internal_id 升序）
// ==========================================

use crate::domain::catalog::{CatalogEntryDraft, MasterCatalogEntry};
use crate::domain::normalize::normalize_name;
use crate::domain::types::Domain;
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
struct Store {
    next_id: i64,
    by_domain: HashMap<Domain, Vec<MasterCatalogEntry>>,
}

// ==========================================
// InMemoryCatalogRepository
// ==========================================
#[derive(Default)]
pub struct InMemoryCatalogRepository {
    store: RwLock<Store>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以固定条目预置目录（测试便捷构造）
    pub fn with_entries(domain: Domain, entries: Vec<MasterCatalogEntry>) -> Self {
        let repo = Self::new();
        {
            let mut store = repo.store.write().unwrap();
            store.next_id = entries.iter().map(|e| e.internal_id).max().unwrap_or(0) + 1;
            store.by_domain.insert(domain, entries);
        }
        repo
    }

    fn read(&self) -> RepositoryResult<std::sync::RwLockReadGuard<'_, Store>> {
        self.store
            .read()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl CatalogRepository for InMemoryCatalogRepository {
    fn find(&self, domain: Domain, code: &str) -> RepositoryResult<Vec<MasterCatalogEntry>> {
        let store = self.read()?;
        let mut hits: Vec<_> = store
            .by_domain
            .get(&domain)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.code.as_deref() == Some(code))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        hits.sort_by_key(|e| e.internal_id);
        Ok(hits)
    }

    fn find_by_name(
        &self,
        domain: Domain,
        normalized_name: &str,
    ) -> RepositoryResult<Vec<MasterCatalogEntry>> {
        let store = self.read()?;
        let mut hits: Vec<_> = store
            .by_domain
            .get(&domain)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| normalize_name(&e.name) == normalized_name)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        hits.sort_by_key(|e| e.internal_id);
        Ok(hits)
    }

    fn list(&self, domain: Domain) -> RepositoryResult<Vec<MasterCatalogEntry>> {
        let store = self.read()?;
        let mut entries = store.by_domain.get(&domain).cloned().unwrap_or_default();
        entries.sort_by_key(|e| e.internal_id);
        Ok(entries)
    }

    fn upsert(&self, domain: Domain, drafts: &[CatalogEntryDraft]) -> RepositoryResult<usize> {
        let mut store = self
            .store
            .write()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut written = 0usize;
        for draft in drafts {
            if draft.name.trim().is_empty() {
                return Err(RepositoryError::ValidationError(format!(
                    "主数据名称为空 (源行 {})",
                    draft.source_row
                )));
            }

            let key = draft.dedup_key();
            let entries = store.by_domain.entry(domain).or_default();
            let existing = entries.iter_mut().find(|e| {
                format!(
                    "{}|{}",
                    e.code.as_deref().unwrap_or(""),
                    normalize_name(&e.name)
                ) == key
            });

            match existing {
                Some(entry) => {
                    if draft.cost_weight() > entry.material_unit_cost + entry.labor_unit_cost {
                        entry.unit = draft.unit.clone();
                        entry.material_unit_cost = draft.material_unit_cost;
                        entry.labor_unit_cost = draft.labor_unit_cost;
                        entry.total_unit_cost = draft.material_unit_cost + draft.labor_unit_cost;
                        written += 1;
                    }
                }
                None => {
                    store.next_id += 1;
                    let id = store.next_id;
                    store.by_domain.entry(domain).or_default().push(
                        MasterCatalogEntry::new(
                            id,
                            draft.code.clone(),
                            draft.name.clone(),
                            draft.unit.clone(),
                            draft.material_unit_cost,
                            draft.labor_unit_cost,
                        ),
                    );
                    written += 1;
                }
            }
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, code: Option<&str>, name: &str, mat: f64, lab: f64) -> MasterCatalogEntry {
        MasterCatalogEntry::new(id, code.map(|s| s.to_string()), name, None, mat, lab)
    }

    #[test]
    fn test_find_code_case_sensitive() {
        let repo = InMemoryCatalogRepository::with_entries(
            Domain::Interior,
            vec![entry(1, Some("INT001"), "Ceiling tile", 50.0, 20.0)],
        );
        assert_eq!(repo.find(Domain::Interior, "INT001").unwrap().len(), 1);
        assert!(repo.find(Domain::Interior, "int001").unwrap().is_empty());
    }

    #[test]
    fn test_find_by_name_normalized() {
        let repo = InMemoryCatalogRepository::with_entries(
            Domain::Electrical,
            vec![entry(1, None, "Cable  Tray 100MM", 10.0, 5.0)],
        );
        let hits = repo
            .find_by_name(Domain::Electrical, &normalize_name("cable tray 100mm"))
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_upsert_assigns_increasing_ids() {
        let repo = InMemoryCatalogRepository::new();
        repo.upsert(
            Domain::Ac,
            &[
                CatalogEntryDraft {
                    code: Some("AC1".to_string()),
                    name: "Duct".to_string(),
                    unit: None,
                    material_unit_cost: 1.0,
                    labor_unit_cost: 1.0,
                    source_row: 1,
                },
                CatalogEntryDraft {
                    code: Some("AC2".to_string()),
                    name: "Grille".to_string(),
                    unit: None,
                    material_unit_cost: 2.0,
                    labor_unit_cost: 1.0,
                    source_row: 2,
                },
            ],
        )
        .unwrap();
        let all = repo.list(Domain::Ac).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].internal_id < all[1].internal_id);
    }
}
