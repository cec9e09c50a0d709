// ==========================================
// BOQ 自动核价系统 - SQLite 主数据目录仓储
// ==========================================
// 存储: 每个领域一张表（interior_items / ee_items / ac_items /
//       fp_items / default_items），表结构一致
// total_cost 列在写入时由材料 + 人工求和，保持恒等
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::catalog::{CatalogEntryDraft, MasterCatalogEntry};
use crate::domain::normalize::normalize_name;
use crate::domain::types::Domain;
use crate::repository::catalog_repo::CatalogRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// 领域 → 目录表名
fn table_name(domain: Domain) -> &'static str {
    match domain {
        Domain::Interior => "interior_items",
        Domain::Electrical => "ee_items",
        Domain::Ac => "ac_items",
        Domain::FireProtection => "fp_items",
        Domain::Default => "default_items",
    }
}

// ==========================================
// SqliteCatalogRepository
// ==========================================
pub struct SqliteCatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogRepository {
    /// 打开数据库并确保目录表就绪
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_schema()?;
        Ok(repo)
    }

    /// 从已有连接创建（测试/复用场景）
    ///
    /// 说明: 为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)
                .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        }
        let repo = Self { conn };
        repo.ensure_schema()?;
        Ok(repo)
    }

    /// 各领域目录表建表（幂等）
    fn ensure_schema(&self) -> RepositoryResult<()> {
        let conn = self.lock()?;
        for domain in [
            Domain::Interior,
            Domain::Electrical,
            Domain::Ac,
            Domain::FireProtection,
            Domain::Default,
        ] {
            let table = table_name(domain);
            conn.execute_batch(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    code TEXT,
                    name TEXT NOT NULL,
                    name_normalized TEXT NOT NULL,
                    unit TEXT,
                    material_cost REAL NOT NULL DEFAULT 0,
                    labor_cost REAL NOT NULL DEFAULT 0,
                    total_cost REAL NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                );
                CREATE INDEX IF NOT EXISTS idx_{table}_code ON {table}(code);
                CREATE INDEX IF NOT EXISTS idx_{table}_name_normalized
                    ON {table}(name_normalized);
                "#
            ))?;
        }
        Ok(())
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<MasterCatalogEntry> {
        Ok(MasterCatalogEntry {
            internal_id: row.get(0)?,
            code: row.get(1)?,
            name: row.get(2)?,
            unit: row.get(3)?,
            material_unit_cost: row.get(4)?,
            labor_unit_cost: row.get(5)?,
            total_unit_cost: row.get(6)?,
        })
    }

    fn query_entries(
        &self,
        domain: Domain,
        where_clause: &str,
        bind: &[&dyn rusqlite::ToSql],
    ) -> RepositoryResult<Vec<MasterCatalogEntry>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT id, code, name, unit, material_cost, labor_cost, total_cost \
             FROM {} {} ORDER BY id",
            table_name(domain),
            where_clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(bind, Self::row_to_entry)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }
}

impl CatalogRepository for SqliteCatalogRepository {
    fn find(&self, domain: Domain, code: &str) -> RepositoryResult<Vec<MasterCatalogEntry>> {
        // TEXT 的 '=' 比较默认大小写敏感，与匹配规则一致
        self.query_entries(domain, "WHERE code = ?1", &[&code])
    }

    fn find_by_name(
        &self,
        domain: Domain,
        normalized_name: &str,
    ) -> RepositoryResult<Vec<MasterCatalogEntry>> {
        self.query_entries(domain, "WHERE name_normalized = ?1", &[&normalized_name])
    }

    fn list(&self, domain: Domain) -> RepositoryResult<Vec<MasterCatalogEntry>> {
        self.query_entries(domain, "", &[])
    }

    fn upsert(&self, domain: Domain, drafts: &[CatalogEntryDraft]) -> RepositoryResult<usize> {
        let mut conn = self.lock()?;
        let table = table_name(domain);
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut written = 0usize;
        for draft in drafts {
            if draft.name.trim().is_empty() {
                return Err(RepositoryError::ValidationError(format!(
                    "主数据名称为空 (源行 {})",
                    draft.source_row
                )));
            }
            let normalized = normalize_name(&draft.name);
            let total = draft.material_unit_cost + draft.labor_unit_cost;

            // 同编码 + 同标准化名称视为同一条目
            let existing: Option<(i64, f64)> = tx
                .query_row(
                    &format!(
                        "SELECT id, material_cost + labor_cost FROM {table} \
                         WHERE ifnull(code, '') = ifnull(?1, '') AND name_normalized = ?2 \
                         ORDER BY id LIMIT 1"
                    ),
                    params![draft.code, normalized],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })?;

            match existing {
                Some((id, existing_weight)) => {
                    // 新条目信息量更大才覆盖
                    if draft.cost_weight() > existing_weight {
                        tx.execute(
                            &format!(
                                "UPDATE {table} SET unit = ?1, material_cost = ?2, \
                                 labor_cost = ?3, total_cost = ?4, \
                                 updated_at = datetime('now') WHERE id = ?5"
                            ),
                            params![
                                draft.unit,
                                draft.material_unit_cost,
                                draft.labor_unit_cost,
                                total,
                                id
                            ],
                        )?;
                        written += 1;
                    } else {
                        debug!(
                            table,
                            name = %draft.name,
                            "重复条目信息量不高于已有记录，忽略"
                        );
                    }
                }
                None => {
                    tx.execute(
                        &format!(
                            "INSERT INTO {table} \
                             (code, name, name_normalized, unit, material_cost, labor_cost, total_cost) \
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                        ),
                        params![
                            draft.code,
                            draft.name,
                            normalized,
                            draft.unit,
                            draft.material_unit_cost,
                            draft.labor_unit_cost,
                            total
                        ],
                    )?;
                    written += 1;
                }
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(written)
    }
}
