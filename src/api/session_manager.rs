// ==========================================
// BOQ 自动核价系统 - 会话管理器
// ==========================================
// 并发模型:
// - 不同会话可并发处理（各自独占自己的工作簿）
// - 同一会话的状态推进互斥: 每会话一把 tokio 互斥锁
// - 取消标志独立于会话锁，处理中也能从外部置位
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::session::ProcessingSession;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// 会话句柄: 会话锁 + 独立取消标志
#[derive(Clone)]
pub struct SessionHandle {
    pub session: Arc<Mutex<ProcessingSession>>,
    cancel_flag: Arc<AtomicBool>,
}

impl SessionHandle {
    /// 不经过会话锁请求取消（工作表边界生效）
    pub fn request_cancel(&self) {
        self.cancel_flag
            .store(true, std::sync::atomic::Ordering::Relaxed);
    }
}

// ==========================================
// SessionManager
// ==========================================
#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记新会话（工作簿字节归会话独占）; 返回 session_id
    pub async fn create(&self, source_bytes: Vec<u8>, file_name: Option<String>) -> String {
        let session = ProcessingSession::new(source_bytes, file_name);
        let session_id = session.session_id.clone();
        let handle = SessionHandle {
            cancel_flag: session.cancel_requested.clone(),
            session: Arc::new(Mutex::new(session)),
        };

        self.sessions
            .write()
            .await
            .insert(session_id.clone(), handle);
        info!(session_id = %session_id, "会话已创建");
        session_id
    }

    /// 取会话句柄
    pub async fn get(&self, session_id: &str) -> ApiResult<SessionHandle> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| ApiError::SessionNotFound(session_id.to_string()))
    }

    /// 请求取消（不阻塞在会话锁上）
    pub async fn request_cancel(&self, session_id: &str) -> ApiResult<()> {
        let handle = self.get(session_id).await?;
        handle.request_cancel();
        info!(session_id, "已登记取消请求");
        Ok(())
    }

    /// 移除会话（下载完成或放弃后清理）
    pub async fn remove(&self, session_id: &str) -> ApiResult<()> {
        let removed = self.sessions.write().await.remove(session_id);
        if removed.is_none() {
            return Err(ApiError::SessionNotFound(session_id.to_string()));
        }
        debug!(session_id, "会话已移除");
        Ok(())
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SessionState;

    #[tokio::test]
    async fn test_create_and_get() {
        let manager = SessionManager::new();
        let id = manager.create(vec![1, 2, 3], Some("boq.xlsx".to_string())).await;

        let handle = manager.get(&id).await.unwrap();
        let session = handle.session.lock().await;
        assert_eq!(session.state, SessionState::Uploaded);
        assert_eq!(session.source_bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_get_unknown_session() {
        let manager = SessionManager::new();
        let result = manager.get("nope").await;
        assert!(matches!(result, Err(ApiError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_cancel_without_session_lock() {
        let manager = SessionManager::new();
        let id = manager.create(Vec::new(), None).await;

        // 故意持有会话锁，模拟处理中
        let handle = manager.get(&id).await.unwrap();
        let guard = handle.session.lock().await;

        // 取消请求不经过会话锁，不会死锁
        manager.request_cancel(&id).await.unwrap();
        assert!(guard.is_cancel_requested());
    }

    #[tokio::test]
    async fn test_exclusive_advance_via_mutex() {
        let manager = SessionManager::new();
        let id = manager.create(Vec::new(), None).await;
        let handle = manager.get(&id).await.unwrap();

        // 两个并发调用者串行通过互斥锁推进状态;
        // 第二个推进到同一状态时必然报非法转换
        let h1 = handle.clone();
        let t1 = tokio::spawn(async move {
            let mut s = h1.session.lock().await;
            s.advance(SessionState::Parsed)
        });
        let h2 = handle.clone();
        let t2 = tokio::spawn(async move {
            let mut s = h2.session.lock().await;
            s.advance(SessionState::Parsed)
        });

        let (r1, r2) = (t1.await.unwrap(), t2.await.unwrap());
        assert!(r1.is_ok() != r2.is_ok(), "恰有一个调用者成功推进");
    }

    #[tokio::test]
    async fn test_remove() {
        let manager = SessionManager::new();
        let id = manager.create(Vec::new(), None).await;
        assert_eq!(manager.session_count().await, 1);
        manager.remove(&id).await.unwrap();
        assert_eq!(manager.session_count().await, 0);
        assert!(manager.remove(&id).await.is_err());
    }
}
