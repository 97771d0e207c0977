//! Resilient Data Access Guard
//!
//! 数据库弹性访问守卫：连续失败计数 + 冷却快速失败。
//!
//! 所有仓储调用都经由 [`DbGuard::run`] 执行。连续出现
//! [`RepoError::Transient`](super::repository::RepoError::Transient)
//! 达到阈值后，冷却窗口内的调用直接返回
//! [`RepoError::Unavailable`](super::repository::RepoError::Unavailable)，
//! 不再触达数据库引擎。
//!
//! # 状态机
//!
//! ```text
//! failures < threshold          failures >= threshold
//!   ┌─────────┐  transient失败    ┌─────────────┐
//!   │ 正常通行 │ ───────────────> │ 冷却快速失败 │
//!   └─────────┘ <─────────────── └─────────────┘
//!        ^        冷却到期(计数先清零再放行)
//!        └── 任意一次成功清零计数
//! ```
//!
//! 计数器与时间戳由互斥锁保护，多线程并发失败不会丢失更新。
//! 进程级状态，不持久化，重启即重置。

use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::repository::{RepoError, RepoResult};

/// 守卫配置
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// 连续分类失败阈值
    pub failure_threshold: u32,
    /// 阈值触发后的冷却窗口
    pub cooldown: Duration,
}

impl GuardConfig {
    /// 从环境变量加载 (DB_FAILURE_THRESHOLD / DB_COOLDOWN_MS)
    pub fn from_env() -> Self {
        Self {
            failure_threshold: std::env::var("DB_FAILURE_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
            cooldown: Duration::from_millis(
                std::env::var("DB_COOLDOWN_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30_000),
            ),
        }
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(30),
        }
    }
}

/// 互斥锁保护的计数器状态
#[derive(Debug)]
struct BreakerState {
    /// 连续分类失败次数
    failures: u32,
    /// 最近一次尝试时间
    last_attempt: Option<Instant>,
}

/// 数据库弹性访问守卫
///
/// 显式持有、注入到 [`ServerState`](crate::core::ServerState) 的结构体，
/// 而非隐藏的模块级全局变量，便于测试和多实例隔离。
#[derive(Debug)]
pub struct DbGuard {
    config: GuardConfig,
    state: Mutex<BreakerState>,
}

impl DbGuard {
    pub fn new(config: GuardConfig) -> Self {
        Self {
            config,
            state: Mutex::new(BreakerState {
                failures: 0,
                last_attempt: None,
            }),
        }
    }

    /// 执行一次受守卫保护的数据库操作
    ///
    /// 1. 阈值已达且冷却未到期：立即返回 `Unavailable`，不执行操作。
    /// 2. 冷却已到期：先清零计数，再放行。
    /// 3. 记录尝试时间戳，执行操作。
    /// 4. 成功：非零计数清零 (恢复信号)。
    /// 5. 失败：仅 `Transient` 递增计数；所有错误原样上抛。
    pub async fn run<T, F>(&self, op: F) -> RepoResult<T>
    where
        F: Future<Output = RepoResult<T>>,
    {
        {
            let mut state = self.state.lock().expect("breaker lock poisoned");

            if state.failures >= self.config.failure_threshold {
                let elapsed = state
                    .last_attempt
                    .map(|t| t.elapsed())
                    .unwrap_or(self.config.cooldown);

                if elapsed < self.config.cooldown {
                    tracing::warn!(
                        target: "database",
                        failures = state.failures,
                        "Fast-failing database call during cooldown"
                    );
                    return Err(RepoError::Unavailable);
                }

                // 冷却到期：下一次调用必须真正触达后端
                tracing::info!(target: "database", "Cooldown elapsed, probing database again");
                state.failures = 0;
            }

            state.last_attempt = Some(Instant::now());
        }

        match op.await {
            Ok(value) => {
                let mut state = self.state.lock().expect("breaker lock poisoned");
                if state.failures > 0 {
                    tracing::info!(
                        target: "database",
                        previous_failures = state.failures,
                        "Database recovered, failure counter reset"
                    );
                    state.failures = 0;
                }
                Ok(value)
            }
            Err(err) => {
                if matches!(err, RepoError::Transient(_)) {
                    let mut state = self.state.lock().expect("breaker lock poisoned");
                    state.failures += 1;
                    tracing::warn!(
                        target: "database",
                        failures = state.failures,
                        threshold = self.config.failure_threshold,
                        error = %err,
                        "Classified transient database failure"
                    );
                }
                Err(err)
            }
        }
    }

    /// 当前连续失败计数 (健康检查/测试用)
    pub fn failure_count(&self) -> u32 {
        self.state.lock().expect("breaker lock poisoned").failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn guard(threshold: u32, cooldown_ms: u64) -> DbGuard {
        DbGuard::new(GuardConfig {
            failure_threshold: threshold,
            cooldown: Duration::from_millis(cooldown_ms),
        })
    }

    async fn transient_failure(attempts: &AtomicUsize) -> RepoResult<()> {
        attempts.fetch_add(1, Ordering::SeqCst);
        Err(RepoError::Transient("connection refused".to_string()))
    }

    async fn query_failure(attempts: &AtomicUsize) -> RepoResult<()> {
        attempts.fetch_add(1, Ordering::SeqCst);
        Err(RepoError::Database("syntax error".to_string()))
    }

    async fn success(attempts: &AtomicUsize) -> RepoResult<u32> {
        attempts.fetch_add(1, Ordering::SeqCst);
        Ok(42)
    }

    #[tokio::test]
    async fn test_fast_fail_after_threshold() {
        let g = guard(3, 60_000);
        let attempts = AtomicUsize::new(0);

        for _ in 0..3 {
            let err = g.run(transient_failure(&attempts)).await.unwrap_err();
            assert!(matches!(err, RepoError::Transient(_)));
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(g.failure_count(), 3);

        // Subsequent calls fail fast without touching the backend
        for _ in 0..5 {
            let err = g.run(transient_failure(&attempts)).await.unwrap_err();
            assert!(matches!(err, RepoError::Unavailable));
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cooldown_elapse_resets_before_next_call() {
        let g = guard(3, 50);
        let attempts = AtomicUsize::new(0);

        for _ in 0..3 {
            let _ = g.run(transient_failure(&attempts)).await;
        }
        assert!(matches!(
            g.run(transient_failure(&attempts)).await.unwrap_err(),
            RepoError::Unavailable
        ));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);

        tokio::time::sleep(Duration::from_millis(70)).await;

        // The very next call reaches the backend: counter was reset before
        // the attempt, so this failure counts as 1, not 4
        let err = g.run(transient_failure(&attempts)).await.unwrap_err();
        assert!(matches!(err, RepoError::Transient(_)));
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        assert_eq!(g.failure_count(), 1);

        // And the one after that is attempted too (below threshold again)
        let _ = g.run(transient_failure(&attempts)).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_success_resets_counter() {
        let g = guard(3, 60_000);
        let attempts = AtomicUsize::new(0);

        for _ in 0..2 {
            let _ = g.run(transient_failure(&attempts)).await;
        }
        assert_eq!(g.failure_count(), 2);

        let value = g.run(success(&attempts)).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(g.failure_count(), 0);

        // Three more failures needed before fast-fail kicks in again
        for _ in 0..2 {
            let _ = g.run(transient_failure(&attempts)).await;
        }
        assert!(matches!(
            g.run(success(&attempts)).await,
            Ok(42)
        ));
    }

    #[tokio::test]
    async fn test_query_errors_do_not_trip_breaker() {
        let g = guard(3, 60_000);
        let attempts = AtomicUsize::new(0);

        for _ in 0..10 {
            let err = g.run(query_failure(&attempts)).await.unwrap_err();
            assert!(matches!(err, RepoError::Database(_)));
        }
        assert_eq!(g.failure_count(), 0);
        assert_eq!(attempts.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_errors_reraised_unchanged() {
        let g = guard(3, 60_000);
        let attempts = AtomicUsize::new(0);

        let err = g.run(transient_failure(&attempts)).await.unwrap_err();
        match err {
            RepoError::Transient(msg) => assert_eq!(msg, "connection refused"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
