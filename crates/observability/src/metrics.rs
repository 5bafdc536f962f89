//! Dispatcher 指标收集模块
//!
//! 通过 `metrics` facade 导出限流分发器的运行指标，并提供内存聚合器用于运行摘要。

use metrics::{counter, gauge, histogram};

/// 记录文档入队
pub fn record_document_submitted(queue_len: usize) {
    counter!("crpt_dispatch_documents_submitted_total").increment(1);
    gauge!("crpt_dispatch_queue_depth").set(queue_len as f64);
}

/// 记录单个文档分发结果
pub fn record_document_dispatched(transport: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "crpt_dispatch_documents_dispatched_total",
        "transport" => transport.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录分发失败 (按失败类别)
pub fn record_dispatch_failure(kind: &str) {
    counter!(
        "crpt_dispatch_failures_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// 记录一次窗口触发
///
/// `dispatched` 为本窗口发起的分发次数，`queue_len` 为窗口结束时的队列深度。
pub fn record_window_fired(dispatched: usize, queue_len: usize) {
    counter!("crpt_dispatch_windows_total").increment(1);
    histogram!("crpt_dispatch_window_batch_size").record(dispatched as f64);
    gauge!("crpt_dispatch_queue_depth").set(queue_len as f64);
}

/// 记录排队等待时间 (入队到发起分发)
pub fn record_queue_wait_ms(wait_ms: f64) {
    histogram!("crpt_dispatch_queue_wait_ms").record(wait_ms);
}

/// 记录周期控制器状态切换
pub fn record_cycle_transition(active: bool) {
    let transition = if active { "activated" } else { "deactivated" };
    counter!(
        "crpt_dispatch_cycle_transitions_total",
        "transition" => transition.to_string()
    )
    .increment(1);
    gauge!("crpt_dispatch_cycle_active").set(if active { 1.0 } else { 0.0 });
}

/// 分发指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。由周期控制器单线程更新。
#[derive(Debug, Clone, Default)]
pub struct DispatchStatsAggregator {
    /// 窗口触发次数
    pub total_windows: u64,

    /// 成功分发数
    pub total_dispatched: u64,

    /// 失败数 (编码 + 传输)
    pub total_failed: u64,

    /// 每窗口分发数统计
    pub batch_stats: RunningStats,

    /// 排队等待时间统计 (毫秒)
    pub wait_stats: RunningStats,
}

impl DispatchStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一次窗口
    pub fn record_window(&mut self, dispatched: usize) {
        self.total_windows += 1;
        self.batch_stats.push(dispatched as f64);
    }

    /// 记录单个文档结果
    pub fn record_outcome(&mut self, success: bool, wait_ms: f64) {
        if success {
            self.total_dispatched += 1;
        } else {
            self.total_failed += 1;
        }
        self.wait_stats.push(wait_ms);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        let attempts = self.total_dispatched + self.total_failed;
        MetricsSummary {
            total_windows: self.total_windows,
            total_dispatched: self.total_dispatched,
            total_failed: self.total_failed,
            failure_rate: if attempts > 0 {
                self.total_failed as f64 / attempts as f64 * 100.0
            } else {
                0.0
            },
            batch_size: StatsSummary::from(&self.batch_stats),
            queue_wait_ms: StatsSummary::from(&self.wait_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_windows: u64,
    pub total_dispatched: u64,
    pub total_failed: u64,
    pub failure_rate: f64,
    pub batch_size: StatsSummary,
    pub queue_wait_ms: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Metrics Summary ===")?;
        writeln!(f, "Windows fired: {}", self.total_windows)?;
        writeln!(f, "Dispatched: {}", self.total_dispatched)?;
        writeln!(
            f,
            "Failed: {} ({:.2}%)",
            self.total_failed, self.failure_rate
        )?;
        writeln!(f, "Batch size: {}", self.batch_size)?;
        writeln!(f, "Queue wait (ms): {}", self.queue_wait_ms)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
