//! # Dispatcher
//!
//! 限流文档分发模块。
//!
//! 负责：
//! - 接收文档提交，FIFO 排队，提交方永不阻塞
//! - 固定窗口限流：每个窗口最多发起 `max_per_window` 次分发
//! - 队列清空后周期控制器自行停止，下一次提交重新激活
//! - 失败文档记录日志、指标和失败事件，不重试

pub mod dispatcher;
pub mod encoder;
pub mod error;
pub mod failure;
pub mod metrics;
pub mod queue;
pub mod rate;
pub mod transports;

pub use contracts::{Document, Transport};
pub use dispatcher::{create, create_dispatcher, Dispatcher, DispatcherBuilder};
pub use encoder::{JsonEncoder, PayloadEncoder};
pub use error::DispatcherError;
pub use failure::{failure_channel, DispatchFailure, FailureKind};
pub use metrics::{DispatcherMetrics, MetricsSnapshot};
pub use queue::CycleState;
pub use rate::RateConfig;
pub use transports::{AnyTransport, HttpTransport, HttpTransportConfig, LogTransport};
