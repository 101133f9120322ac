// ==========================================
// 多租户餐厅预订系统 - 调度服务入口
// ==========================================
// 职责: 初始化数据库与仓储, 启动三个自治通知任务, 等待退出信号
// ==========================================

use std::sync::{Arc, Mutex};

use anyhow::Context;
use dining_reserve::engine::{ReservationLifecycle, ReservationRepositories};
use dining_reserve::scheduler::{LogMailSender, NotificationScheduler};
use dining_reserve::{db, logging};

/// 数据库路径 (环境变量可覆盖)
fn db_path() -> String {
    std::env::var("DINING_RESERVE_DB").unwrap_or_else(|_| "dining_reserve.db".to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 可用性与预订引擎", dining_reserve::APP_NAME);
    tracing::info!("系统版本: {}", dining_reserve::VERSION);
    tracing::info!("==================================================");

    // 打开数据库并引导 schema
    let db_path = db_path();
    tracing::info!("使用数据库: {}", db_path);
    let conn = db::open_sqlite_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    db::init_schema(&conn).context("schema 初始化失败")?;

    if let Some(version) = db::read_schema_version(&conn)? {
        if version != db::CURRENT_SCHEMA_VERSION {
            tracing::warn!(
                found = version,
                expected = db::CURRENT_SCHEMA_VERSION,
                "schema_version 与当前代码不一致"
            );
        }
    }

    // 装配仓储与引擎 (共享单连接)
    let conn = Arc::new(Mutex::new(conn));
    let repos = ReservationRepositories::from_connection(conn);
    let lifecycle = Arc::new(ReservationLifecycle::new(repos.clone()));

    // 启动通知调度 (未接入外部邮件服务时仅记日志)
    let scheduler = NotificationScheduler::new(&repos, lifecycle, Arc::new(LogMailSender));
    let handles = scheduler.spawn();
    tracing::info!("通知调度已启动: 确认/提醒/未到店 共 {} 个任务", handles.len());

    // 等待退出信号
    tokio::signal::ctrl_c().await.context("等待退出信号失败")?;
    tracing::info!("收到退出信号, 停止调度");
    for handle in handles {
        handle.abort();
    }

    Ok(())
}
