// ── Sample data generators ──
//
// One generator per dashboard data domain, used only by the fallback
// layer when a backend call fails (local development, demos, backend
// outage). Values are randomized, timestamps are relative to now, but
// the structure is the same typed models the REST client returns, so
// the mock path can never drift from the real one.

use chrono::{Duration, Utc};
use rand::Rng;
use uuid::Uuid;

use opsdeck_api::models::{
    AdminUser, AlertRecord, AnalyticsSummary, LogEntry, LogLevel, SeriesPoint, SystemMetrics,
    Transaction, TransactionStatus, UserRole,
};

/// Synthetic system metrics. Status tracks the generated CPU load so
/// health panels show a coherent picture.
pub fn sample_metrics() -> SystemMetrics {
    let mut rng = rand::thread_rng();
    let cpu = rng.gen_range(5.0..95.0);

    let status = if cpu > 85.0 {
        "critical"
    } else if cpu > 65.0 {
        "warning"
    } else {
        "healthy"
    };

    SystemMetrics {
        status: status.to_string(),
        cpu_percent: cpu,
        memory_percent: rng.gen_range(20.0..80.0),
        memory_used_mb: rng.gen_range(400.0..3500.0),
        disk_percent: rng.gen_range(25.0..70.0),
        uptime_secs: rng.gen_range(3_600..2_592_000),
        active_connections: rng.gen_range(1..120),
        timestamp: Utc::now(),
    }
}

/// Synthetic security alerts covering the whole severity ladder,
/// newest first, none resolved.
pub fn sample_alerts() -> Vec<AlertRecord> {
    let now = Utc::now();
    let entries = [
        ("critical", "intrusion", "Repeated privilege escalation attempts", "auth"),
        ("high", "brute_force", "14 failed logins for admin account", "auth"),
        ("medium", "rate_limit", "API rate limit exceeded from 10.0.3.7", "gateway"),
        ("low", "config_drift", "CORS origin list changed outside deploy", "config"),
    ];

    entries
        .iter()
        .enumerate()
        .map(|(i, (severity, alert_type, message, source))| AlertRecord {
            id: Uuid::new_v4(),
            severity: (*severity).to_string(),
            alert_type: (*alert_type).to_string(),
            message: (*message).to_string(),
            source: (*source).to_string(),
            timestamp: now - Duration::minutes((i as i64 + 1) * 7),
            resolved: false,
        })
        .collect()
}

/// Synthetic analytics summary with a 24-hour signup series.
pub fn sample_analytics() -> AnalyticsSummary {
    let mut rng = rand::thread_rng();
    let now = Utc::now();

    let signups = (0..24)
        .map(|h| SeriesPoint {
            timestamp: now - Duration::hours(23 - h),
            value: rng.gen_range(0.0..40.0),
        })
        .collect();

    AnalyticsSummary {
        total_users: rng.gen_range(2_000..60_000),
        active_users: rng.gen_range(200..8_000),
        revenue_cents: rng.gen_range(100_000..9_000_000),
        conversion_rate: rng.gen_range(0.01..0.12),
        signups,
    }
}

/// Synthetic payment transactions, newest first.
pub fn sample_transactions() -> Vec<Transaction> {
    let mut rng = rand::thread_rng();
    let now = Utc::now();
    let statuses = [
        TransactionStatus::Completed,
        TransactionStatus::Completed,
        TransactionStatus::Pending,
        TransactionStatus::Failed,
        TransactionStatus::Refunded,
    ];

    statuses
        .iter()
        .enumerate()
        .map(|(i, status)| Transaction {
            id: Uuid::new_v4(),
            reference: format!("txn_{:08x}", rng.r#gen::<u32>()),
            amount_cents: rng.gen_range(500..25_000),
            currency: "USD".to_string(),
            status: *status,
            gateway: if i % 2 == 0 { "stripe" } else { "paypal" }.to_string(),
            timestamp: now - Duration::minutes((i as i64) * 11),
        })
        .collect()
}

/// Synthetic backend log entries, newest first.
pub fn sample_logs() -> Vec<LogEntry> {
    let now = Utc::now();
    let entries = [
        (LogLevel::Error, "payments", "Gateway webhook signature mismatch"),
        (LogLevel::Warn, "auth", "Slow token verification (412ms)"),
        (LogLevel::Info, "api", "Plan catalogue reloaded"),
        (LogLevel::Info, "scheduler", "Nightly cleanup finished: 382 sessions removed"),
        (LogLevel::Debug, "realtime", "Monitoring subscriber attached"),
        (LogLevel::Info, "api", "User export requested by staff"),
        (LogLevel::Warn, "db", "Connection pool at 85% capacity"),
        (LogLevel::Info, "backup", "Snapshot uploaded (142 MB)"),
    ];

    entries
        .iter()
        .enumerate()
        .map(|(i, (level, source, message))| LogEntry {
            timestamp: now - Duration::seconds((i as i64) * 47),
            level: *level,
            source: (*source).to_string(),
            message: (*message).to_string(),
        })
        .collect()
}

/// Synthetic user list: three accounts, one of them an admin.
pub fn sample_users() -> Vec<AdminUser> {
    let now = Utc::now();
    let entries = [
        ("Avery Quinn", "avery@example.com", UserRole::Admin, 320),
        ("Sam Okafor", "sam@example.com", UserRole::Staff, 200),
        ("Jordan Lee", "jordan@example.com", UserRole::User, 45),
    ];

    entries
        .iter()
        .map(|(name, email, role, age_days)| AdminUser {
            id: Uuid::new_v4(),
            name: (*name).to_string(),
            email: (*email).to_string(),
            role: *role,
            active: true,
            created_at: now - Duration::days(*age_days),
        })
        .collect()
}
