use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use sysinfo::System;
use tracing::{info, warn};

use crate::{
    application::services::StorageService, domain::config::policy::FilePolicy,
};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub storage: StorageHealth,
    pub policy: PolicyInfo,
    pub metrics: SystemMetrics,
}

#[derive(Debug, Serialize)]
pub struct StorageHealth {
    pub available: bool,
    #[serde(rename = "blobCount")]
    pub blob_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PolicyInfo {
    #[serde(rename = "maxSize")]
    pub max_size: u64,
    #[serde(rename = "defaultLifetime")]
    pub default_lifetime: i64,
    #[serde(rename = "allowedMimeTypes")]
    pub allowed_mime_types: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SystemMetrics {
    #[serde(rename = "cpuUsagePercent")]
    pub cpu_usage_percent: f32,
    #[serde(rename = "memoryUsedBytes")]
    pub memory_used_bytes: u64,
    #[serde(rename = "memoryTotalBytes")]
    pub memory_total_bytes: u64,
    #[serde(rename = "memoryUsagePercent")]
    pub memory_usage_percent: f32,
}

pub struct HealthController;

impl HealthController {
    /// GET /health
    pub async fn health_check(
        State(storage): State<Arc<dyn StorageService>>,
        State(policy): State<Arc<FilePolicy>>,
    ) -> Json<HealthResponse> {
        info!("Health check requested");

        let storage_health = match storage.list_names().await {
            Ok(names) => StorageHealth {
                available: true,
                blob_count: Some(names.len()),
                error: None,
            },
            Err(e) => {
                warn!("Storage unavailable during health check: {}", e);
                StorageHealth {
                    available: false,
                    blob_count: None,
                    error: Some(e.to_string()),
                }
            }
        };

        let mut sys = System::new();
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let memory_used = sys.used_memory();
        let memory_total = sys.total_memory();
        let memory_usage_percent = if memory_total > 0 {
            (memory_used as f32 / memory_total as f32) * 100.0
        } else {
            0.0
        };

        Json(HealthResponse {
            status: if storage_health.available {
                "healthy"
            } else {
                "degraded"
            }
            .to_string(),
            storage: storage_health,
            policy: PolicyInfo {
                max_size: policy.max_size,
                default_lifetime: policy.default_lifetime,
                allowed_mime_types: policy.mime_types.clone(),
            },
            metrics: SystemMetrics {
                cpu_usage_percent: sys.global_cpu_usage(),
                memory_used_bytes: memory_used,
                memory_total_bytes: memory_total,
                memory_usage_percent,
            },
        })
    }
}
