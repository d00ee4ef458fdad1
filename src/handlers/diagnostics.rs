use crate::{models::DiagnosticsResponse, state::AppState};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use std::sync::{Mutex, OnceLock};
use sysinfo::System;
use tracing::info;

static SYSTEM_MONITOR: OnceLock<Mutex<System>> = OnceLock::new();

/// Report session, document and host statistics
pub async fn diagnostics(
    State(app_state): State<Arc<AppState>>,
) -> (StatusCode, Json<DiagnosticsResponse>) {

    let (n_sessions, max_sessions, version, n_history, content_length, last_edit) = {
        let collab = app_state.collab.lock().await;
        (
            collab.sessions.len() as u32,
            collab.sessions.max_sessions() as u32,
            collab.document.version(),
            collab.document.history().len() as u32,
            collab.document.len() as u32,
            collab.document.history().back().map(|e| (e.issuer.clone(), e.applied_at)),
        )
    };
    let (last_editor, last_edit_at) = last_edit.unzip();

    // System stats
    let (cpu_usage, memory_alloc, memory_free, memory_total) = {
        let sys_lock = SYSTEM_MONITOR.get_or_init(|| {
            Mutex::new(System::new_all())
        });
        match sys_lock.lock() {
            Ok(mut sys) => {
                sys.refresh_cpu();
                sys.refresh_memory();
                (
                    sys.global_cpu_info().cpu_usage(),
                    sys.used_memory(),
                    sys.free_memory(),
                    sys.total_memory(),
                )
            }
            Err(_) => (0.0, 0, 0, 0)
        }
    };

    info!(
        "Diagnostics: CPU: {:.2}%, Mem: {}/{} MB (Free: {} MB), Sessions: {}/{}, Version: {}",
        cpu_usage,
        memory_alloc / 1024 / 1024,
        memory_total / 1024 / 1024,
        memory_free / 1024 / 1024,
        n_sessions,
        max_sessions,
        version
    );

    (
        StatusCode::OK,
        Json(DiagnosticsResponse {
            n_sessions,
            max_sessions,
            version,
            n_history,
            content_length,
            last_editor,
            last_edit_at,
            cpu_usage,
            memory_alloc,
            memory_total,
            memory_free,
        }),
    )
}
