// ==================== SESSION SWEEPER ====================
// Expired sessions are dropped lazily on lookup; this job clears the ones
// nobody asks for again so the map does not grow without bound.

use actix_web::web;
use tokio::time::{interval, Duration};

use crate::state::AppState;

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

pub fn start_session_sweeper(state: web::Data<AppState>, every: Duration) {
    log::info!("🧹 Starting session sweeper (every {}s)", every.as_secs());

    tokio::spawn(async move {
        let mut interval = interval(every);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            sweep(&state);
        }
    });
}

fn sweep(state: &AppState) -> usize {
    let removed = state.sessions.purge_expired();
    if removed > 0 {
        log::info!("🧹 Removed {} expired sessions ({} active)", removed, state.sessions.len());
    } else {
        log::debug!("🧹 No expired sessions ({} active)", state.sessions.len());
    }
    removed
}
