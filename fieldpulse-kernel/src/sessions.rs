/**
 * SESSIONS - Gestion des sessions utilisateur de la démo
 *
 * RÔLE : CRUD sessions avec TTL glissant (rafraîchi à chaque lecture),
 * liste des sessions actives et statistiques agrégées pour le dashboard.
 * Les entrées expirées sont purgées paresseusement lors des lectures.
 */

use crate::monitor::CommandMonitor;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Session {
    session_id: String,
    user_id: String,
    created_at: OffsetDateTime,
    last_activity: OffsetDateTime,
    expires_at: OffsetDateTime,
    user_data: serde_json::Value,
}

/// Vue API d'une session (timestamps RFC3339, TTL restant en secondes)
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub user_id: String,
    pub created_at: String,
    pub last_activity: String,
    pub status: &'static str,
    pub ttl: i64,
    pub user_data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionMetrics {
    pub total_active_sessions: usize,
    pub unique_users: usize,
    pub avg_session_duration_minutes: f64,
    pub sessions_by_user: HashMap<String, usize>,
}

#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
    monitor: CommandMonitor,
}

impl SessionManager {
    pub fn new(ttl_secs: u64, monitor: CommandMonitor) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::seconds(ttl_secs as i64),
            monitor,
        }
    }

    pub async fn create(&self, user_id: &str, user_data: serde_json::Value) -> String {
        let session_id = Uuid::new_v4().to_string();
        let now = OffsetDateTime::now_utc();
        let session = Session {
            session_id: session_id.clone(),
            user_id: user_id.to_string(),
            created_at: now,
            last_activity: now,
            expires_at: now + self.ttl,
            user_data,
        };

        self.monitor.record("session", "HSET", &format!("session:{session_id}"));
        self.monitor.record("session", "EXPIRE", &format!("session:{session_id}"));
        self.monitor.record("session", "ZADD", "sessions:active");

        self.sessions.write().await.insert(session_id.clone(), session);
        session_id
    }

    /// Lecture d'une session : rafraîchit le TTL et last_activity
    pub async fn get(&self, session_id: &str) -> Option<SessionView> {
        let now = OffsetDateTime::now_utc();
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(session_id)?;
        if session.expires_at <= now {
            sessions.remove(session_id);
            return None;
        }

        self.monitor.record("session", "HGETALL", &format!("session:{session_id}"));
        session.last_activity = now;
        session.expires_at = now + self.ttl;
        Some(to_view(session, now))
    }

    pub async fn delete(&self, session_id: &str) -> bool {
        self.monitor.record("session", "DEL", &format!("session:{session_id}"));
        self.monitor.record("session", "ZREM", "sessions:active");
        self.sessions.write().await.remove(session_id).is_some()
    }

    /// Sessions actives triées par date de création ; purge les expirées
    pub async fn active(&self) -> Vec<SessionView> {
        let now = OffsetDateTime::now_utc();
        self.monitor.record("session", "ZRANGE", "sessions:active");
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.expires_at > now);

        let mut views: Vec<SessionView> = sessions.values().map(|s| to_view(s, now)).collect();
        views.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        views
    }

    pub async fn metrics(&self) -> SessionMetrics {
        let active = self.active().await;
        let now = OffsetDateTime::now_utc();

        let mut sessions_by_user: HashMap<String, usize> = HashMap::new();
        let mut total_minutes = 0.0;
        {
            let sessions = self.sessions.read().await;
            for session in sessions.values() {
                *sessions_by_user.entry(session.user_id.clone()).or_insert(0) += 1;
                total_minutes += (now - session.created_at).whole_seconds() as f64 / 60.0;
            }
        }

        let count = active.len();
        SessionMetrics {
            total_active_sessions: count,
            unique_users: sessions_by_user.len(),
            avg_session_duration_minutes: if count > 0 {
                (total_minutes / count as f64 * 100.0).round() / 100.0
            } else {
                0.0
            },
            sessions_by_user,
        }
    }
}

fn to_view(session: &Session, now: OffsetDateTime) -> SessionView {
    SessionView {
        session_id: session.session_id.clone(),
        user_id: session.user_id.clone(),
        created_at: session.created_at.format(&Rfc3339).unwrap_or_default(),
        last_activity: session.last_activity.format(&Rfc3339).unwrap_or_default(),
        status: "active",
        ttl: (session.expires_at - now).whole_seconds().max(0),
        user_data: session.user_data.clone(),
    }
}

/// Sessions de démo créées au démarrage (mêmes profils que le dashboard)
pub async fn seed_demo_sessions(manager: &SessionManager) {
    let demo_users = [
        ("operator_1", "John Smith", "Field Operator", "Rig Alpha"),
        ("supervisor_1", "Sarah Johnson", "Field Supervisor", "Control Center"),
        ("engineer_1", "Mike Chen", "Drilling Engineer", "Rig Bravo"),
        ("technician_1", "Lisa Rodriguez", "Maintenance Tech", "Service Truck 001"),
    ];
    for (user_id, name, role, location) in demo_users {
        manager
            .create(
                user_id,
                serde_json::json!({ "name": name, "role": role, "location": location }),
            )
            .await;
    }
}
