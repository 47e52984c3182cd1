/**
 * COMMAND MONITOR - Journal de commandes store pour l'observabilité démo
 *
 * RÔLE : Trace chaque opération store émise par le backend (simulateur et
 * handlers API), taggée par contexte (dashboard, session, search, simulator),
 * avec compteurs lecture/écriture incrémentaux pour stats en O(1).
 *
 * FONCTIONNEMENT : buffer borné par contexte + compteurs maintenus à
 * l'insertion. Best-effort : ne bloque ni ne fait échouer l'opération
 * observée.
 */

use crate::bounded::BoundedLog;
use crate::state::{new_state, Shared};
use serde::Serialize;
use std::collections::HashMap;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Classification lecture/écriture d'une commande store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    Read,
    Write,
    Other,
}

impl CommandKind {
    pub fn classify(command: &str) -> Self {
        const READS: &[&str] = &[
            "GET", "HGET", "HGETALL", "XREAD", "XRANGE", "XREVRANGE", "ZRANGE", "ZREVRANGE",
            "GEORADIUS", "GEOPOS", "KEYS", "EXISTS", "TTL", "ZCARD", "FT.SEARCH", "FT.TAGVALS",
            "JSON.GET",
        ];
        const WRITES: &[&str] = &[
            "SET", "HSET", "XADD", "ZADD", "GEOADD", "INCR", "EXPIRE", "DEL", "ZREM", "DECR",
            "ZREMRANGEBYRANK", "JSON.SET",
        ];
        if READS.contains(&command) {
            CommandKind::Read
        } else if WRITES.contains(&command) {
            CommandKind::Write
        } else {
            CommandKind::Other
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandRecord {
    pub timestamp: String,
    pub command: String,
    pub key: String,
    #[serde(rename = "type")]
    pub kind: CommandKind,
    pub context: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CommandStats {
    pub read_count: u64,
    pub write_count: u64,
    pub total_count: u64,
    pub per_command: HashMap<String, u64>,
}

struct ContextLog {
    entries: BoundedLog<CommandRecord>,
    stats: CommandStats,
}

impl ContextLog {
    fn new(capacity: usize) -> Self {
        Self {
            entries: BoundedLog::new(capacity),
            stats: CommandStats::default(),
        }
    }
}

/// Handle clonable ; l'état vit derrière Arc + Mutex (verrou court, jamais
/// tenu pendant une opération store).
#[derive(Clone)]
pub struct CommandMonitor {
    contexts: Shared<HashMap<String, ContextLog>>,
    capacity: usize,
}

impl CommandMonitor {
    pub fn new(capacity: usize) -> Self {
        Self {
            contexts: new_state(HashMap::new()),
            capacity,
        }
    }

    /// Trace une commande. Fire-and-forget : aucune erreur possible.
    pub fn record(&self, context: &str, command: &str, key: &str) {
        let kind = CommandKind::classify(command);
        let record = CommandRecord {
            timestamp: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            command: command.to_string(),
            key: key.to_string(),
            kind,
            context: context.to_string(),
        };

        let mut contexts = self.contexts.lock();
        let log = contexts
            .entry(context.to_string())
            .or_insert_with(|| ContextLog::new(self.capacity));
        match kind {
            CommandKind::Read => log.stats.read_count += 1,
            CommandKind::Write => log.stats.write_count += 1,
            CommandKind::Other => {}
        }
        log.stats.total_count += 1;
        *log.stats.per_command.entry(command.to_string()).or_insert(0) += 1;
        log.entries.push(record);
    }

    pub fn stats(&self, context: &str) -> CommandStats {
        self.contexts
            .lock()
            .get(context)
            .map(|log| log.stats.clone())
            .unwrap_or_default()
    }

    /// Les `limit` commandes les plus récentes, de la plus neuve à la plus vieille
    pub fn recent(&self, context: &str, limit: usize) -> Vec<CommandRecord> {
        self.contexts
            .lock()
            .get(context)
            .map(|log| log.entries.iter_rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Remet à zéro le journal et les compteurs d'un contexte
    pub fn clear(&self, context: &str) {
        if let Some(log) = self.contexts.lock().get_mut(context) {
            log.entries.clear();
            log.stats = CommandStats::default();
        }
    }

    pub fn contexts(&self) -> Vec<String> {
        let mut names: Vec<String> = self.contexts.lock().keys().cloned().collect();
        names.sort();
        names
    }
}
