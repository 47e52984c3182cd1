//! Fieldpulse kernel - simulation de télémétrie terrain + API dashboard
//!
//! Processus unique de démo : un store in-memory (documents actifs, géo,
//! logs capteurs, alertes bornées), un simulateur cadencé qui l'alimente,
//! un moniteur de commandes pour l'observabilité, et l'API REST qui sert
//! le tout au frontend carte.

pub mod bounded;
pub mod config;
pub mod http;
pub mod models;
pub mod monitor;
pub mod search;
pub mod sessions;
pub mod simulator;
pub mod state;
pub mod store;
