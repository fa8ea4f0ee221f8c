//! Initialisation du logging.
//!
//! Branche tracing-subscriber sur la configuration : niveau minimal depuis
//! `logs.min_level`, sortie console désactivable via `logs.enable_console`.
//! La variable `RUST_LOG` garde la priorité quand elle est définie.

use podconfig::get_config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise le système de logging global.
///
/// À appeler une seule fois, avant toute autre initialisation (la lecture
/// de la configuration émet déjà des logs).
pub fn init_logging() {
    let config = get_config();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.get_log_min_level().to_lowercase()));

    if config.get_log_enable_console() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    } else {
        tracing_subscriber::registry().with(filter).init();
    }
}
