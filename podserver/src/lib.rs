//! # podserver - Serveur web haut niveau basé sur Axum
//!
//! Cette crate fournit une abstraction simple pour créer le serveur HTTP de
//! PodRemote avec Axum, en cachant la configuration et le routage.
//!
//! ## Fonctionnalités
//!
//! - **Routes JSON simples** : endpoints API avec `add_route()`
//! - **Handlers personnalisés** : `add_handler_with_state()`, `add_router()`
//! - **Applications embarquées** : `add_spa()` avec `RustEmbed`
//! - **Documentation API** : OpenAPI/Swagger automatique avec `add_openapi()`
//! - **Arrêt gracieux** : gestion propre de Ctrl+C
//! - **Logging** : [`logs::init_logging`] branche tracing sur la
//!   configuration (niveau minimal, console)
//!
//! ## Exemple
//!
//! ```rust,no_run
//! use podserver::Server;
//!
//! #[tokio::main]
//! async fn main() {
//!     podserver::logs::init_logging();
//!
//!     let mut server = Server::new("MyAPI", "http://localhost:8080", 8080);
//!     server.add_route("/api/status", || async {
//!         serde_json::json!({"status": "ok"})
//!     }).await;
//!
//!     server.start().await;
//!     server.wait().await;
//! }
//! ```

pub mod logs;
pub mod server;

pub use server::{Server, ServerInfo};
