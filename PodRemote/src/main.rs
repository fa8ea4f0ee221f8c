use std::sync::Arc;

use podcontrol::Sl4aPlayer;
use podplaylist::api::{PlayerApiState, player_api_router};
use podplaylist::openapi::ApiDoc;
use podplaylist::{MusicLibrary, PlayQueue};
use podserver::Server;
use rust_embed::RustEmbed;
use tracing::info;
use utoipa::OpenApi;

/// Interface web embarquée (une page, servie à la racine).
#[derive(RustEmbed, Clone)]
#[folder = "webapp"]
struct Webapp;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    podserver::logs::init_logging();

    let config = podconfig::get_config();
    let music_dir = config.get_music_dir()?;
    let extensions = config.get_audio_extensions();

    // ========== PHASE 1 : Device ==========
    info!("📱 Connecting to the phone media facade...");
    let device = Arc::new(Sl4aPlayer::new(
        config.get_device_host(),
        config.get_device_port(),
        config.get_device_handshake(),
    ));

    // La construction arrête le lecteur : on part d'un état connu.
    let queue = PlayQueue::new(device, &music_dir, extensions.clone())?;
    let library = Arc::new(MusicLibrary::new(&music_dir, extensions));
    info!(music_dir = %music_dir, "✅ Play queue ready");

    // ========== PHASE 2 : Serveur HTTP ==========
    let mut server = Server::new_configured();

    server
        .add_route("/info", || async {
            serde_json::json!({
                "name": "PodRemote",
                "version": env!("CARGO_PKG_VERSION"),
            })
        })
        .await;

    let api_state = PlayerApiState {
        queue: queue.clone(),
        library,
    };
    server
        .add_openapi(player_api_router(api_state), ApiDoc::openapi(), "player")
        .await;

    server.add_spa::<Webapp>("/").await;

    let server_info = server.info();
    info!(
        "✅ Player API ready at http://{}:{}/api/player",
        server_info.base_url, server_info.http_port
    );

    server.start().await;
    server.wait().await;

    // Arrêt : annuler une éventuelle avance automatique en vol
    queue.shutdown().await;
    info!("PodRemote stopped");

    Ok(())
}
