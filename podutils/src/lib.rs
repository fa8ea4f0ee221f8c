/// Utilitaires partagés du workspace PodRemote.
///
/// Pour l'instant un seul service : deviner l'adresse IP locale utilisée
/// pour construire l'URL de base annoncée par le serveur.
mod ip_utils;

pub use ip_utils::guess_local_ip;
