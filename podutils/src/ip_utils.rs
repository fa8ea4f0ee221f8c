use std::net::UdpSocket;

/// Devine l'adresse IP locale de la machine.
///
/// Ouvre un socket UDP vers un serveur DNS public (8.8.8.8) pour demander au
/// système quelle interface serait utilisée pour une connexion sortante, puis
/// lit l'adresse locale du socket. UDP étant sans connexion, aucun paquet
/// n'est réellement émis.
///
/// Retourne `"127.0.0.1"` si aucune interface ne peut être déterminée.
pub fn guess_local_ip() -> String {
    match UdpSocket::bind("0.0.0.0:0") {
        Ok(socket) => {
            if socket.connect("8.8.8.8:80").is_ok() {
                if let Ok(local_addr) = socket.local_addr() {
                    return local_addr.ip().to_string();
                }
            }
            "127.0.0.1".to_string()
        }
        Err(_) => "127.0.0.1".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    #[test]
    fn guess_local_ip_returns_valid_ip() {
        let ip = guess_local_ip();
        assert!(ip.parse::<IpAddr>().is_ok(), "should return a parsable IP");
    }

    #[test]
    fn guess_local_ip_is_ipv4() {
        let ip = guess_local_ip();
        let parsed = ip.parse::<IpAddr>().unwrap();
        assert!(parsed.is_ipv4(), "should return an IPv4 address");
    }
}
