//! Client JSON-RPC pour le facade SL4A du téléphone.
//!
//! Le facade écoute en TCP et parle un JSON-RPC minimal ligne par ligne :
//! une requête `{"id":n,"method":m,"params":[...]}` terminée par `\n`,
//! une réponse `{"id":n,"result":...,"error":...}` sur une ligne. Un
//! handshake optionnel (`_authenticate`) est exigé quand le facade a été
//! lancé avec un secret.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde_json::{Value, json};
use tracing::debug;

use crate::device::{DeviceInfo, MediaDevice};
use crate::errors::{ControlError, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 3;

/// Client TCP du facade SL4A.
///
/// La connexion est ouverte paresseusement au premier appel et réutilisée
/// ensuite; une connexion devenue invalide est rouverte une fois avant de
/// remonter l'erreur.
pub struct Sl4aClient {
    host: String,
    port: u16,
    handshake: Option<String>,
    timeout: Duration,
    conn: Mutex<Option<BufReader<TcpStream>>>,
    next_id: AtomicU64,
}

impl Sl4aClient {
    pub fn new(host: impl Into<String>, port: u16, handshake: Option<String>) -> Self {
        Self {
            host: host.into(),
            port,
            handshake,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            conn: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    /// Appelle `method` avec `params` et retourne le champ `result`.
    pub fn call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let mut guard = self.conn.lock().unwrap();

        match self.call_on(&mut guard, method, &params) {
            Err(ControlError::Connection(err)) => {
                debug!(method, error = %err, "SL4A call failed, reconnecting once");
                *guard = None;
                self.call_on(&mut guard, method, &params)
            }
            Err(ControlError::ConnectionClosed) => {
                debug!(method, "SL4A connection closed, reconnecting once");
                *guard = None;
                self.call_on(&mut guard, method, &params)
            }
            other => other,
        }
    }

    fn call_on(
        &self,
        conn: &mut Option<BufReader<TcpStream>>,
        method: &str,
        params: &[Value],
    ) -> Result<Value> {
        if conn.is_none() {
            *conn = Some(self.connect()?);
        }
        let reader = conn.as_mut().expect("connection just established");

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let frame = request_frame(id, method, params);

        let stream = reader.get_mut();
        stream.write_all(frame.as_bytes())?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(ControlError::ConnectionClosed);
        }

        decode_reply(method, &line)
    }

    fn connect(&self) -> Result<BufReader<TcpStream>> {
        let addr = (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                ControlError::Connection(std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    format!("cannot resolve {}:{}", self.host, self.port),
                ))
            })?;

        let stream = TcpStream::connect_timeout(&addr, self.timeout)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;
        debug!(host = %self.host, port = self.port, "Connected to SL4A facade");

        let mut reader = BufReader::new(stream);

        if let Some(secret) = &self.handshake {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let frame = request_frame(id, "_authenticate", &[json!(secret)]);
            reader.get_mut().write_all(frame.as_bytes())?;

            let mut line = String::new();
            if reader.read_line(&mut line)? == 0 {
                return Err(ControlError::ConnectionClosed);
            }
            if decode_reply("_authenticate", &line).is_err() {
                return Err(ControlError::HandshakeRejected);
            }
        }

        Ok(reader)
    }
}

/// Construit une trame de requête (une ligne JSON terminée par `\n`).
fn request_frame(id: u64, method: &str, params: &[Value]) -> String {
    let mut frame = json!({
        "id": id,
        "method": method,
        "params": params,
    })
    .to_string();
    frame.push('\n');
    frame
}

/// Décode une ligne de réponse et en extrait le champ `result`.
fn decode_reply(method: &str, line: &str) -> Result<Value> {
    let reply: Value = serde_json::from_str(line.trim_end())?;

    match reply.get("error") {
        None | Some(Value::Null) => {}
        Some(err) => {
            return Err(ControlError::Rpc(method.to_string(), err.to_string()));
        }
    }

    Ok(reply.get("result").cloned().unwrap_or(Value::Null))
}

/// Lecteur média du téléphone, piloté via le facade SL4A.
pub struct Sl4aPlayer {
    client: Sl4aClient,
}

impl Sl4aPlayer {
    pub fn new(host: impl Into<String>, port: u16, handshake: Option<String>) -> Self {
        Self {
            client: Sl4aClient::new(host, port, handshake),
        }
    }
}

impl MediaDevice for Sl4aPlayer {
    fn play(&self, url: &str) -> Result<()> {
        self.client.call("mediaPlay", vec![json!(url)])?;
        Ok(())
    }

    fn resume(&self) -> Result<()> {
        self.client.call("mediaPlayStart", vec![])?;
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.client.call("mediaPlayPause", vec![])?;
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        self.client.call("mediaPlayClose", vec![])?;
        Ok(())
    }

    fn info(&self) -> Result<DeviceInfo> {
        let result = self.client.call("mediaPlayInfo", vec![])?;
        DeviceInfo::from_value(&result)
    }

    fn volume(&self) -> Result<u16> {
        let result = self.client.call("getMediaVolume", vec![])?;
        result
            .as_u64()
            .map(|v| v as u16)
            .ok_or_else(|| ControlError::BadValue("volume", result.to_string()))
    }

    fn set_volume(&self, volume: u16) -> Result<()> {
        self.client.call("setMediaVolume", vec![json!(volume)])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_frame_is_one_json_line() {
        let frame = request_frame(7, "mediaPlay", &[json!("file:///a.mp3")]);
        assert!(frame.ends_with('\n'));

        let value: Value = serde_json::from_str(frame.trim_end()).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["method"], "mediaPlay");
        assert_eq!(value["params"][0], "file:///a.mp3");
    }

    #[test]
    fn decode_reply_extracts_result() {
        let result =
            decode_reply("mediaPlayInfo", "{\"id\":1,\"result\":{\"loaded\":false},\"error\":null}\n")
                .unwrap();
        assert_eq!(result["loaded"], false);
    }

    #[test]
    fn decode_reply_surfaces_rpc_error() {
        let err = decode_reply(
            "mediaPlay",
            "{\"id\":2,\"result\":null,\"error\":\"no such file\"}",
        )
        .unwrap_err();
        assert!(matches!(err, ControlError::Rpc(method, _) if method == "mediaPlay"));
    }

    #[test]
    fn decode_reply_missing_result_is_null() {
        let result = decode_reply("mediaPlayClose", "{\"id\":3}").unwrap();
        assert_eq!(result, Value::Null);
    }

    #[test]
    fn decode_reply_rejects_garbage() {
        assert!(decode_reply("mediaPlayInfo", "not json at all").is_err());
    }
}
