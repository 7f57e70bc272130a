//! In-process HAP accessory for exercising the controller without real
//! hardware: pair-setup, pair-verify, the framed session, characteristic
//! reads/writes, pairing admin, and pushed events.

use bytes::{Buf, BytesMut};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::PairingResponder;
use crate::error::Result;
use crate::net::secure::{DecryptHalf, EncryptHalf, SessionKeys};
use crate::protocol::tlv8::{Decoder, Encoder, Tag, methods, states};
use crate::storage::Pairing;
use crate::types::DnssdEntry;

/// Configuration for the mock accessory
#[derive(Debug, Clone)]
pub struct MockAccessoryConfig {
    /// Accessory identifier (doubles as the mDNS instance name)
    pub name: String,
    /// Setup pin expected during pair-setup
    pub pin: String,
    /// Tree served at `/accessories`; long-form type UUIDs by default so
    /// clients exercise canonicalisation
    pub accessories: Value,
}

impl Default for MockAccessoryConfig {
    fn default() -> Self {
        Self {
            name: "Acme Light 1A2B".to_string(),
            pin: "031-45-154".to_string(),
            accessories: json!({
                "accessories": [{
                    "aid": 1,
                    "services": [
                        {
                            "iid": 1,
                            "type": "0000003E-0000-1000-8000-0026BB765291",
                            "characteristics": [
                                {
                                    "iid": 2,
                                    "type": "00000023-0000-1000-8000-0026BB765291",
                                    "value": "Acme Light",
                                    "perms": ["pr"],
                                    "format": "string"
                                },
                                {
                                    "iid": 3,
                                    "type": "00000014-0000-1000-8000-0026BB765291",
                                    "perms": ["pw"],
                                    "format": "bool"
                                }
                            ]
                        },
                        {
                            "iid": 9,
                            "type": "00000043-0000-1000-8000-0026BB765291",
                            "primary": true,
                            "characteristics": [
                                {
                                    "iid": 10,
                                    "type": "00000025-0000-1000-8000-0026BB765291",
                                    "value": false,
                                    "perms": ["pr", "pw", "ev"],
                                    "format": "bool"
                                },
                                {
                                    "iid": 11,
                                    "type": "00000008-0000-1000-8000-0026BB765291",
                                    "value": 0,
                                    "perms": ["pr", "pw", "ev"],
                                    "format": "int"
                                }
                            ]
                        }
                    ]
                }]
            }),
        }
    }
}

/// One `PUT /characteristics` entry the accessory received
#[derive(Debug, Clone)]
pub struct ReceivedWrite {
    pub aid: u64,
    pub iid: u64,
    pub value: Option<Value>,
    pub events: Option<bool>,
}

struct MockState {
    config: MockAccessoryConfig,
    responder: StdMutex<PairingResponder>,
    values: StdMutex<HashMap<(u64, u64), Value>>,
    pairings: StdMutex<Vec<Pairing>>,
    writes: mpsc::UnboundedSender<ReceivedWrite>,
    // plaintext EVENT messages to the current verified connection
    event_tx: StdMutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    conn_cancel: StdMutex<CancellationToken>,
    // artificial delay before each response, for slow-accessory tests
    response_delay: StdMutex<Option<Duration>>,
}

/// The mock accessory server
pub struct MockAccessory {
    addr: SocketAddr,
    state: Arc<MockState>,
    accept_task: JoinHandle<()>,
}

impl MockAccessory {
    /// Bind to a loopback port and start serving. Returns the server and
    /// the stream of received characteristic writes.
    ///
    /// # Errors
    ///
    /// Returns error if the listener cannot bind
    pub async fn start(
        config: MockAccessoryConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ReceivedWrite>)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (writes_tx, writes_rx) = mpsc::unbounded_channel();
        let responder = PairingResponder::new(&config.name, &config.pin);

        let state = Arc::new(MockState {
            values: StdMutex::new(initial_values(&config.accessories)),
            responder: StdMutex::new(responder),
            pairings: StdMutex::new(Vec::new()),
            writes: writes_tx,
            event_tx: StdMutex::new(None),
            conn_cancel: StdMutex::new(CancellationToken::new()),
            response_delay: StdMutex::new(None),
            config,
        });

        let accept_state = Arc::clone(&state);
        let accept_task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let cancel = accept_state
                    .conn_cancel
                    .lock()
                    .expect("cancel lock")
                    .clone();
                tokio::spawn(serve_conn(stream, Arc::clone(&accept_state), cancel));
            }
        });

        Ok((
            Self {
                addr,
                state,
                accept_task,
            },
            writes_rx,
        ))
    }

    /// Bound address
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Accessory long-term public key
    #[must_use]
    pub fn accessory_ltpk(&self) -> [u8; 32] {
        self.state
            .responder
            .lock()
            .expect("responder lock")
            .accessory_ltpk()
    }

    /// Preload controller credentials so a fresh mock accepts pair-verify
    /// without a pair-setup (restart scenarios)
    pub fn set_controller(&self, controller_id: &str, controller_ltpk: &[u8]) {
        self.state
            .responder
            .lock()
            .expect("responder lock")
            .set_controller(controller_id, controller_ltpk);
    }

    /// A discovery record pointing at this server
    #[must_use]
    pub fn dnssd_entry(&self) -> DnssdEntry {
        DnssdEntry {
            name: self.state.config.name.clone(),
            hostname: "mock-accessory.local.".to_string(),
            port: self.addr.port(),
            addresses: vec![IpAddr::V4(Ipv4Addr::LOCALHOST)],
            interface: None,
            txt: HashMap::new(),
        }
    }

    /// Push an `EVENT/1.0` notification over the verified connection.
    /// Returns false when no verified connection exists.
    #[must_use]
    pub fn push_event(&self, aid: u64, iid: u64, value: &Value) -> bool {
        let body = json!({ "characteristics": [{ "aid": aid, "iid": iid, "value": value }] })
            .to_string();
        let message = format!(
            "EVENT/1.0 200 OK\r\nContent-Type: application/hap+json\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        self.state
            .event_tx
            .lock()
            .expect("event lock")
            .as_ref()
            .is_some_and(|tx| tx.send(message.into_bytes()).is_ok())
    }

    /// Delay every subsequent response by `delay` (None restores prompt
    /// replies). Responses stay in order, the accessory just gets slow.
    pub fn set_response_delay(&self, delay: Option<Duration>) {
        *self.state.response_delay.lock().expect("delay lock") = delay;
    }

    /// Drop every open connection (simulates a network cut); the listener
    /// keeps accepting new ones
    pub fn kill_connections(&self) {
        let mut guard = self.state.conn_cancel.lock().expect("cancel lock");
        guard.cancel();
        *guard = CancellationToken::new();
        self.state.event_tx.lock().expect("event lock").take();
    }

    /// Pairings currently registered with the accessory
    #[must_use]
    pub fn pairings(&self) -> Vec<Pairing> {
        self.state.pairings.lock().expect("pairings lock").clone()
    }
}

impl Drop for MockAccessory {
    fn drop(&mut self) {
        self.accept_task.abort();
        self.state
            .conn_cancel
            .lock()
            .expect("cancel lock")
            .cancel();
    }
}

fn initial_values(tree: &Value) -> HashMap<(u64, u64), Value> {
    let mut values = HashMap::new();
    let Some(accessories) = tree.get("accessories").and_then(Value::as_array) else {
        return values;
    };
    for accessory in accessories {
        let Some(aid) = accessory.get("aid").and_then(Value::as_u64) else {
            continue;
        };
        let services = accessory
            .get("services")
            .and_then(Value::as_array)
            .into_iter()
            .flatten();
        for service in services {
            let characteristics = service
                .get("characteristics")
                .and_then(Value::as_array)
                .into_iter()
                .flatten();
            for characteristic in characteristics {
                if let (Some(iid), Some(value)) = (
                    characteristic.get("iid").and_then(Value::as_u64),
                    characteristic.get("value"),
                ) {
                    values.insert((aid, iid), value.clone());
                }
            }
        }
    }
    values
}

struct MockRequest {
    method: String,
    path: String,
    body: Vec<u8>,
}

// Drains one complete request from the front of `buf`, if present
fn parse_request(buf: &mut Vec<u8>) -> Option<MockRequest> {
    let header_end = buf.windows(4).position(|w| w == b"\r\n\r\n")?;
    let header_str = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = header_str.split("\r\n");

    let start_line = lines.next()?;
    let mut parts = start_line.split(' ');
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut content_length = 0usize;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let total = header_end + 4 + content_length;
    if buf.len() < total {
        return None;
    }

    let body = buf[header_end + 4..total].to_vec();
    buf.drain(..total);
    Some(MockRequest { method, path, body })
}

fn http_response(status: u16, reason: &str, content_type: Option<&str>, body: &[u8]) -> Vec<u8> {
    let mut head = format!("HTTP/1.1 {status} {reason}\r\n");
    if let Some(ct) = content_type {
        head.push_str(&format!("Content-Type: {ct}\r\n"));
    }
    if !body.is_empty() {
        head.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    head.push_str("\r\n");
    let mut out = head.into_bytes();
    out.extend_from_slice(body);
    out
}

async fn serve_conn(stream: TcpStream, state: Arc<MockState>, cancel: CancellationToken) {
    let (mut reader, mut writer) = stream.into_split();

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let writer_task = tokio::spawn(async move {
        while let Some(bytes) = out_rx.recv().await {
            if writer.write_all(&bytes).await.is_err() {
                return;
            }
        }
    });

    let (ev_tx, mut ev_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let mut secured: Option<(EncryptHalf, DecryptHalf)> = None;
    let mut wire_buf = BytesMut::new();
    let mut plain_buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,

            Some(event_plain) = ev_rx.recv() => {
                let Some((encrypt, _)) = &mut secured else { continue };
                match encrypt.encrypt(&event_plain) {
                    Ok(wire) => {
                        let _ = out_tx.send(wire);
                    }
                    Err(_) => break,
                }
            }

            result = reader.read(&mut chunk) => {
                let n = match result {
                    Ok(0) | Err(_) => break,
                    Ok(n) => n,
                };

                match &mut secured {
                    None => plain_buf.extend_from_slice(&chunk[..n]),
                    Some((_, decrypt)) => {
                        wire_buf.extend_from_slice(&chunk[..n]);
                        loop {
                            match decrypt.decrypt_batch(&wire_buf) {
                                Ok(Some((plain, consumed))) => {
                                    plain_buf.extend_from_slice(&plain);
                                    wire_buf.advance(consumed);
                                }
                                Ok(None) => break,
                                Err(_) => return,
                            }
                        }
                    }
                }

                while let Some(request) = parse_request(&mut plain_buf) {
                    let (response, shared) = handle_request(&state, &request);

                    let delay = *state.response_delay.lock().expect("delay lock");
                    if let Some(delay) = delay {
                        tokio::time::sleep(delay).await;
                    }

                    match &mut secured {
                        None => {
                            let _ = out_tx.send(response);
                        }
                        Some((encrypt, _)) => match encrypt.encrypt(&response) {
                            Ok(wire) => {
                                let _ = out_tx.send(wire);
                            }
                            Err(_) => return,
                        },
                    }

                    // verify complete: everything after the M4 reply is sealed,
                    // with the accessory's directions mirroring the controller's
                    if let Some(shared) = shared {
                        let Ok(keys) = SessionKeys::from_shared_secret(&shared) else {
                            return;
                        };
                        let mirrored = SessionKeys {
                            encrypt_key: keys.decrypt_key,
                            decrypt_key: keys.encrypt_key,
                        };
                        let Ok((encrypt, decrypt)) = mirrored.split() else {
                            return;
                        };
                        secured = Some((encrypt, decrypt));
                        *state.event_tx.lock().expect("event lock") = Some(ev_tx.clone());
                    }
                }
            }
        }
    }

    writer_task.abort();
}

fn handle_request(state: &Arc<MockState>, request: &MockRequest) -> (Vec<u8>, Option<[u8; 32]>) {
    let path = request.path.split('?').next().unwrap_or("");

    match (request.method.as_str(), path) {
        ("POST", "/pair-setup") => {
            let mut responder = state.responder.lock().expect("responder lock");
            match responder.handle_pair_setup(&request.body) {
                Ok(reply) => {
                    // register the new controller once M5 told us who it is
                    if let (Some(id), Some(ltpk)) =
                        (responder.controller_id(), responder.controller_ltpk())
                    {
                        let mut pairings = state.pairings.lock().expect("pairings lock");
                        if !pairings.iter().any(|p| p.id == id) {
                            pairings.push(Pairing {
                                id,
                                public_key: ltpk,
                                permission: 1,
                            });
                        }
                    }
                    (
                        http_response(200, "OK", Some("application/pairing+tlv8"), &reply),
                        None,
                    )
                }
                Err(_) => (http_response(400, "Bad Request", None, &[]), None),
            }
        }

        ("POST", "/pair-verify") => {
            let mut responder = state.responder.lock().expect("responder lock");
            match responder.handle_pair_verify(&request.body) {
                Ok((reply, shared)) => (
                    http_response(200, "OK", Some("application/pairing+tlv8"), &reply),
                    shared,
                ),
                Err(_) => (http_response(400, "Bad Request", None, &[]), None),
            }
        }

        ("POST", "/pairings") => (handle_pairings(state, &request.body), None),

        ("GET", "/accessories") => {
            let body = state.config.accessories.to_string();
            (
                http_response(200, "OK", Some("application/hap+json"), body.as_bytes()),
                None,
            )
        }

        ("GET", "/characteristics") => {
            let query = request.path.split('?').nth(1).unwrap_or("");
            let ids = query.strip_prefix("id=").unwrap_or("");
            let values = state.values.lock().expect("values lock");
            let mut entries = Vec::new();
            for pair in ids.split(',').filter(|s| !s.is_empty()) {
                let mut parts = pair.split('.');
                let (Some(aid), Some(iid)) = (
                    parts.next().and_then(|s| s.parse::<u64>().ok()),
                    parts.next().and_then(|s| s.parse::<u64>().ok()),
                ) else {
                    continue;
                };
                let value = values.get(&(aid, iid)).cloned().unwrap_or(Value::Null);
                entries.push(json!({ "aid": aid, "iid": iid, "value": value }));
            }
            let body = json!({ "characteristics": entries }).to_string();
            (
                http_response(200, "OK", Some("application/hap+json"), body.as_bytes()),
                None,
            )
        }

        ("PUT", "/characteristics") => {
            #[derive(serde::Deserialize)]
            struct Entry {
                aid: u64,
                iid: u64,
                #[serde(default)]
                value: Option<Value>,
                #[serde(rename = "ev", default)]
                events: Option<bool>,
            }
            #[derive(serde::Deserialize)]
            struct Payload {
                characteristics: Vec<Entry>,
            }

            let Ok(payload) = serde_json::from_slice::<Payload>(&request.body) else {
                return (http_response(400, "Bad Request", None, &[]), None);
            };
            for entry in payload.characteristics {
                if let Some(value) = &entry.value {
                    state
                        .values
                        .lock()
                        .expect("values lock")
                        .insert((entry.aid, entry.iid), value.clone());
                }
                let _ = state.writes.send(ReceivedWrite {
                    aid: entry.aid,
                    iid: entry.iid,
                    value: entry.value,
                    events: entry.events,
                });
            }
            (http_response(204, "No Content", None, &[]), None)
        }

        _ => (http_response(404, "Not Found", None, &[]), None),
    }
}

fn handle_pairings(state: &Arc<MockState>, body: &[u8]) -> Vec<u8> {
    let Ok(tlv) = Decoder::decode(body) else {
        return http_response(400, "Bad Request", None, &[]);
    };
    let method = tlv.get_byte(Tag::Method).unwrap_or(0xFF);

    let reply = match method {
        methods::ADD_PAIRING => {
            let id = tlv
                .get(Tag::Identifier)
                .map(|b| String::from_utf8_lossy(b).to_string())
                .unwrap_or_default();
            let public_key = tlv.get(Tag::PublicKey).unwrap_or(&[]).to_vec();
            let permission = tlv.get_byte(Tag::Permissions).unwrap_or(0);
            let mut pairings = state.pairings.lock().expect("pairings lock");
            if !pairings.iter().any(|p| p.id == id) {
                pairings.push(Pairing {
                    id,
                    public_key,
                    permission,
                });
            }
            Encoder::new().add_state(states::M2).build()
        }

        methods::DELETE_PAIRING => {
            let id = tlv
                .get(Tag::Identifier)
                .map(|b| String::from_utf8_lossy(b).to_string())
                .unwrap_or_default();
            state
                .pairings
                .lock()
                .expect("pairings lock")
                .retain(|p| p.id != id);
            Encoder::new().add_state(states::M2).build()
        }

        methods::LIST_PAIRINGS => {
            let pairings = state.pairings.lock().expect("pairings lock");
            let mut encoder = Encoder::new().add_state(states::M2);
            for (i, pairing) in pairings.iter().enumerate() {
                if i > 0 {
                    encoder = encoder.add_separator();
                }
                encoder = encoder
                    .add(Tag::Identifier, pairing.id.as_bytes())
                    .add(Tag::PublicKey, &pairing.public_key)
                    .add_byte(Tag::Permissions, pairing.permission);
            }
            encoder.build()
        }

        _ => Encoder::new()
            .add_state(states::M2)
            .add_byte(Tag::Error, 0x01)
            .build(),
    };

    http_response(200, "OK", Some("application/pairing+tlv8"), &reply)
}
