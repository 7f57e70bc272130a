//! One TCP connection per device, transparent before the session is
//! installed and AEAD-framed after.
//!
//! Pre-session the connection is driven synchronously: one request out, one
//! response back, under the request lock. After [`Connection::upgrade`] a
//! reader task owns the read half and the decrypt counter, demultiplexing
//! `HTTP/1.1` responses (delivered to the single pending request) from
//! `EVENT/1.0` notifications (handed to the installed signal handler).
//! Writers share the write half and the encrypt counter behind a mutex, so
//! the two counters are never touched from both sides.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;

use crate::error::{HapError, Result};
use crate::net::secure::{DecryptHalf, SessionKeys, TAG_LENGTH};
use crate::protocol::http::{HttpCodec, Request, Response, ResponseKind};

use super::secure::EncryptHalf;

/// Out-of-band notifications from the reader task
#[derive(Debug)]
pub enum ConnectionSignal {
    /// An `EVENT/1.0` message arrived
    Event(Response),
    /// An HTTP response arrived with no request waiting for it
    OrphanResponse(Response),
    /// The reader stopped: remote close, read error, or AEAD failure
    Closed,
}

/// Handler invoked on the reader task. Must not block and must not issue
/// requests on the same connection; hand work off to a queue instead.
pub type SignalHandler = Box<dyn Fn(ConnectionSignal) + Send + Sync>;

enum Transport {
    Plain(TcpStream),
    Secured {
        writer: OwnedWriteHalf,
        encrypt: EncryptHalf,
    },
    Closed,
}

// Request/response accounting for the secured stream. Responses arrive in
// the order the requests were written, so each written request gets a
// generation number and the reader counts responses off the wire; a
// response whose generation no longer has a waiter (the request timed out)
// is discarded instead of being handed to the next caller.
#[derive(Default)]
struct PendingState {
    // requests written so far; the latest one has this generation
    issued: u64,
    // responses consumed off the wire so far
    answered: u64,
    waiter: Option<(u64, oneshot::Sender<Response>)>,
}

/// A device connection
pub struct Connection {
    peer: SocketAddr,
    request_timeout: Duration,
    // serializes write + await-response; one request in flight per connection
    request_lock: Mutex<()>,
    transport: Mutex<Transport>,
    pending: Arc<StdMutex<PendingState>>,
    reader: StdMutex<Option<JoinHandle<()>>>,
    closed: Arc<AtomicBool>,
}

impl Connection {
    /// Dial the candidate addresses in order, with a per-attempt timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HapError::NotReachable`] when every candidate fails
    pub async fn dial(
        device_name: &str,
        candidates: &[SocketAddr],
        dial_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self> {
        for addr in candidates {
            match tokio::time::timeout(dial_timeout, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => {
                    tracing::debug!(device = device_name, %addr, "connected");
                    return Ok(Self::from_stream(stream, *addr, request_timeout));
                }
                Ok(Err(e)) => {
                    tracing::debug!(device = device_name, %addr, error = %e, "dial failed");
                }
                Err(_) => {
                    tracing::debug!(device = device_name, %addr, "dial timed out");
                }
            }
        }
        Err(HapError::NotReachable(device_name.to_string()))
    }

    /// Wrap an already-connected stream
    #[must_use]
    pub fn from_stream(stream: TcpStream, peer: SocketAddr, request_timeout: Duration) -> Self {
        Self {
            peer,
            request_timeout,
            request_lock: Mutex::new(()),
            transport: Mutex::new(Transport::Plain(stream)),
            pending: Arc::new(StdMutex::new(PendingState::default())),
            reader: StdMutex::new(None),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Remote address
    #[must_use]
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Whether the AEAD session has been installed
    pub async fn is_secured(&self) -> bool {
        matches!(*self.transport.lock().await, Transport::Secured { .. })
    }

    /// Whether the connection has been torn down
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Send one request and await its response, FIFO with respect to other
    /// callers. Times out after the configured request deadline; the
    /// connection survives a timeout and late bytes are discarded.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, timeout, or teardown
    pub async fn round_trip(&self, request: &Request) -> Result<Response> {
        let _guard = self.request_lock.lock().await;

        if self.is_closed() {
            return Err(HapError::ConnectionClosed);
        }

        let encoded = request.encode();

        // write under the transport lock; the await on the response happens
        // after it is released so the reader can deliver concurrently
        let (generation, rx) = {
            let mut transport = self.transport.lock().await;
            match &mut *transport {
                Transport::Plain(stream) => {
                    // pre-session: the whole exchange runs under the
                    // transport lock, nothing else can be on the wire
                    let exchange = async {
                        stream.write_all(&encoded).await?;
                        stream.flush().await?;
                        Self::read_plain_response(stream).await
                    };
                    return match tokio::time::timeout(self.request_timeout, exchange).await {
                        Ok(result) => result,
                        Err(_) => Err(HapError::Timeout),
                    };
                }

                Transport::Secured { writer, encrypt } => {
                    let framed = match encrypt.encrypt(&encoded) {
                        Ok(framed) => framed,
                        Err(e) => return Err(e.into()),
                    };

                    let (tx, rx) = oneshot::channel();
                    let generation = {
                        let mut pending = self.pending.lock().expect("pending lock");
                        debug_assert!(pending.waiter.is_none(), "request lock admits one caller");
                        pending.issued += 1;
                        pending.waiter = Some((pending.issued, tx));
                        pending.issued
                    };

                    let written = async {
                        writer.write_all(&framed).await?;
                        writer.flush().await
                    }
                    .await;
                    if let Err(e) = written {
                        // nothing usable can follow a broken framed write;
                        // the reader notices the dead socket and closes
                        self.forget_waiter(generation);
                        return Err(e.into());
                    }
                    (generation, rx)
                }

                Transport::Closed => return Err(HapError::ConnectionClosed),
            }
        };

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(HapError::ConnectionClosed),
            Err(_) => {
                // drop our waiter; the reader discards the late response
                // once it comes off the wire
                self.forget_waiter(generation);
                Err(HapError::Timeout)
            }
        }
    }

    // Remove the waiter for `generation` if it is still installed. The
    // generation stays issued, so the reader knows a response is still owed
    // on the wire and must be skipped.
    fn forget_waiter(&self, generation: u64) {
        let mut pending = self.pending.lock().expect("pending lock");
        if pending
            .waiter
            .as_ref()
            .is_some_and(|(g, _)| *g == generation)
        {
            pending.waiter = None;
        }
    }

    async fn read_plain_response(stream: &mut TcpStream) -> Result<Response> {
        let mut codec = HttpCodec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).await?;
            if n == 0 {
                return Err(HapError::ConnectionClosed);
            }
            codec.feed(&buf[..n])?;
            if let Some(response) = codec.decode()? {
                return Ok(response);
            }
        }
    }

    /// Install the session keys and start the demultiplexing reader task.
    /// From here on all traffic is framed and sealed.
    ///
    /// # Errors
    ///
    /// Returns error if called twice or after close
    pub async fn upgrade(&self, keys: &SessionKeys, handler: SignalHandler) -> Result<()> {
        let mut transport = self.transport.lock().await;
        let stream = match std::mem::replace(&mut *transport, Transport::Closed) {
            Transport::Plain(stream) => stream,
            other => {
                *transport = other;
                return Err(HapError::Protocol(
                    "connection already secured or closed".to_string(),
                ));
            }
        };

        let (encrypt, decrypt) = keys.split()?;
        let (read_half, write_half) = stream.into_split();
        *transport = Transport::Secured {
            writer: write_half,
            encrypt,
        };
        drop(transport);

        let pending = Arc::clone(&self.pending);
        let closed = Arc::clone(&self.closed);
        let peer = self.peer;
        let handle = tokio::spawn(async move {
            let reason = reader_loop(read_half, decrypt, &pending, handler.as_ref()).await;
            match reason {
                Ok(()) => tracing::debug!(%peer, "connection closed by remote"),
                Err(ref e) => tracing::debug!(%peer, error = %e, "reader stopped"),
            }
            closed.store(true, Ordering::SeqCst);
            // wake a waiting request, then tell the owner
            pending.lock().expect("pending lock").waiter = None;
            handler(ConnectionSignal::Closed);
        });
        *self.reader.lock().expect("reader lock") = Some(handle);

        Ok(())
    }

    /// Tear the connection down. Idempotent; pending requests fail with
    /// [`HapError::ConnectionClosed`].
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.reader.lock().expect("reader lock").take() {
            handle.abort();
        }
        *self.transport.lock().await = Transport::Closed;
        self.pending.lock().expect("pending lock").waiter = None;
        tracing::debug!(peer = %self.peer, "connection closed");
    }
}

// The reader owns the decrypt counter: records are opened in arrival order
// and their plaintext fed to the codec, which reassembles whole messages
// regardless of how the accessory framed them.
async fn reader_loop(
    mut read_half: OwnedReadHalf,
    mut decrypt: DecryptHalf,
    pending: &StdMutex<PendingState>,
    handler: &(dyn Fn(ConnectionSignal) + Send + Sync),
) -> Result<()> {
    let mut codec = HttpCodec::new();

    loop {
        while let Some(message) = codec.decode()? {
            dispatch(message, pending, handler);
        }

        let mut len_bytes = [0u8; 2];
        match read_half.read_exact(&mut len_bytes).await {
            Ok(_) => {}
            // clean EOF between records
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        let length = u16::from_le_bytes(len_bytes) as usize;
        let mut record = vec![0u8; 2 + length + TAG_LENGTH];
        record[..2].copy_from_slice(&len_bytes);
        read_half.read_exact(&mut record[2..]).await?;

        // a short record only ends the current plaintext batch; the
        // connection stays open and the next read starts a fresh one
        let (plaintext, _terminal) = decrypt.decrypt_record(&record)?;
        codec.feed(&plaintext)?;
    }
}

fn dispatch(
    message: Response,
    pending: &StdMutex<PendingState>,
    handler: &(dyn Fn(ConnectionSignal) + Send + Sync),
) {
    match message.kind {
        ResponseKind::Event => handler(ConnectionSignal::Event(message)),
        ResponseKind::Http => {
            // pair the response with the generation it answers; only the
            // waiter for that exact generation may receive it
            let (waiter, unsolicited) = {
                let mut pending = pending.lock().expect("pending lock");
                pending.answered += 1;
                let generation = pending.answered;
                let matches = pending
                    .waiter
                    .as_ref()
                    .is_some_and(|(g, _)| *g == generation);
                let waiter = if matches { pending.waiter.take() } else { None };
                (waiter, generation > pending.issued)
            };

            match waiter {
                Some((_, tx)) => {
                    // the receiver may have just timed out; drop quietly
                    if let Err(unclaimed) = tx.send(message) {
                        tracing::debug!(status = unclaimed.status.0, "response after timeout");
                    }
                }
                // answers a request that timed out (or failed to write);
                // nobody is waiting for these bytes
                None if !unsolicited => {
                    tracing::debug!(
                        status = message.status.0,
                        "discarding response for a timed-out request"
                    );
                }
                // no request was ever written for this response
                None => handler(ConnectionSignal::OrphanResponse(message)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::http::{Headers, StatusCode};

    fn http_response(status: u16) -> Response {
        Response {
            kind: ResponseKind::Http,
            status: StatusCode(status),
            reason: "OK".to_string(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    fn event_response() -> Response {
        Response {
            kind: ResponseKind::Event,
            status: StatusCode::OK,
            reason: "OK".to_string(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    fn recording_handler() -> (Arc<StdMutex<Vec<&'static str>>>, impl Fn(ConnectionSignal)) {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler = move |signal: ConnectionSignal| {
            let label = match signal {
                ConnectionSignal::Event(_) => "event",
                ConnectionSignal::OrphanResponse(_) => "orphan",
                ConnectionSignal::Closed => "closed",
            };
            sink.lock().unwrap().push(label);
        };
        (seen, handler)
    }

    #[test]
    fn late_response_is_discarded_not_redelivered() {
        let (seen, handler) = recording_handler();
        let pending = StdMutex::new(PendingState::default());

        // request 1 was written and timed out; request 2 is now waiting
        let (tx2, mut rx2) = oneshot::channel();
        {
            let mut p = pending.lock().unwrap();
            p.issued = 2;
            p.waiter = Some((2, tx2));
        }

        // the slow reply for request 1 arrives first: dropped, not handed
        // to request 2's waiter
        dispatch(http_response(200), &pending, &handler);
        assert!(rx2.try_recv().is_err());
        assert!(seen.lock().unwrap().is_empty());

        // request 2's own reply still reaches it
        dispatch(http_response(204), &pending, &handler);
        let delivered = rx2.try_recv().expect("second response delivered");
        assert_eq!(delivered.status, StatusCode::NO_CONTENT);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn late_response_with_no_new_request_is_quiet() {
        let (seen, handler) = recording_handler();
        let pending = StdMutex::new(PendingState::default());

        // one request written, waiter already gone (timeout)
        pending.lock().unwrap().issued = 1;

        dispatch(http_response(200), &pending, &handler);
        // discarded without surfacing a protocol error
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(pending.lock().unwrap().answered, 1);
    }

    #[test]
    fn response_without_any_request_is_an_orphan() {
        let (seen, handler) = recording_handler();
        let pending = StdMutex::new(PendingState::default());

        dispatch(http_response(200), &pending, &handler);
        assert_eq!(*seen.lock().unwrap(), vec!["orphan"]);
    }

    #[test]
    fn events_bypass_request_accounting() {
        let (seen, handler) = recording_handler();
        let pending = StdMutex::new(PendingState::default());

        let (tx, mut rx) = oneshot::channel();
        {
            let mut p = pending.lock().unwrap();
            p.issued = 1;
            p.waiter = Some((1, tx));
        }

        dispatch(event_response(), &pending, &handler);
        assert_eq!(*seen.lock().unwrap(), vec!["event"]);
        assert_eq!(pending.lock().unwrap().answered, 0);
        assert!(rx.try_recv().is_err());

        dispatch(http_response(200), &pending, &handler);
        assert!(rx.try_recv().is_ok());
    }
}
