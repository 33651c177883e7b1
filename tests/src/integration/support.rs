//! # Loopback Servers
//!
//! Minimal consensus node and mirror speaking the SDK's TCP framing
//! (`[u32-le length][payload]`), for driving the real TCP adapters.

use std::sync::Arc;

use ledger_sdk::wire::{self, QueryBody, Request, Response, ResponseBody};
use ledger_sdk::{
    AccountBalance, KeyVerifier, Status, TopicMessage, TopicQuery, TransactionReceipt, Verifier,
};
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Frame limit used by the loopback servers and the clients under test.
pub const MAX_FRAME: usize = 1 << 20;

/// Read one frame; `None` on EOF or an oversized header.
pub async fn read_frame(stream: &mut TcpStream) -> Option<Vec<u8>> {
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await.ok()?;
    let len = u32::from_le_bytes(header) as usize;
    if len > MAX_FRAME {
        return None;
    }
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).await.ok()?;
    Some(payload)
}

/// Write one frame.
pub async fn write_frame(stream: &mut TcpStream, payload: &[u8]) -> std::io::Result<()> {
    stream
        .write_all(&(payload.len() as u32).to_le_bytes())
        .await?;
    stream.write_all(payload).await?;
    stream.flush().await
}

/// Endpoint nothing listens on.
pub async fn dead_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|e| panic!("bind: {e}"));
    let endpoint = listener
        .local_addr()
        .unwrap_or_else(|e| panic!("local_addr: {e}"))
        .to_string();
    drop(listener);
    endpoint
}

/// Answers like a healthy node: accepts transactions whose signatures all
/// verify, reports receipts as `SUCCESS` and balances as 100.
pub fn healthy_node(request: &Request) -> Response {
    match request {
        Request::Transaction(signed) => {
            let verified = !signed.sig_map.is_empty()
                && signed.sig_map.pairs().iter().all(|pair| {
                    pair.public_key()
                        .map(|key| KeyVerifier.verify(&key, &signed.body_bytes, &pair.signature))
                        .unwrap_or(false)
                });
            if verified {
                Response::status(Status::Ok)
            } else {
                Response::status(Status::InvalidSignature)
            }
        }
        Request::Query(query) => match &query.body {
            QueryBody::TransactionReceipt { .. } => {
                Response::receipt(TransactionReceipt::from_status(Status::Success))
            }
            QueryBody::AccountBalance { account_id } => Response {
                precheck: Status::Ok,
                cost: 0,
                body: ResponseBody::AccountBalance(AccountBalance {
                    account_id: account_id.clone(),
                    balance: 100,
                }),
            },
            _ => Response::status(Status::NotSupported),
        },
    }
}

type Answer = dyn Fn(&Request) -> Response + Send + Sync;

/// A consensus node on a loopback port.
pub struct LoopbackNode {
    /// `127.0.0.1:<port>`
    pub endpoint: String,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl LoopbackNode {
    /// Start a node answering every request with `answer`.
    pub async fn spawn<F>(answer: F) -> Self
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("bind: {e}"));
        let endpoint = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("local_addr: {e}"))
            .to_string();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let answer: Arc<Answer> = Arc::new(answer);

        let seen = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&answer), Arc::clone(&seen)));
            }
        });

        Self { endpoint, requests }
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }
}

async fn serve(mut stream: TcpStream, answer: Arc<Answer>, seen: Arc<Mutex<Vec<Request>>>) {
    while let Some(frame) = read_frame(&mut stream).await {
        let Ok(request) = wire::decode_request(&frame) else {
            break;
        };
        let response = answer(&request);
        seen.lock().push(request);
        let Ok(bytes) = wire::encode_response(&response) else {
            break;
        };
        if write_frame(&mut stream, &bytes).await.is_err() {
            break;
        }
    }
}

/// How one mirror connection ends.
#[derive(Clone, Copy, Debug)]
pub enum SessionEnd {
    /// Close the connection cleanly
    Complete,
    /// Send an oversized frame header, which clients treat as a stream error
    Break,
}

/// A mirror on a loopback port. Connection `n` replays `sessions[n]`.
pub struct LoopbackMirror {
    /// `127.0.0.1:<port>`
    pub endpoint: String,
    queries: Arc<Mutex<Vec<TopicQuery>>>,
}

impl LoopbackMirror {
    /// Start a mirror serving the given sessions, one per connection.
    pub async fn spawn(sessions: Vec<(Vec<TopicMessage>, SessionEnd)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("bind: {e}"));
        let endpoint = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("local_addr: {e}"))
            .to_string();
        let queries = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&queries);
        tokio::spawn(async move {
            for (messages, end) in sessions {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let Some(frame) = read_frame(&mut stream).await else {
                    continue;
                };
                if let Ok(query) = bincode::deserialize::<TopicQuery>(&frame) {
                    seen.lock().push(query);
                }
                for message in &messages {
                    let Ok(bytes) = bincode::serialize(message) else {
                        return;
                    };
                    if write_frame(&mut stream, &bytes).await.is_err() {
                        break;
                    }
                }
                if let SessionEnd::Break = end {
                    let _ = stream.write_all(&u32::MAX.to_le_bytes()).await;
                }
                let _ = stream.shutdown().await;
            }
        });

        Self { endpoint, queries }
    }

    /// Queries received, one per connection.
    pub fn queries(&self) -> Vec<TopicQuery> {
        self.queries.lock().clone()
    }
}
