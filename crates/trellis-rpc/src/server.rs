//! RPC server
//!
//! Requests are read one line at a time. Methods that only touch session
//! state are answered in order; methods that wait on the note store run
//! alongside later requests and are answered when they finish, so a slow
//! search never holds up decorations for the next keystroke.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncWrite};
use trellis_core::{GraphPayload, GraphSettings};
use trellis_editor::{Modifiers, Viewport};
use trellis_store::{NoteStore, StoreResult};

use crate::error::{RpcError, RpcResult};
use crate::session::{Session, SessionOptions};
use crate::transport::{JsonRpcRequest, JsonRpcResponse, LineTransport};

const SERVER_NAME: &str = "trellis";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const METHODS: &[&str] = &[
    "initialize",
    "ping",
    "document/update",
    "document/click",
    "document/createNote",
    "note/backlinks",
    "completion",
    "graph/refresh",
    "graph/view",
    "graph/layout",
    "graph/reheat",
    "shutdown",
];

// ─────────────────────────────────────────────────────────────────────────────
// Params
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct UpdateParams {
    text: String,
    version: u64,
    #[serde(default)]
    viewport: Option<Viewport>,
}

#[derive(Deserialize)]
struct ClickParams {
    pos: usize,
    #[serde(flatten)]
    modifiers: Modifiers,
}

/// Params naming a note by title
#[derive(Deserialize)]
struct TitleParams {
    title: String,
}

#[derive(Deserialize)]
struct CompletionParams {
    text: String,
    cursor: usize,
    #[serde(default)]
    explicit: bool,
}

#[derive(Deserialize, Default)]
struct ViewParams {
    #[serde(default)]
    settings: Option<GraphSettings>,
}

#[derive(Deserialize)]
struct LayoutParams {
    width: f64,
    height: f64,
    #[serde(default)]
    padding: Option<f64>,
}

fn params<T: DeserializeOwned>(value: Value) -> RpcResult<T> {
    // Treat a missing params member like an empty object
    let value = if value.is_null() { json!({}) } else { value };
    Ok(serde_json::from_value(value)?)
}

fn to_value<T: Serialize>(result: RpcResult<T>) -> RpcResult<Value> {
    Ok(serde_json::to_value(result?)?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

/// How a method produces its result
enum Route {
    Now(RpcResult<Value>),
    Later(BoxFuture<'static, RpcResult<Value>>),
    /// A graph fetch; the payload is applied to the session on arrival
    Graph(BoxFuture<'static, StoreResult<GraphPayload>>),
}

impl Route {
    fn later<F>(task: F) -> Self
    where
        F: Future<Output = RpcResult<Value>> + Send + 'static,
    {
        Self::Later(Box::pin(task))
    }
}

/// A finished method, not yet turned into a response
enum Completed {
    Reply {
        id: Option<Value>,
        method: String,
        result: RpcResult<Value>,
    },
    Graph {
        id: Option<Value>,
        result: StoreResult<GraphPayload>,
    },
}

enum Dispatch {
    Done(Completed),
    Deferred(BoxFuture<'static, Completed>),
}

/// A response and whether it must stay unsent
struct Reply {
    notification: bool,
    response: JsonRpcResponse,
}

/// Write `reply` unless it answers a notification; `false` when the
/// transport failed
async fn send<R, W>(transport: &mut LineTransport<R, W>, reply: Reply) -> bool
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if reply.notification {
        return true;
    }
    match transport.write_response(&reply.response).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Failed to write response: {}", e);
            false
        }
    }
}

/// JSON-RPC server for one host surface
pub struct RpcServer<S> {
    session: Session<S>,
    shutdown: bool,
}

impl<S: NoteStore + 'static> RpcServer<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_options(store, SessionOptions::default())
    }

    pub fn with_options(store: Arc<S>, options: SessionOptions) -> Self {
        Self {
            session: Session::with_options(store, options),
            shutdown: false,
        }
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    /// Serve on stdio until EOF or `shutdown`
    pub async fn run_stdio(&mut self) -> anyhow::Result<()> {
        tracing::info!("Starting RPC server on stdio");
        self.run(&mut LineTransport::stdio()).await
    }

    /// Serve on any line transport until EOF or `shutdown`
    ///
    /// Store-bound requests still in flight when input ends are answered
    /// before returning.
    pub async fn run<R, W>(&mut self, transport: &mut LineTransport<R, W>) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut pending: FuturesUnordered<BoxFuture<'static, Completed>> = FuturesUnordered::new();
        let mut reading = true;

        loop {
            tokio::select! {
                line = transport.read_line(), if reading => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => {
                            tracing::info!("EOF on input, shutting down");
                            reading = false;
                            continue;
                        }
                        Err(e) => {
                            tracing::error!("Failed to read request: {}", e);
                            reading = false;
                            continue;
                        }
                    };

                    match self.accept(&line) {
                        Dispatch::Done(done) => {
                            let reply = self.finish(done);
                            if !send(transport, reply).await {
                                break;
                            }
                        }
                        Dispatch::Deferred(task) => pending.push(task),
                    }
                    if self.shutdown {
                        tracing::info!("Shutdown requested");
                        reading = false;
                    }
                }
                Some(done) = pending.next(), if !pending.is_empty() => {
                    let reply = self.finish(done);
                    if !send(transport, reply).await {
                        break;
                    }
                }
                else => break,
            }
        }

        Ok(())
    }

    /// Handle one request, waiting for any store call it makes
    pub async fn handle_request(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        let done = match self.dispatch(request) {
            Dispatch::Done(done) => done,
            Dispatch::Deferred(task) => task.await,
        };
        self.finish(done).response
    }

    fn accept(&mut self, line: &str) -> Dispatch {
        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.dispatch(request),
            Err(e) => {
                tracing::warn!("Unparseable request: {}", e);
                Dispatch::Done(Completed::Reply {
                    id: Some(Value::Null),
                    method: String::new(),
                    result: Err(RpcError::Parse(e)),
                })
            }
        }
    }

    fn dispatch(&mut self, request: JsonRpcRequest) -> Dispatch {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;
        tracing::debug!("Received request: {}", method);

        match self.route(&method, params) {
            Route::Now(result) => Dispatch::Done(Completed::Reply { id, method, result }),
            Route::Later(task) => Dispatch::Deferred(Box::pin(async move {
                let result = task.await;
                Completed::Reply { id, method, result }
            })),
            Route::Graph(fetch) => Dispatch::Deferred(Box::pin(async move {
                let result = fetch.await;
                Completed::Graph { id, result }
            })),
        }
    }

    fn route(&mut self, method: &str, params: Value) -> Route {
        match method {
            "initialize" => Route::Now(Ok(self.handle_initialize())),
            "ping" => Route::Now(Ok(json!({}))),
            "shutdown" => {
                self.shutdown = true;
                Route::Now(Ok(json!({})))
            }
            "document/update" => Route::Now(self.handle_update(params)),
            "document/click" => self.handle_click(params),
            "document/createNote" => self.handle_create(params),
            "note/backlinks" => self.handle_backlinks(params),
            "completion" => self.handle_completion(params),
            "graph/refresh" => Route::Graph(Box::pin(self.session.fetch_graph())),
            "graph/view" => Route::Now(self.handle_view(params)),
            "graph/layout" => Route::Now(self.handle_layout(params)),
            "graph/reheat" => {
                self.session.reheat();
                Route::Now(Ok(json!({})))
            }
            _ => Route::Now(Err(RpcError::MethodNotFound(method.to_string()))),
        }
    }

    fn finish(&mut self, done: Completed) -> Reply {
        let (id, method, result) = match done {
            Completed::Reply { id, method, result } => (id, method, result),
            Completed::Graph { id, result } => {
                let result = result
                    .map_err(RpcError::from)
                    .and_then(|payload| self.session.apply_graph(&payload))
                    .map(|stats| json!({ "stats": stats, "label": stats.to_string() }));
                (id, "graph/refresh".to_string(), result)
            }
        };

        let notification = id.is_none();
        let id = id.unwrap_or(Value::Null);
        let response = match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(e) => {
                tracing::debug!("{} failed: {}", method, e);
                JsonRpcResponse::error(id, e.code(), e.to_string())
            }
        };
        Reply {
            notification,
            response,
        }
    }

    fn handle_initialize(&self) -> Value {
        json!({
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION
            },
            "capabilities": {
                "methods": METHODS,
                "linkClass": trellis_editor::decoration::LINK_CLASS,
                "tagClass": trellis_editor::decoration::TAG_CLASS
            }
        })
    }

    fn handle_update(&mut self, value: Value) -> RpcResult<Value> {
        let p: UpdateParams = params(value)?;
        let decorations = self.session.update_document(p.text, p.version, p.viewport);
        Ok(json!({
            "version": decorations.version,
            "regions": decorations.regions(),
        }))
    }

    fn handle_click(&self, value: Value) -> Route {
        let task = params::<ClickParams>(value)
            .and_then(|p| self.session.click(p.pos, p.modifiers));
        match task {
            Ok(task) => Route::later(async move { to_value(Ok(task.await)) }),
            Err(e) => Route::Now(Err(e)),
        }
    }

    fn handle_create(&self, value: Value) -> Route {
        match params::<TitleParams>(value) {
            Ok(p) => {
                let task = self.session.create_note(p.title);
                Route::later(async move { to_value(task.await) })
            }
            Err(e) => Route::Now(Err(e)),
        }
    }

    fn handle_backlinks(&self, value: Value) -> Route {
        match params::<TitleParams>(value) {
            Ok(p) => {
                let task = self.session.backlinks(p.title);
                Route::later(async move { to_value(task.await) })
            }
            Err(e) => Route::Now(Err(e)),
        }
    }

    fn handle_completion(&self, value: Value) -> Route {
        match params::<CompletionParams>(value) {
            Ok(p) => {
                let task = self.session.complete(p.text, p.cursor, p.explicit);
                Route::later(async move { to_value(Ok(task.await)) })
            }
            Err(e) => Route::Now(Err(e)),
        }
    }

    fn handle_view(&mut self, value: Value) -> RpcResult<Value> {
        let p: ViewParams = params(value)?;
        to_value(self.session.frame(p.settings))
    }

    fn handle_layout(&mut self, value: Value) -> RpcResult<Value> {
        let p: LayoutParams = params(value)?;
        to_value(self.session.layout(p.width, p.height, p.padding))
    }
}
