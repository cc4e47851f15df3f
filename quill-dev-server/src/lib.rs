//! Live preview server for a single content document.

mod page;

pub use page::{PagePipeline, Preview, RUN_ENDPOINT, inject_livereload_script};

use anyhow::Result;
use axum::{
    Json, Router,
    extract::State,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use notify_debouncer_mini::{DebounceEventResult, new_debouncer};
use quill_exec::{Executor, RunError, RunOutcome};
use serde::Deserialize;
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
    time::Duration,
};
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tracing::{debug, error, info, warn};

/// Configuration for the live preview server
#[derive(Debug, Clone)]
pub struct LiveServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to serve on
    pub port: u16,
    /// Document file to render and watch
    pub document: PathBuf,
    /// Directory served for every other path (stylesheets, images)
    pub assets: Option<PathBuf>,
    /// Auto-open browser
    pub open: bool,
    pub title: String,
    pub syntax_theme: String,
    pub stylesheets: Vec<String>,
}

impl Default for LiveServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            document: PathBuf::from("post.html"),
            assets: None,
            open: false,
            title: "Content Preview".to_string(),
            syntax_theme: quill_core::preview::DEFAULT_THEME.to_string(),
            stylesheets: vec![],
        }
    }
}

/// Serves the rendered document, reloads browsers when it changes and runs
/// interactive blocks on request.
pub struct LiveServer {
    config: LiveServerConfig,
    executor: Executor,
}

impl LiveServer {
    pub fn new(config: LiveServerConfig, executor: Executor) -> Self {
        Self { config, executor }
    }

    pub async fn run(self) -> Result<()> {
        if !self.config.document.is_file() {
            return Err(anyhow::anyhow!(
                "Document does not exist: {}",
                self.config.document.display()
            ));
        }

        let pipeline = PagePipeline::new(
            &self.config.syntax_theme,
            self.config.title.clone(),
            self.config.stylesheets.clone(),
            self.executor,
        )?;
        let markup = tokio::fs::read_to_string(&self.config.document).await?;
        let preview = pipeline.render(&markup, None)?;

        let (reload_tx, _) = broadcast::channel::<String>(100);
        let state = AppState {
            reload_tx: reload_tx.clone(),
            preview: Arc::new(RwLock::new(preview)),
        };

        let watcher_state = state.clone();
        let document = self.config.document.clone();
        tokio::spawn(async move {
            if let Err(e) = watch_document(document, pipeline, watcher_state).await {
                error!("File watcher error: {}", e);
            }
        });

        let app = router(state, self.config.assets.as_deref());
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        info!("Serving at http://{}", addr);
        info!("Watching: {}", self.config.document.display());

        if self.config.open {
            if let Err(e) = open::that(format!("http://{}", addr)) {
                warn!("Failed to open browser: {}", e);
            }
        }

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

#[derive(Clone)]
struct AppState {
    reload_tx: broadcast::Sender<String>,
    preview: Arc<RwLock<Preview>>,
}

impl AppState {
    fn read(&self) -> std::sync::RwLockReadGuard<'_, Preview> {
        self.preview
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn router(state: AppState, assets: Option<&Path>) -> Router {
    let router = Router::new()
        .route("/", get(page_handler))
        .route("/__livereload", get(websocket_handler))
        .route(RUN_ENDPOINT, post(run_handler));

    let router = match assets {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.with_state(state)
}

async fn page_handler(State(state): State<AppState>) -> Html<String> {
    Html(state.read().page.clone())
}

#[derive(Debug, Deserialize)]
struct RunRequest {
    index: usize,
}

async fn run_handler(State(state): State<AppState>, Json(req): Json<RunRequest>) -> Response {
    let runner = state.read().runner(req.index);
    let Some(runner) = runner else {
        let message = format!("Error: No interactive code block at position {}", req.index);
        return (StatusCode::NOT_FOUND, Json(RunOutcome::Failed(message))).into_response();
    };

    debug!("Running block {} ({})", req.index, runner.language());
    let result = runner.run().await;
    // The response carries the result, so the block is free for the next run
    runner.acknowledge();
    match result {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => {
            let status = match e {
                RunError::AlreadyRunning => StatusCode::CONFLICT,
                RunError::Unsupported { .. } => StatusCode::BAD_REQUEST,
            };
            (status, Json(RunOutcome::Failed(e.to_string()))).into_response()
        }
    }
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| websocket_connection(socket, state.reload_tx))
}

async fn websocket_connection(mut socket: WebSocket, reload_tx: broadcast::Sender<String>) {
    let mut rx = reload_tx.subscribe();

    if socket
        .send(Message::Text("connected".to_string().into()))
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            msg = rx.recv() => {
                match msg {
                    Ok(reload_msg) => {
                        if socket.send(Message::Text(reload_msg.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
            msg = socket.recv() => {
                if msg.is_none() {
                    break;
                }
            }
        }
    }
}

async fn watch_document(document: PathBuf, pipeline: PagePipeline, state: AppState) -> Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel(100);

    let mut debouncer = new_debouncer(
        Duration::from_millis(300),
        move |res: DebounceEventResult| {
            if let Ok(events) = res {
                for event in events {
                    let _ = tx.blocking_send(event.path);
                }
            }
        },
    )?;

    // Editors often save by replacing the file, so watch its directory.
    let document = document.canonicalize()?;
    let dir = document
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    debouncer
        .watcher()
        .watch(&dir, notify::RecursiveMode::NonRecursive)?;

    while let Some(path) = rx.recv().await {
        if path.canonicalize().unwrap_or(path) != document {
            continue;
        }

        let markup = match tokio::fs::read_to_string(&document).await {
            Ok(markup) => markup,
            Err(e) => {
                warn!("Could not read {}: {}", document.display(), e);
                continue;
            }
        };

        let rendered = {
            let current = state.read();
            pipeline.render(&markup, Some(&*current))
        };
        match rendered {
            Ok(preview) => {
                *state
                    .preview
                    .write()
                    .unwrap_or_else(std::sync::PoisonError::into_inner) = preview;
                info!("Document changed, reloading");
                let _ = state.reload_tx.send("reload".to_string());
            }
            Err(e) => error!("Render error: {}", e),
        }
    }

    Ok(())
}
