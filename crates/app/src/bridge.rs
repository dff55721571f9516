//! Glue between the egui thread and the tokio runtime.
//!
//! The UI never awaits. Every backend operation is spawned here and
//! reports back by mutating the shared session and requesting a repaint.

use chat_host::conversation;
use chat_host::{Dispatcher, FrameClock, Session};
use eframe::egui;
use parking_lot::Mutex;
use providers::{Backend, HttpBackend};
use shared::settings::AppSettings;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::sync::Notify;

/// Frame ticks driven by egui's repaint loop.
pub struct EguiClock {
    ctx: egui::Context,
    frame: Arc<Notify>,
}

impl EguiClock {
    pub fn new(ctx: egui::Context) -> Self {
        Self {
            ctx,
            frame: Arc::new(Notify::new()),
        }
    }

    /// Called once per painted frame.
    pub fn tick(&self) {
        self.frame.notify_waiters();
    }
}

#[async_trait::async_trait]
impl FrameClock for EguiClock {
    async fn next_frame(&self) {
        let painted = self.frame.notified();
        self.ctx.request_repaint();
        // a hidden window stops painting; keep the reveal moving anyway
        let _ = tokio::time::timeout(Duration::from_millis(100), painted).await;
    }
}

pub struct Bridge {
    runtime: Runtime,
    ctx: egui::Context,
    pub session: Arc<Mutex<Session>>,
    backend: Arc<dyn Backend>,
    dispatcher: Arc<Dispatcher<dyn Backend>>,
    clock: Arc<EguiClock>,
    /// Last detection service health/stats answer, for the settings panel
    pub detect_status: Arc<Mutex<Option<String>>>,
}

impl Bridge {
    pub fn new(runtime: Runtime, ctx: egui::Context, settings: &AppSettings) -> Self {
        let backend: Arc<dyn Backend> = Arc::new(HttpBackend::from_settings(settings));
        let dispatcher = Arc::new(Dispatcher::new(backend.clone(), settings));
        tracing::info!("backend at {}", settings.backend_url);

        Self {
            runtime,
            clock: Arc::new(EguiClock::new(ctx.clone())),
            ctx,
            session: Arc::new(Mutex::new(Session::new(settings))),
            backend,
            dispatcher,
            detect_status: Arc::new(Mutex::new(None)),
        }
    }

    /// Swap in a backend built from new settings. The conversation is kept.
    pub fn reconfigure(&mut self, settings: &AppSettings) {
        self.backend = Arc::new(HttpBackend::from_settings(settings));
        self.dispatcher = Arc::new(Dispatcher::new(self.backend.clone(), settings));
        tracing::info!("backend reconfigured to {}", settings.backend_url);
        self.load_catalogs();
    }

    pub fn frame_painted(&self) {
        self.clock.tick();
    }

    /// Fetch everything the selectors show.
    pub fn load_catalogs(&self) {
        let session = self.session.clone();
        let backend = self.backend.clone();
        let ctx = self.ctx.clone();
        self.runtime.spawn(async move {
            tokio::join!(
                conversation::refresh_models(&session, backend.as_ref()),
                conversation::refresh_workspaces(&session, backend.as_ref()),
                conversation::refresh_agent_tools(&session, backend.as_ref()),
                conversation::refresh_agent_stats(&session, backend.as_ref()),
            );
            ctx.request_repaint();
        });
    }

    pub fn refresh_stats(&self) {
        let session = self.session.clone();
        let backend = self.backend.clone();
        let ctx = self.ctx.clone();
        self.runtime.spawn(async move {
            conversation::refresh_agent_stats(&session, backend.as_ref()).await;
            ctx.request_repaint();
        });
    }

    /// The ticket is taken here, on the UI thread, so a second click in the
    /// same frame already sees the session as busy.
    pub fn send(&self, input: String) -> Result<(), shared::SendRejected> {
        let ticket = self.session.lock().begin_send(&input)?;

        let session = self.session.clone();
        let dispatcher = self.dispatcher.clone();
        let clock: Arc<dyn FrameClock> = self.clock.clone();
        let ctx = self.ctx.clone();
        self.runtime.spawn(async move {
            conversation::deliver(&session, &*dispatcher, clock, ticket).await;
            ctx.request_repaint();
        });
        self.ctx.request_repaint();
        Ok(())
    }

    pub fn create_workspace(&self, name: String) {
        let session = self.session.clone();
        let backend = self.backend.clone();
        let ctx = self.ctx.clone();
        self.runtime.spawn(async move {
            conversation::create_workspace(&session, backend.as_ref(), &name).await;
            ctx.request_repaint();
        });
    }

    pub fn delete_workspace(&self, workspace_id: String) {
        let session = self.session.clone();
        let backend = self.backend.clone();
        let ctx = self.ctx.clone();
        self.runtime.spawn(async move {
            conversation::delete_workspace(&session, backend.as_ref(), &workspace_id).await;
            ctx.request_repaint();
        });
    }

    pub fn check_detection(&self) {
        let backend = self.backend.clone();
        let status = self.detect_status.clone();
        let ctx = self.ctx.clone();
        self.runtime.spawn(async move {
            let (health, stats) = tokio::join!(backend.detect_health(), backend.detect_stats());
            let text = match (health, stats) {
                (Ok(health), Ok(stats)) => {
                    let body = serde_json::json!({ "health": health, "stats": stats });
                    serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string())
                }
                (Err(e), _) | (_, Err(e)) => format!("Detection service unavailable: {}", e.detail()),
            };
            *status.lock() = Some(text);
            ctx.request_repaint();
        });
    }
}
