//! Send orchestration and selector loaders.
//!
//! The session lock is never held across a backend call: validation and
//! bookkeeping happen under the lock, the request runs without it.

use parking_lot::Mutex;
use providers::wire::CreateWorkspaceRequest;
use providers::Backend;
use shared::SendRejected;
use std::sync::Arc;

use crate::dispatcher::Dispatcher;
use crate::reveal::{spawn_reveal, FrameClock, RevealHandle};
use crate::session::{SendTicket, Session};

/// Send `input` in the session's current mode. Returns the running reveal,
/// if the reply is being revealed progressively.
pub async fn send<B: Backend + ?Sized>(
    session: &Arc<Mutex<Session>>,
    dispatcher: &Dispatcher<B>,
    clock: Arc<dyn FrameClock>,
    input: &str,
) -> Result<Option<RevealHandle>, SendRejected> {
    let ticket = session.lock().begin_send(input)?;
    Ok(deliver(session, dispatcher, clock, ticket).await)
}

/// Second half of a send whose ticket was already taken with
/// `Session::begin_send`: run the request and apply the reply.
pub async fn deliver<B: Backend + ?Sized>(
    session: &Arc<Mutex<Session>>,
    dispatcher: &Dispatcher<B>,
    clock: Arc<dyn FrameClock>,
    ticket: SendTicket,
) -> Option<RevealHandle> {
    let outcome = dispatcher.dispatch(&ticket).await;

    let reveal = session.lock().complete_send(&ticket, outcome);
    reveal.map(|reveal| {
        let handle = spawn_reveal(session.clone(), reveal, clock);
        session.lock().track_reveal(handle.abort_handle());
        handle
    })
}

pub async fn refresh_models<B: Backend + ?Sized>(session: &Arc<Mutex<Session>>, backend: &B) {
    match backend.list_models().await {
        Ok(models) => {
            tracing::info!("loaded {} models", models.len());
            session.lock().set_models(models);
        }
        Err(e) => tracing::warn!("failed to fetch models: {}", e),
    }
}

pub async fn refresh_workspaces<B: Backend + ?Sized>(session: &Arc<Mutex<Session>>, backend: &B) {
    match backend.list_workspaces().await {
        Ok(workspaces) => {
            tracing::info!("loaded {} workspaces", workspaces.len());
            session.lock().set_workspaces(workspaces);
        }
        Err(e) => tracing::warn!("failed to fetch workspaces: {}", e),
    }
}

/// Create a personal workspace and select it. Blank names are ignored.
pub async fn create_workspace<B: Backend + ?Sized>(
    session: &Arc<Mutex<Session>>,
    backend: &B,
    name: &str,
) -> bool {
    let name = name.trim();
    if name.is_empty() {
        return false;
    }
    match backend
        .create_workspace(&CreateWorkspaceRequest::personal(name))
        .await
    {
        Ok(workspace) => {
            tracing::info!("created workspace {} ({})", workspace.name, workspace.id);
            session.lock().add_workspace(workspace);
            true
        }
        Err(e) => {
            tracing::warn!("failed to create workspace: {}", e);
            false
        }
    }
}

pub async fn delete_workspace<B: Backend + ?Sized>(
    session: &Arc<Mutex<Session>>,
    backend: &B,
    workspace_id: &str,
) -> bool {
    match backend.delete_workspace(workspace_id).await {
        Ok(()) => {
            tracing::info!("deleted workspace {}", workspace_id);
            session.lock().remove_workspace(workspace_id);
            true
        }
        Err(e) => {
            tracing::warn!("failed to delete workspace {}: {}", workspace_id, e);
            false
        }
    }
}

pub async fn refresh_agent_tools<B: Backend + ?Sized>(session: &Arc<Mutex<Session>>, backend: &B) {
    match backend.agent_tools().await {
        Ok(tools) => session.lock().set_available_tools(tools),
        Err(e) => tracing::warn!("failed to fetch tools: {}", e),
    }
}

pub async fn refresh_agent_stats<B: Backend + ?Sized>(session: &Arc<Mutex<Session>>, backend: &B) {
    match backend.agent_stats().await {
        Ok(stats) => session.lock().set_agent_stats(stats),
        Err(e) => tracing::warn!("failed to fetch agent stats: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::tests::ScriptedBackend;
    use crate::reveal::IntervalClock;
    use serde_json::json;
    use shared::conversation::{Mode, Role, TOOL_CATALOG};
    use shared::settings::AppSettings;
    use std::time::Duration;

    fn setup() -> (Arc<Mutex<Session>>, Arc<ScriptedBackend>, Dispatcher<ScriptedBackend>) {
        let settings = AppSettings::default();
        let backend = Arc::new(ScriptedBackend::default());
        let dispatcher = Dispatcher::new(backend.clone(), &settings);
        (Arc::new(Mutex::new(Session::new(&settings))), backend, dispatcher)
    }

    fn fast_clock() -> Arc<dyn FrameClock> {
        Arc::new(IntervalClock {
            interval: Duration::from_millis(1),
        })
    }

    #[tokio::test]
    async fn test_hello_round_trip() {
        let (session, backend, dispatcher) = setup();
        *backend.chat.lock() = Some(Ok(json!({"choices": [{"message": {"content": "Hi there!"}}]})));

        let handle = send(&session, &dispatcher, fast_clock(), "Hello")
            .await
            .unwrap()
            .expect("chat replies are revealed");
        handle.join().await;

        let s = session.lock();
        let tail: Vec<(Role, &str)> = s.messages()[1..]
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect();
        assert_eq!(tail, vec![(Role::User, "Hello"), (Role::Assistant, "Hi there!")]);
        assert!(!s.is_busy());
    }

    #[tokio::test]
    async fn test_rejected_send_makes_no_call() {
        let (session, backend, dispatcher) = setup();
        let err = send(&session, &dispatcher, fast_clock(), "  ").await.unwrap_err();
        assert_eq!(err, SendRejected::EmptyInput);

        session.lock().set_mode(Mode::Agent);
        let err = send(&session, &dispatcher, fast_clock(), "hi").await.unwrap_err();
        assert_eq!(err, SendRejected::WorkspaceRequired);

        assert!(backend.calls().is_empty());
        assert_eq!(session.lock().messages().len(), 1);
    }

    #[tokio::test]
    async fn test_ticket_taken_up_front_blocks_second_send() {
        let (session, backend, dispatcher) = setup();
        *backend.chat.lock() = Some(Ok(json!({"choices": [{"message": {"content": "ok"}}]})));

        let ticket = session.lock().begin_send("first").unwrap();
        assert_eq!(session.lock().can_send("second"), Err(SendRejected::Busy));

        let handle = deliver(&session, &dispatcher, fast_clock(), ticket)
            .await
            .expect("chat replies are revealed");
        handle.join().await;

        let s = session.lock();
        assert_eq!(s.messages().last().unwrap().content, "ok");
        assert_eq!(s.can_send("second"), Ok(()));
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_detect_reply_is_immediate() {
        let (session, backend, dispatcher) = setup();
        *backend.segment.lock() = Some(Ok(json!({"results": []})));
        {
            let mut s = session.lock();
            s.set_mode(Mode::Detect);
            s.stage_image(shared::conversation::EncodedImage::from_bytes("image/png", b"p"));
        }

        let handle = send(&session, &dispatcher, fast_clock(), "").await.unwrap();
        assert!(handle.is_none());
        let s = session.lock();
        assert_eq!(s.messages().last().unwrap().content, "No objects detected.");
        assert!(!s.is_loading());
    }

    #[tokio::test]
    async fn test_clear_during_reveal() {
        let (session, backend, dispatcher) = setup();
        let long = "x".repeat(500);
        *backend.chat.lock() = Some(Ok(json!({"choices": [{"message": {"content": long}}]})));

        let slow: Arc<dyn FrameClock> = Arc::new(IntervalClock {
            interval: Duration::from_secs(60),
        });
        let handle = send(&session, &dispatcher, slow, "go").await.unwrap().unwrap();
        session.lock().reset();
        handle.join().await;

        let s = session.lock();
        assert_eq!(s.messages().len(), 1);
        assert!(!s.is_typing());
    }

    #[tokio::test]
    async fn test_workspace_loaders() {
        let (session, backend, _) = setup();

        assert!(!create_workspace(&session, backend.as_ref(), "   ").await);
        assert!(create_workspace(&session, backend.as_ref(), " Notes ").await);
        assert_eq!(session.lock().selected_workspace_id(), Some("ws-notes"));

        refresh_workspaces(&session, backend.as_ref()).await;
        assert_eq!(session.lock().workspaces().len(), 1);

        assert!(delete_workspace(&session, backend.as_ref(), "ws-notes").await);
        assert!(session.lock().workspaces().is_empty());
        assert_eq!(session.lock().selected_workspace_id(), None);
    }

    #[tokio::test]
    async fn test_failed_loader_keeps_selector() {
        let (session, backend, _) = setup();
        refresh_agent_tools(&session, backend.as_ref()).await;
        assert_eq!(session.lock().available_tools().len(), TOOL_CATALOG.len());

        refresh_models(&session, backend.as_ref()).await;
        refresh_agent_stats(&session, backend.as_ref()).await;
        let s = session.lock();
        assert_eq!(s.models()[0].display_name(), "Model One");
        assert!(s.agent_stats().unwrap().healthy);
    }
}
