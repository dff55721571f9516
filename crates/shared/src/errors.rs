use crate::conversation::Mode;

/// Reasons a send is refused before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendRejected {
    #[error("A request or reply is still in progress")]
    Busy,

    #[error("Type a message or attach an image")]
    EmptyInput,

    #[error("Select a workspace to use agent mode")]
    WorkspaceRequired,

    #[error("{} mode needs an image", mode.label())]
    ImageRequired { mode: Mode },
}
