//! Chat Host - conversation logic behind the chat window
//!
//! This crate provides:
//! - the session that owns messages, selections and the staged image
//! - mode dispatch to the backend with reply normalization
//! - progressive reveal of replies, cancellable on reset
//! - image staging from files and pasted bitmaps

pub mod conversation;
pub mod detect;
pub mod dispatcher;
pub mod image;
pub mod ocr;
pub mod reveal;
pub mod session;

pub use conversation::{deliver, send};
pub use dispatcher::{Dispatcher, Outcome, Presentation};
pub use reveal::{spawn_reveal, FrameClock, IntervalClock, Reveal, RevealHandle, RevealStep};
pub use session::{SendTicket, Session};
