//! Markdown segmentation and code highlighting for chat messages.
//!
//! Both passes are pure: they turn text into data and leave drawing to the caller.

pub mod highlight;
pub mod render;

pub use highlight::{highlight, HighlightedLine, Token, TokenKind};
pub use render::{plain_text, render, HeadingLevel, Segment};
