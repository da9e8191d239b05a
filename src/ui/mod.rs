//! Presentation layer.
//!
//! [`render`] turns chat state into a surface-neutral [`render::VisibleOutput`];
//! [`terminal`] and [`html`] draw that output, and [`chat_loop`] runs the
//! interactive terminal session on top of them.

pub mod chat_loop;
pub mod html;
pub mod render;
pub mod terminal;
