//! # charisma-editor — Editor core for charisma
//!
//! - **[`editor`]** — `Editor` session state (cursor, screen size), key
//!   dispatch, and the draw/read/act loop
//! - **[`render`]** — frame composition into a single batched write
//!
//! Terminal access goes through `charisma_term::tty::Tty`, so everything
//! here runs the same against the real terminal and a scripted one.

pub mod editor;
pub mod render;
