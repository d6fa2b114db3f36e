//! Actors: Who runs an edit, and when.
//!
//! Key events arrive on the host's thread. Whoever claims the controller
//! emits; keys arriving meanwhile are queued and replayed in order by the
//! claiming thread or, failing that, by the replay worker:
//! - **Controller**: Classifies keys, claims the busy flag or queues
//! - **Reconciler**: Composer output in, consumer edits out
//! - **Replay Worker**: Picks up keys left in the queue
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐      KeyEvent       ┌──────────────┐      Edit      ┌──────────┐
//! │  Host input  │ ──────────────────▶ │  Controller  │ ─────────────▶ │ Emitter  │
//! └──────────────┘                     │ (Reconciler) │                └──────────┘
//!        │ busy                        └──────────────┘                     │
//!        ▼                                    ▲                             ▼
//! ┌──────────────┐       wake          ┌──────────────┐               ┌──────────┐
//! │ PendingQueue │ ──────────────────▶ │Replay Worker │               │ Consumer │
//! └──────────────┘                     └──────────────┘               └──────────┘
//! ```

mod controller;
mod engine;
mod messages;
mod queue;
mod reconcile;
mod worker;

pub use controller::{Controller, ControllerState};
pub use engine::Engine;
pub use messages::{char_to_keyval, keycode, keysym, KeyEvent, KeyState};
pub use queue::PendingQueue;
pub use reconcile::Reconciler;
pub use worker::ReplayWorker;
