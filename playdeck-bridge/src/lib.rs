//! # PlayDeck Bridge Library (playdeck-bridge)
//!
//! Keeps a tree of UI controls and one media engine in sync through a single
//! playback-state record.
//!
//! **Purpose:** Controls send intents through a [`RemoteControl`], read state
//! through a [`StoreReader`], and never touch the engine. The controller
//! buffers intents until an engine adapter connects, drives the playback
//! state machine from the adapter's events and re-broadcasts state changes.
//!
//! **Architecture:** One tokio task per player owns the machine and the
//! writable store; everything else talks to it over a [`PlayerScope`].

pub mod adapter;
pub mod config;
pub mod controller;
pub mod disposal;
pub mod error;
pub mod machine;
pub mod notifier;
pub mod remote;
pub mod request_queue;
pub mod scope;
pub mod sim;
pub mod store;

pub use adapter::{AdapterContext, Capabilities, MediaAdapter, MediaEventSink, PlayTypeSupport};
pub use config::ControllerConfig;
pub use controller::{AdapterConnection, DisconnectHook};
pub use disposal::{DisposalBin, Dispose, Disposer};
pub use error::{Error, Result};
pub use machine::{MachineState, PlaybackMachine};
pub use remote::RemoteControl;
pub use request_queue::{Dispatch, FlushReport, RequestQueue};
pub use scope::{PendingRequest, PlayerScope};
pub use store::{MediaStore, StoreReader, Subscription};
