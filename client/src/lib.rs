//! # World Viewer Client
//!
//! Client-side engine for a shared 2D world. It keeps a local snapshot of
//! every participant in sync with the authoritative server, forwards arrow
//! key input as movement intents, and repaints a single 2D surface only
//! when something actually changed.
//!
//! ## Architecture
//!
//! Two event sources feed the engine: the sync channel (server messages)
//! and the keyboard. Both mutate the world snapshot and raise the dirty
//! flag; the render scheduler coalesces any number of those invalidations
//! into at most one compositor pass per display refresh. There is no
//! fixed-tick simulation loop: a frame with nothing dirty draws nothing.
//!
//! The server is authoritative. Local input produces an immediate facing
//! change for responsiveness, but positions only ever move when the server
//! says so; there is no prediction and nothing to roll back.
//!
//! ## Module organization
//!
//! - [`world`]: the participant snapshot, the single source of truth.
//! - [`network`]: the sync channel state machine and inbound message
//!   application.
//! - [`input`]: held-key state machine mapping keys to movement intents.
//! - [`assets`]: avatar frame cache with first-wins registration and
//!   west-mirrors-east aliasing.
//! - [`camera`]: pure clamped world-to-screen framing.
//! - [`viewport`]: surface metrics and device pixel ratio tracking.
//! - [`scheduler`]: dirty flag and paint coalescing.
//! - [`compositor`]: background, depth-sorted avatars, name labels.
//! - [`app`]: the one mutable context tying the event sources together.
//!
//! ## Failure policy
//!
//! Nothing on the render path can fail: missing avatars draw as placeholder
//! circles, an unloaded background draws as a blank frame, malformed
//! network payloads are logged and discarded, and a dead connection simply
//! freezes the view at its last snapshot.

pub mod app;
pub mod assets;
pub mod camera;
pub mod compositor;
pub mod input;
pub mod network;
pub mod scheduler;
pub mod viewport;
pub mod world;
