//! Sync channel: the persistent connection to the world authority, plus the
//! application of its inbound events to the world snapshot.
//!
//! The connection lives on a background thread running a current-thread
//! tokio runtime. Parsed inbound messages and outbound intents cross into
//! the main loop over unbounded channels, so every state mutation still
//! happens on the single event-handling context.

use log::{debug, error, info, warn};
use shared::{encode_outgoing, parse_incoming, ClientMessage, Incoming, ServerMessage};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::assets::{AvatarAssetCache, FrameLoader};
use crate::world::WorldState;

/// Connection lifecycle. An `Error` event does not transition state; a
/// close is expected to follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Closed,
}

/// Events the connection task reports to the main loop.
#[derive(Debug)]
pub enum NetEvent {
    Opened,
    Inbound(Incoming),
    Closed,
    Error(String),
}

pub struct SyncChannel {
    state: ChannelState,
    outgoing: mpsc::UnboundedSender<ClientMessage>,
    events: mpsc::UnboundedReceiver<NetEvent>,
}

impl SyncChannel {
    /// Starts connecting. Never blocks; progress arrives through `poll`.
    pub fn connect(addr: &str) -> Self {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let addr = addr.to_string();

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build();
            match runtime {
                Ok(runtime) => runtime.block_on(run_connection(addr, out_rx, event_tx)),
                Err(err) => {
                    error!("failed to start network runtime: {}", err);
                    let _ = event_tx.send(NetEvent::Closed);
                }
            }
        });

        SyncChannel {
            state: ChannelState::Connecting,
            outgoing: out_tx,
            events: event_rx,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Drains everything the connection produced since the last call,
    /// updating the channel state along the way.
    pub fn poll(&mut self) -> Vec<NetEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            match &event {
                NetEvent::Opened => self.state = ChannelState::Open,
                NetEvent::Closed => self.state = ChannelState::Closed,
                _ => {}
            }
            events.push(event);
        }
        events
    }

    /// Sends an outbound message, silently dropped unless the channel is
    /// open.
    pub fn send(&self, msg: &ClientMessage) {
        if self.state != ChannelState::Open {
            debug!("dropping {:?} while {:?}", msg, self.state);
            return;
        }
        if self.outgoing.send(msg.clone()).is_err() {
            debug!("connection task gone; dropping {:?}", msg);
        }
    }
}

async fn run_connection(
    addr: String,
    mut outgoing: mpsc::UnboundedReceiver<ClientMessage>,
    events: mpsc::UnboundedSender<NetEvent>,
) {
    let stream = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(err) => {
            error!("connect to {} failed: {}", addr, err);
            let _ = events.send(NetEvent::Closed);
            return;
        }
    };
    info!("connected to {}", addr);
    let _ = events.send(NetEvent::Opened);

    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(raw)) => match parse_incoming(&raw) {
                    Ok(incoming) => {
                        if events.send(NetEvent::Inbound(incoming)).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!("discarding malformed message: {}", err),
                },
                Ok(None) => {
                    let _ = events.send(NetEvent::Closed);
                    break;
                }
                Err(err) => {
                    let _ = events.send(NetEvent::Error(err.to_string()));
                    let _ = events.send(NetEvent::Closed);
                    break;
                }
            },
            msg = outgoing.recv() => match msg {
                Some(msg) => match encode_outgoing(&msg) {
                    Ok(mut raw) => {
                        raw.push('\n');
                        if let Err(err) = write_half.write_all(raw.as_bytes()).await {
                            let _ = events.send(NetEvent::Error(err.to_string()));
                            let _ = events.send(NetEvent::Closed);
                            break;
                        }
                    }
                    Err(err) => error!("failed to encode {:?}: {}", msg, err),
                },
                // Sender dropped: the client is shutting down.
                None => break,
            },
        }
    }
}

/// Applies one inbound payload to the snapshot and asset cache. Returns
/// true when anything changed and a repaint is due.
pub fn apply_incoming(
    incoming: Incoming,
    world: &mut WorldState,
    assets: &mut AvatarAssetCache,
    loader: &dyn FrameLoader,
) -> bool {
    match incoming {
        Incoming::Message(msg) => apply_message(msg, world, assets, loader),
        Incoming::Report { success, error } => {
            if success {
                debug!("ignoring unrecognized message");
            } else {
                error!(
                    "server reported failure: {}",
                    error.as_deref().unwrap_or("unknown error")
                );
            }
            false
        }
    }
}

fn apply_message(
    msg: ServerMessage,
    world: &mut WorldState,
    assets: &mut AvatarAssetCache,
    loader: &dyn FrameLoader,
) -> bool {
    match msg {
        ServerMessage::JoinGame {
            success,
            player_id,
            players,
            avatars,
            error,
        } => {
            if !success {
                error!(
                    "join rejected: {}",
                    error.as_deref().unwrap_or("unknown error")
                );
                return false;
            }
            for (key, def) in &avatars {
                let avatar_id = def.name.as_deref().unwrap_or(key);
                assets.register(avatar_id, &def.frames, loader);
            }
            world.replace_all(players);
            world.set_local_id(player_id);
            info!(
                "joined as {:?} with {} participants",
                world.local_id(),
                world.len()
            );
            true
        }
        ServerMessage::PlayersMoved { players } => {
            for (id, patch) in &players {
                world.merge(id, patch);
            }
            true
        }
        ServerMessage::PlayerJoined { player, avatar } => {
            if let Some(def) = &avatar {
                if let Some(name) = def.name.as_deref() {
                    assets.register(name, &def.frames, loader);
                }
            }
            match &player.id {
                Some(id) => {
                    world.insert(id.clone(), &player);
                    true
                }
                None => {
                    warn!("player_joined without an id; ignoring");
                    false
                }
            }
        }
        ServerMessage::PlayerLeft { player_id } => {
            world.remove(&player_id);
            true
        }
    }
}
