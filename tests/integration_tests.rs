//! Integration tests for the world viewer client.
//!
//! These validate the real sync channel over a TCP socket and the
//! end-to-end application of inbound protocol messages.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;
use std::time::{Duration, Instant};

use client::assets::{AvatarAssetCache, FrameHandle, FrameLoader};
use client::camera;
use client::network::{apply_incoming, ChannelState, NetEvent, SyncChannel};
use client::world::WorldState;
use shared::{parse_incoming, ClientMessage, Direction};

struct UrlLoader;

impl FrameLoader for UrlLoader {
    fn load(&self, url: &str) -> FrameHandle {
        FrameHandle::pending(url)
    }
}

/// Polls the channel until `want` events arrived or the timeout expired.
fn pump(channel: &mut SyncChannel, want: usize, timeout: Duration) -> Vec<NetEvent> {
    let deadline = Instant::now() + timeout;
    let mut events = Vec::new();
    while events.len() < want && Instant::now() < deadline {
        events.extend(channel.poll());
        thread::sleep(Duration::from_millis(5));
    }
    events
}

/// SYNC CHANNEL TESTS
mod channel_tests {
    use super::*;

    /// Full join flow against a scripted server on a real socket.
    #[test]
    fn join_flow_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind listener");
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let join: serde_json::Value = serde_json::from_str(&line).unwrap();
            assert_eq!(join["action"], "join_game");
            assert_eq!(join["username"], "Sean");

            let mut stream = stream;
            writeln!(
                stream,
                r#"{{"action":"join_game","success":true,"playerId":"p1","players":{{"p1":{{"id":"p1","username":"Sean","x":100,"y":100,"facing":"south"}}}},"avatars":{{"fox":{{"name":"fox","frames":{{"south":["s.png"]}}}}}}}}"#
            )
            .unwrap();
            writeln!(
                stream,
                r#"{{"action":"players_moved","players":{{"p1":{{"x":150}}}}}}"#
            )
            .unwrap();
            writeln!(stream, r#"{{"action":"player_left","playerId":"ghost"}}"#).unwrap();
            stream.flush().unwrap();

            // Keep the connection up long enough for the client to drain.
            thread::sleep(Duration::from_millis(300));
        });

        let mut channel = SyncChannel::connect(&addr.to_string());

        let opened = pump(&mut channel, 1, Duration::from_secs(2));
        assert!(matches!(opened.first(), Some(NetEvent::Opened)));
        assert_eq!(channel.state(), ChannelState::Open);

        channel.send(&ClientMessage::JoinGame {
            username: "Sean".to_string(),
        });

        let mut world = WorldState::new();
        let mut assets = AvatarAssetCache::new();
        let events = pump(&mut channel, 3, Duration::from_secs(2));
        let inbound: Vec<_> = events
            .into_iter()
            .filter_map(|event| match event {
                NetEvent::Inbound(incoming) => Some(incoming),
                _ => None,
            })
            .collect();
        assert_eq!(inbound.len(), 3, "expected three inbound messages");
        for incoming in inbound {
            apply_incoming(incoming, &mut world, &mut assets, &UrlLoader);
        }

        assert_eq!(world.local_id(), Some("p1"));
        let me = world.local().unwrap();
        assert_eq!(me.x, 150.0);
        assert_eq!(me.y, 100.0);
        assert_eq!(me.facing, Direction::South);
        assert_eq!(world.len(), 1);

        // The fox avatar came with south frames only: a west lookup lands
        // on the south fallback rather than failing.
        assert!(assets.contains("fox"));
        assert_eq!(
            assets.lookup("fox", Direction::West, 0).unwrap().url(),
            "s.png"
        );

        server.join().unwrap();
    }

    /// A refused connection closes the channel; sends before open are
    /// silently dropped.
    #[test]
    fn refused_connection_closes_channel() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut channel = SyncChannel::connect(&addr.to_string());
        channel.send(&ClientMessage::Stop);

        let events = pump(&mut channel, 1, Duration::from_secs(2));
        assert!(events.iter().any(|e| matches!(e, NetEvent::Closed)));
        assert_eq!(channel.state(), ChannelState::Closed);
    }

    /// Server hanging up mid-session freezes the view: a close event, then
    /// nothing.
    #[test]
    fn server_close_freezes_snapshot() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            drop(stream);
        });

        let mut channel = SyncChannel::connect(&addr.to_string());
        let events = pump(&mut channel, 2, Duration::from_secs(2));
        assert!(events.iter().any(|e| matches!(e, NetEvent::Opened)));
        assert!(events.iter().any(|e| matches!(e, NetEvent::Closed)));
        assert_eq!(channel.state(), ChannelState::Closed);

        server.join().unwrap();
    }
}

/// END-TO-END SCENARIO TESTS
mod scenario_tests {
    use super::*;

    fn apply_raw(raw: &str, world: &mut WorldState, assets: &mut AvatarAssetCache) -> bool {
        apply_incoming(parse_incoming(raw).unwrap(), world, assets, &UrlLoader)
    }

    #[test]
    fn join_then_move_recenters_camera() {
        let mut world = WorldState::new();
        let mut assets = AvatarAssetCache::new();

        let join = r#"{
            "action": "join_game",
            "success": true,
            "playerId": "p1",
            "players": {"p1": {"x": 100, "y": 100, "facing": "south"}},
            "avatars": {"fox": {"frames": {"south": ["s.png"]}}}
        }"#;
        assert!(apply_raw(join, &mut world, &mut assets));
        assert_eq!(world.local().unwrap().x, 100.0);
        // Avatar defs without a name register under their map key.
        assert!(assets.contains("fox"));

        let moved = r#"{"action": "players_moved", "players": {"p1": {"x": 150}}}"#;
        assert!(apply_raw(moved, &mut world, &mut assets));

        let me = world.local().unwrap();
        assert_eq!((me.x, me.y), (150.0, 100.0));

        // Camera framing on the next paint follows the authoritative move.
        let offset = camera::compute_offset((1000.0, 1000.0), (200.0, 200.0), (me.x, me.y));
        assert_eq!(offset.x, 50.0);
        assert_eq!(offset.y, 0.0);
    }

    #[test]
    fn player_left_for_unknown_id_is_harmless() {
        let mut world = WorldState::new();
        let mut assets = AvatarAssetCache::new();

        let left = r#"{"action": "player_left", "playerId": "p404"}"#;
        assert!(apply_raw(left, &mut world, &mut assets));
        assert!(world.is_empty());
    }

    #[test]
    fn depth_order_follows_authoritative_positions() {
        let mut world = WorldState::new();
        let mut assets = AvatarAssetCache::new();

        let join = r#"{
            "action": "join_game",
            "success": true,
            "playerId": "p1",
            "players": {
                "p1": {"x": 0, "y": 200},
                "p2": {"x": 0, "y": 50},
                "p3": {"x": 0, "y": 125}
            }
        }"#;
        apply_raw(join, &mut world, &mut assets);

        let order: Vec<&str> = world.depth_sorted().iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec!["p2", "p3", "p1"]);

        let moved = r#"{"action": "players_moved", "players": {"p2": {"y": 500}}}"#;
        apply_raw(moved, &mut world, &mut assets);

        let order: Vec<&str> = world.depth_sorted().iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec!["p3", "p1", "p2"]);
    }
}
