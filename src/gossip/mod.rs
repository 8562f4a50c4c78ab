//! # Gossip Messaging Actor
//!
//! Runs the peer-to-peer overlay on a dedicated task, serializing all
//! swarm mutations through a single event loop; encrypts/decrypts
//! application messages via the identity vault; tracks delivery
//! acknowledgements; emits observable events to the host.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GhostActor::start(vault)                                               │
//! │    1. derive Ed25519 transport seed from vault's X25519 secret         │
//! │    2. build swarm: TCP + Noise + Yamux + gossipsub/mdns/identify       │
//! │    3. spawn event_loop::run                                            │
//! │    4. return GhostHandle { command_tx, event_tx }                       │
//! │                                                                         │
//! │  handle.send(target_pk_base58, content) → message_id                   │
//! │  handle.subscribe() → broadcast::Receiver<GhostEvent>                  │
//! │  handle.shutdown()                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod ack_table;
mod behaviour;
mod envelope;
mod event_loop;

pub use envelope::inbox_topic;

use std::time::Duration;

use libp2p::{identity::Keypair as Libp2pKeypair, noise, yamux, PeerId, SwarmBuilder};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::crypto::kdf::derive_transport_seed;
use crate::error::{Error, Result};
use crate::identity::Vault;

use behaviour::GhostBehaviour;

/// Default capacity of the host-facing command and event channels.
const CHANNEL_CAPACITY: usize = 256;

/// A command sent from the host into the actor's event loop.
pub enum GhostCommand {
    /// `send(target_pk, content)`.
    Send {
        target_pk: [u8; 32],
        content: String,
        response: oneshot::Sender<Result<String>>,
    },
    /// Terminal command: the loop drains best-effort and exits.
    Shutdown,
}

/// An event emitted asynchronously from the actor to the host.
#[derive(Debug, Clone)]
pub enum GhostEvent {
    /// A decrypted inbound message.
    GhostMsg {
        id: String,
        from: String,
        content: String,
        timestamp: i64,
    },
    /// A previously sent message was acknowledged.
    MsgDelivered { id: String },
}

/// Host-facing handle to a running gossip actor. Cheaply `Clone`: both
/// fields are channel senders, so every clone talks to the same actor
/// task.
#[derive(Clone)]
pub struct GhostHandle {
    command_tx: mpsc::Sender<GhostCommand>,
    event_tx: broadcast::Sender<GhostEvent>,
}

impl GhostHandle {
    /// `start()`. Builds the swarm from the vault's derived transport
    /// identity, subscribes to the own inbox topic, and spawns the event
    /// loop. Idempotent at the call-site: the engine facade (not this
    /// type) tracks whether an instance already exists and maps a
    /// duplicate call to `AlreadyRunning`.
    pub fn start(vault: Vault) -> Result<Self> {
        let transport_seed = derive_transport_seed(&vault.secret_key_bytes());
        let libp2p_keypair = keypair_from_seed(&transport_seed)?;
        let peer_id = PeerId::from(libp2p_keypair.public());

        tracing::info!(%peer_id, public_id = %vault.public_id(), "gossip actor peer identity derived");

        let swarm = build_swarm(libp2p_keypair)?;

        let (command_tx, command_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (event_tx, _) = broadcast::channel(CHANNEL_CAPACITY);

        let loop_event_tx = event_tx.clone();
        tokio::spawn(async move {
            event_loop::run(swarm, vault, command_rx, loop_event_tx).await;
        });

        Ok(Self { command_tx, event_tx })
    }

    /// `send(target_pk_base58, content) → message_id`.
    pub async fn send(&self, target_pk_base58: &str, content: impl Into<String>) -> Result<String> {
        let target_pk = parse_public_key(target_pk_base58)?;
        let (tx, rx) = oneshot::channel();

        self.command_tx
            .send(GhostCommand::Send {
                target_pk,
                content: content.into(),
                response: tx,
            })
            .await
            .map_err(|_| Error::NotRunning)?;

        rx.await.map_err(|_| Error::NotRunning)?
    }

    /// Subscribe to the actor's event stream. Multiple subscribers are
    /// supported.
    pub fn subscribe(&self) -> broadcast::Receiver<GhostEvent> {
        self.event_tx.subscribe()
    }

    /// `shutdown()`. Best-effort: the loop drains outstanding publishes
    /// within an implementation-defined bound before exiting.
    pub async fn shutdown(&self) {
        let _ = self.command_tx.send(GhostCommand::Shutdown).await;
    }
}

/// Decode and validate a base58 target public key, per `send`'s
/// `InvalidRecipient` contract.
fn parse_public_key(base58: &str) -> Result<[u8; 32]> {
    let bytes = bs58::decode(base58)
        .into_vec()
        .map_err(|_| Error::InvalidRecipient("not valid base58".into()))?;
    bytes
        .try_into()
        .map_err(|_| Error::InvalidRecipient("expected a 32-byte public key".into()))
}

/// Derive a libp2p Ed25519 keypair from a 32-byte seed.
fn keypair_from_seed(seed: &[u8; 32]) -> Result<Libp2pKeypair> {
    let secret = libp2p::identity::ed25519::SecretKey::try_from_bytes(*seed)
        .map_err(|e| Error::PublishFailed(format!("invalid transport seed: {e}")))?;
    let ed25519_keypair = libp2p::identity::ed25519::Keypair::from(secret);
    Ok(Libp2pKeypair::from(ed25519_keypair))
}

/// Build the libp2p swarm: TCP transport, Noise handshake, Yamux
/// multiplexing, DNS resolution, and the composed [`GhostBehaviour`].
#[cfg(not(feature = "relay"))]
fn build_swarm(keypair: Libp2pKeypair) -> Result<libp2p::Swarm<GhostBehaviour>> {
    let public_key = keypair.public();

    let mut swarm = SwarmBuilder::with_existing_identity(keypair)
        .with_tokio()
        .with_tcp(
            libp2p::tcp::Config::default(),
            noise::Config::new,
            yamux::Config::default,
        )
        .map_err(|e| Error::PublishFailed(format!("failed to configure TCP transport: {e}")))?
        .with_dns()
        .map_err(|e| Error::PublishFailed(format!("failed to configure DNS: {e}")))?
        .with_behaviour(|key| {
            let peer_id = PeerId::from(public_key.clone());
            GhostBehaviour::new(peer_id, public_key.clone(), key)
        })
        .map_err(|e| Error::PublishFailed(format!("failed to build behaviour: {e}")))?
        .with_swarm_config(|cfg| cfg.with_idle_connection_timeout(Duration::from_secs(60)))
        .build();

    swarm
        .listen_on("/ip4/0.0.0.0/tcp/0".parse().unwrap())
        .map_err(|e| Error::PublishFailed(format!("failed to listen: {e}")))?;

    Ok(swarm)
}

/// Build the libp2p swarm with relay-client and DCUtR wired in
/// (`relay` feature only), for NAT traversal.
#[cfg(feature = "relay")]
fn build_swarm(keypair: Libp2pKeypair) -> Result<libp2p::Swarm<GhostBehaviour>> {
    let public_key = keypair.public();

    let mut swarm = SwarmBuilder::with_existing_identity(keypair)
        .with_tokio()
        .with_tcp(
            libp2p::tcp::Config::default(),
            noise::Config::new,
            yamux::Config::default,
        )
        .map_err(|e| Error::PublishFailed(format!("failed to configure TCP transport: {e}")))?
        .with_dns()
        .map_err(|e| Error::PublishFailed(format!("failed to configure DNS: {e}")))?
        .with_relay_client(noise::Config::new, yamux::Config::default)
        .map_err(|e| Error::PublishFailed(format!("failed to configure relay client: {e}")))?
        .with_behaviour(|key, relay_client| {
            let peer_id = PeerId::from(public_key.clone());
            GhostBehaviour::new(peer_id, public_key.clone(), key, relay_client)
        })
        .map_err(|e| Error::PublishFailed(format!("failed to build behaviour: {e}")))?
        .with_swarm_config(|cfg| cfg.with_idle_connection_timeout(Duration::from_secs(60)))
        .build();

    swarm
        .listen_on("/ip4/0.0.0.0/tcp/0".parse().unwrap())
        .map_err(|e| Error::PublishFailed(format!("failed to listen: {e}")))?;

    Ok(swarm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_public_key_rejects_invalid_base58() {
        assert!(matches!(
            parse_public_key("not-valid-base58!!"),
            Err(Error::InvalidRecipient(_))
        ));
    }

    #[test]
    fn test_parse_public_key_rejects_wrong_length() {
        let short = bs58::encode([1u8; 16]).into_string();
        assert!(matches!(parse_public_key(&short), Err(Error::InvalidRecipient(_))));
    }

    #[test]
    fn test_parse_public_key_accepts_32_bytes() {
        let bytes = [7u8; 32];
        let encoded = bs58::encode(bytes).into_string();
        assert_eq!(parse_public_key(&encoded).unwrap(), bytes);
    }

    #[test]
    fn test_keypair_from_seed_is_deterministic() {
        let seed = [3u8; 32];
        let a = keypair_from_seed(&seed).unwrap();
        let b = keypair_from_seed(&seed).unwrap();
        assert_eq!(
            PeerId::from(a.public()),
            PeerId::from(b.public())
        );
    }
}
