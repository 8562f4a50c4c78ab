//! # Composed Network Behaviour
//!
//! The transport stack named abstractly in the spec, realized with
//! libp2p: gossipsub for topic routing, mDNS for local peer discovery,
//! identify for peer metadata, and — only when the `relay` Cargo feature
//! is enabled — circuit-relay v2 plus DCUtR for NAT traversal. Noise and
//! Yamux are transport-level concerns configured when the swarm is built
//! (see [`crate::gossip::build_swarm`]), not part of this behaviour.

use libp2p::{gossipsub, identify, mdns, swarm::NetworkBehaviour, Multiaddr, PeerId};
use std::time::Duration;

use crate::error::Result;

/// `libp2p-identify`'s protocol version string for this application.
pub const PROTOCOL_VERSION: &str = "/ghostcore/1.0.0";
/// Agent string reported over identify.
pub const AGENT_VERSION: &str = concat!("ghostcore/", env!("CARGO_PKG_VERSION"));

/// The composed behaviour driving the gossip messaging actor's swarm.
#[derive(NetworkBehaviour)]
pub struct GhostBehaviour {
    pub gossipsub: gossipsub::Behaviour,
    pub mdns: mdns::tokio::Behaviour,
    pub identify: identify::Behaviour,
    #[cfg(feature = "relay")]
    pub relay_client: libp2p::relay::client::Behaviour,
    #[cfg(feature = "relay")]
    pub dcutr: libp2p::dcutr::Behaviour,
}

impl GhostBehaviour {
    /// Build the behaviour for a freshly constructed swarm.
    #[cfg(not(feature = "relay"))]
    pub fn new(
        local_peer_id: PeerId,
        local_public_key: libp2p::identity::PublicKey,
        local_keypair: &libp2p::identity::Keypair,
    ) -> Result<Self> {
        Ok(Self {
            gossipsub: new_gossipsub(local_keypair)?,
            mdns: mdns::tokio::Behaviour::new(mdns::Config::default(), local_peer_id)?,
            identify: new_identify(local_public_key),
        })
    }

    /// Build the behaviour for a freshly constructed swarm, including the
    /// relay-client and DCUtR sub-behaviours (`relay` feature only).
    #[cfg(feature = "relay")]
    pub fn new(
        local_peer_id: PeerId,
        local_public_key: libp2p::identity::PublicKey,
        local_keypair: &libp2p::identity::Keypair,
        relay_client: libp2p::relay::client::Behaviour,
    ) -> Result<Self> {
        Ok(Self {
            gossipsub: new_gossipsub(local_keypair)?,
            mdns: mdns::tokio::Behaviour::new(mdns::Config::default(), local_peer_id)?,
            identify: new_identify(local_public_key),
            relay_client,
            dcutr: libp2p::dcutr::Behaviour::new(local_peer_id),
        })
    }

    /// Subscribe to a gossipsub topic.
    pub fn subscribe(&mut self, topic: &str) -> Result<()> {
        let topic = gossipsub::IdentTopic::new(topic);
        self.gossipsub
            .subscribe(&topic)
            .map_err(|e| crate::error::Error::PublishFailed(e.to_string()))?;
        Ok(())
    }

    /// Publish `data` on `topic`.
    pub fn publish(&mut self, topic: &str, data: Vec<u8>) -> Result<gossipsub::MessageId> {
        let topic = gossipsub::IdentTopic::new(topic);
        self.gossipsub
            .publish(topic, data)
            .map_err(|e| crate::error::Error::PublishFailed(e.to_string()))
    }

    /// Add a peer discovered via mDNS to the gossip mesh. The discovered
    /// address itself needs no separate handling: `mdns::Behaviour`
    /// already feeds it to the swarm's dialer.
    pub fn add_peer_address(&mut self, peer_id: PeerId, _addr: Multiaddr) {
        self.gossipsub.add_explicit_peer(&peer_id);
    }
}

fn new_gossipsub(local_keypair: &libp2p::identity::Keypair) -> Result<gossipsub::Behaviour> {
    let config = gossipsub::ConfigBuilder::default()
        .heartbeat_interval(Duration::from_secs(10))
        .validation_mode(gossipsub::ValidationMode::Strict)
        .build()
        .map_err(|e| crate::error::Error::PublishFailed(e.to_string()))?;

    // Strict validation requires every message to carry a signature, so
    // authenticity must be `Signed`, not `Author` — `Author` never attaches
    // one and `Behaviour::new` would reject this config pairing outright.
    gossipsub::Behaviour::new(
        gossipsub::MessageAuthenticity::Signed(local_keypair.clone()),
        config,
    )
    .map_err(|e| crate::error::Error::PublishFailed(e.to_string()))
}

fn new_identify(local_public_key: libp2p::identity::PublicKey) -> identify::Behaviour {
    identify::Behaviour::new(
        identify::Config::new(PROTOCOL_VERSION.to_string(), local_public_key)
            .with_agent_version(AGENT_VERSION.to_string())
            .with_interval(Duration::from_secs(60)),
    )
}
