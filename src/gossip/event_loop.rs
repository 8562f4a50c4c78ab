//! # Gossip Actor Event Loop
//!
//! A single task cooperatively multiplexing three sources, in priority
//! order: swarm events, inbound host commands, and a 60-second
//! maintenance tick. Exactly one source is serviced per iteration; none
//! can starve the others, since each branch of `tokio::select!` is a
//! fair ready-signal.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  loop {                                                                 │
//! │    select! {                                                            │
//! │      swarm.select_next_some()  → handle_swarm_event                    │
//! │      command_rx.recv()         → handle_command                        │
//! │      maintenance_tick.tick()   → ack_table.prune_expired()              │
//! │    }                                                                    │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use futures::StreamExt;
use libp2p::{gossipsub, swarm::SwarmEvent, Swarm};
use tokio::sync::{broadcast, mpsc};

use crate::identity::Vault;

use super::ack_table::AckTable;
use super::behaviour::{GhostBehaviour, GhostBehaviourEvent};
use super::envelope::{inbox_topic, Record};
use super::{GhostCommand, GhostEvent};

const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(60);

/// Drives the swarm until a [`GhostCommand::Shutdown`] is received or the
/// command channel closes.
pub async fn run(
    mut swarm: Swarm<GhostBehaviour>,
    vault: Vault,
    mut command_rx: mpsc::Receiver<GhostCommand>,
    event_tx: broadcast::Sender<GhostEvent>,
) {
    let own_topic = inbox_topic(&vault.public_id());
    if let Err(e) = swarm.behaviour_mut().subscribe(&own_topic) {
        tracing::error!(error = %e, "failed to subscribe to own inbox topic");
        return;
    }

    let mut ack_table = AckTable::new();
    let mut maintenance = tokio::time::interval(MAINTENANCE_INTERVAL);
    maintenance.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    tracing::info!(public_id = %vault.public_id(), "gossip actor started");

    loop {
        tokio::select! {
            event = swarm.select_next_some() => {
                handle_swarm_event(event, &mut swarm, &vault, &mut ack_table, &event_tx);
            }

            command = command_rx.recv() => {
                match command {
                    Some(GhostCommand::Send { target_pk, content, response }) => {
                        let result = handle_send(&mut swarm, &vault, &target_pk, &content, &mut ack_table);
                        let _ = response.send(result);
                    }
                    Some(GhostCommand::Shutdown) | None => {
                        tracing::info!("gossip actor shutting down");
                        break;
                    }
                }
            }

            _ = maintenance.tick() => {
                ack_table.prune_expired();
                tracing::debug!(tracked = ack_table.len(), "maintenance tick: pruned ack table");
            }
        }
    }
}

fn handle_send(
    swarm: &mut Swarm<GhostBehaviour>,
    vault: &Vault,
    target_pk: &[u8; 32],
    content: &str,
    ack_table: &mut AckTable,
) -> crate::error::Result<String> {
    let record = Record::new_message(content);
    let plaintext = record.to_bytes()?;
    let envelope = vault.encrypt_to(target_pk, &plaintext)?;

    let topic = inbox_topic(&bs58::encode(target_pk).into_string());
    swarm.behaviour_mut().publish(&topic, envelope)?;

    ack_table.record_sent(record.id.clone());
    Ok(record.id)
}

fn handle_swarm_event(
    event: SwarmEvent<GhostBehaviourEvent>,
    swarm: &mut Swarm<GhostBehaviour>,
    vault: &Vault,
    ack_table: &mut AckTable,
    event_tx: &broadcast::Sender<GhostEvent>,
) {
    match event {
        SwarmEvent::Behaviour(GhostBehaviourEvent::Gossipsub(gossipsub::Event::Message {
            message,
            ..
        })) => {
            handle_gossip_message(message.data, swarm, vault, ack_table, event_tx);
        }

        SwarmEvent::Behaviour(GhostBehaviourEvent::Mdns(libp2p::mdns::Event::Discovered(
            peers,
        ))) => {
            tracing::debug!(count = peers.len(), "mdns discovered peers");
            for (peer_id, addr) in peers {
                swarm.behaviour_mut().add_peer_address(peer_id, addr);
            }
        }

        SwarmEvent::Behaviour(GhostBehaviourEvent::Mdns(libp2p::mdns::Event::Expired(peers))) => {
            tracing::debug!(count = peers.len(), "mdns peer addresses expired");
        }

        SwarmEvent::Behaviour(GhostBehaviourEvent::Identify(libp2p::identify::Event::Received {
            peer_id,
            ..
        })) => {
            tracing::trace!(%peer_id, "identify received");
        }

        SwarmEvent::NewListenAddr { address, .. } => {
            tracing::info!(%address, "gossip actor listening");
        }

        _ => {}
    }
}

/// Outcome of decoding and dispatching one inbound gossip item, pure of
/// any swarm access so it can be exercised directly in tests.
enum Dispatch {
    /// A message record was received: the host event to emit, plus the
    /// sender to ack.
    Message { event: GhostEvent, sender_pk: [u8; 32], message_id: String },
    /// An ack record resolved a tracked send.
    Acked { event: GhostEvent },
    /// Decryption or parsing failed, or the ack referred to an unknown id.
    Dropped,
}

/// Decrypt and classify an inbound gossip item. Decryption failures are
/// logged and dropped — there is no negative ack.
fn decode_gossip_item(data: &[u8], vault: &Vault, ack_table: &mut AckTable) -> Dispatch {
    let (sender_pk, plaintext) = match vault.decrypt_from(data) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::debug!(error = %e, "dropping gossip item: decryption failed");
            return Dispatch::Dropped;
        }
    };

    let record = match Record::from_bytes(&plaintext) {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(error = %e, "dropping gossip item: malformed record");
            return Dispatch::Dropped;
        }
    };

    if record.is_message() {
        Dispatch::Message {
            event: GhostEvent::GhostMsg {
                id: record.id.clone(),
                from: bs58::encode(sender_pk).into_string(),
                content: record.content.clone().unwrap_or_default(),
                timestamp: record.ts,
            },
            sender_pk,
            message_id: record.id,
        }
    } else if record.is_ack() && ack_table.mark_acked(&record.id) {
        Dispatch::Acked {
            event: GhostEvent::MsgDelivered { id: record.id },
        }
    } else {
        Dispatch::Dropped
    }
}

fn handle_gossip_message(
    data: Vec<u8>,
    swarm: &mut Swarm<GhostBehaviour>,
    vault: &Vault,
    ack_table: &mut AckTable,
    event_tx: &broadcast::Sender<GhostEvent>,
) {
    match decode_gossip_item(&data, vault, ack_table) {
        Dispatch::Message { event, sender_pk, message_id } => {
            let _ = event_tx.send(event);
            if let Err(e) = send_ack(swarm, vault, &sender_pk, &message_id) {
                tracing::warn!(error = %e, "failed to publish ack");
            }
        }
        Dispatch::Acked { event } => {
            let _ = event_tx.send(event);
        }
        Dispatch::Dropped => {}
    }
}

fn send_ack(
    swarm: &mut Swarm<GhostBehaviour>,
    vault: &Vault,
    sender_pk: &[u8; 32],
    message_id: &str,
) -> crate::error::Result<()> {
    let ack = Record::new_ack(message_id);
    let plaintext = ack.to_bytes()?;
    let envelope = vault.encrypt_to(sender_pk, &plaintext)?;
    let topic = inbox_topic(&bs58::encode(sender_pk).into_string());
    swarm.behaviour_mut().publish(&topic, envelope)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_gossip_item_unparseable_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let vault = Vault::init_at(dir.path().join("identity.enc"), "pw").unwrap();
        let mut table = AckTable::new();

        assert!(matches!(
            decode_gossip_item(&[1, 2, 3], &vault, &mut table),
            Dispatch::Dropped
        ));
    }

    #[test]
    fn test_decode_gossip_item_dispatches_message_event() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let alice = Vault::init_at(dir_a.path().join("identity.enc"), "pw-a").unwrap();
        let bob = Vault::init_at(dir_b.path().join("identity.enc"), "pw-b").unwrap();

        let record = Record::new_message("hi bob");
        let plaintext = record.to_bytes().unwrap();
        let envelope = alice.encrypt_to(&bob.public_key_bytes(), &plaintext).unwrap();

        let mut table = AckTable::new();
        match decode_gossip_item(&envelope, &bob, &mut table) {
            Dispatch::Message { event: GhostEvent::GhostMsg { content, .. }, sender_pk, .. } => {
                assert_eq!(content, "hi bob");
                assert_eq!(sender_pk, alice.public_key_bytes());
            }
            _ => panic!("expected a Message dispatch"),
        }
    }

    #[test]
    fn test_decode_gossip_item_dispatches_ack_when_tracked() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let alice = Vault::init_at(dir_a.path().join("identity.enc"), "pw-a").unwrap();
        let bob = Vault::init_at(dir_b.path().join("identity.enc"), "pw-b").unwrap();

        let mut table = AckTable::new();
        table.record_sent("m1");

        let ack = Record::new_ack("m1");
        let envelope = bob
            .encrypt_to(&alice.public_key_bytes(), &ack.to_bytes().unwrap())
            .unwrap();

        match decode_gossip_item(&envelope, &alice, &mut table) {
            Dispatch::Acked { event: GhostEvent::MsgDelivered { id } } => assert_eq!(id, "m1"),
            _ => panic!("expected an Acked dispatch"),
        }
    }

    #[test]
    fn test_decode_gossip_item_ack_for_unknown_id_is_dropped() {
        let dir_a = tempfile::tempdir().unwrap();
        let dir_b = tempfile::tempdir().unwrap();
        let alice = Vault::init_at(dir_a.path().join("identity.enc"), "pw-a").unwrap();
        let bob = Vault::init_at(dir_b.path().join("identity.enc"), "pw-b").unwrap();

        let mut table = AckTable::new();
        let ack = Record::new_ack("unknown");
        let envelope = bob
            .encrypt_to(&alice.public_key_bytes(), &ack.to_bytes().unwrap())
            .unwrap();

        assert!(matches!(
            decode_gossip_item(&envelope, &alice, &mut table),
            Dispatch::Dropped
        ));
    }
}
