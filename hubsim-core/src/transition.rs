//! One-tick state transition of the hub.
//!
//! A tick runs in two phases so that iteration order never matters:
//! every device first decides its move against the previous snapshot, then
//! the set of devices that ended up transmitting is inspected to resolve
//! collisions or deliveries.

use crate::backoff::BackoffSource;
use crate::device::{Device, DeviceId, DeviceState};
use crate::medium::MediumState;
use crate::state::{EventLog, LogEvent, SimulationState};

/// Computes the snapshot one tick after `state`.
///
/// Completed states are returned unchanged. The backoff source is consulted
/// once for every device leaving the jamming state.
pub fn advance(state: &SimulationState, backoff: &mut dyn BackoffSource) -> SimulationState {
    if state.complete {
        return state.clone();
    }

    let mut next = state.clone();
    next.tick = state.tick + 1;
    next.transmitters.clear();
    let _tick = tracing::trace_span!("tick", tick = next.tick).entered();

    for device in &mut next.devices {
        let wire_occupied = state
            .devices
            .iter()
            .any(|other| other.id != device.id && other.state.occupies_wire());
        plan_move(device, wire_occupied, backoff, &mut next.log, next.tick);
    }

    resolve_transmissions(&mut next);

    next.medium = MediumState::derive(
        next.transmitters.len(),
        next.count_in(DeviceState::Jamming),
    );

    next.complete = next.all_finished();
    if next.complete {
        next.log.push(
            next.tick,
            LogEvent::Finished {
                messages: next.total_delivered,
                ticks: next.tick,
            },
        );
        tracing::debug!(
            "Hub finished: {} messages in {} ticks, {} collisions",
            next.total_delivered,
            next.tick,
            next.collision_count
        );
    }

    next
}

/// Phase one: moves a single device according to its own state.
fn plan_move(
    device: &mut Device,
    wire_occupied: bool,
    backoff: &mut dyn BackoffSource,
    log: &mut EventLog,
    tick: u64,
) {
    let id = device.id;

    match device.state {
        DeviceState::Idle => {
            if let Some(&peer) = device.pending_peers.first() {
                device.state = DeviceState::Sensing;
                device.current_peer = Some(peer);
                log.push(tick, LogEvent::WantsToSend { device: id, peer });
            }
        }
        DeviceState::Sensing => {
            if wire_occupied {
                log.push(tick, LogEvent::WireBusy { device: id });
                return;
            }

            match device
                .current_peer
                .or_else(|| device.pending_peers.first().copied())
            {
                Some(peer) => {
                    device.current_peer = Some(peer);
                    device.state = DeviceState::Transmitting;
                    log.push(tick, LogEvent::Transmitting { device: id, peer });
                }
                None => device.state = DeviceState::Idle,
            }
        }
        // Resolved in phase two
        DeviceState::Transmitting => {}
        DeviceState::Collision => {
            device.state = DeviceState::Jamming;
            log.push(tick, LogEvent::Jamming { device: id });
        }
        DeviceState::Jamming => {
            let slots = backoff.draw_slots(id).max(1);
            device.state = DeviceState::Backoff;
            device.backoff_remaining = slots;
            log.push(tick, LogEvent::BackingOff { device: id, slots });
        }
        DeviceState::Backoff => {
            if device.backoff_remaining > 1 {
                device.backoff_remaining -= 1;
            } else {
                device.state = DeviceState::Sensing;
                device.backoff_remaining = 0;
                log.push(tick, LogEvent::Retrying { device: id });
            }
        }
    }
}

/// Phase two: collides simultaneous transmitters or delivers a lone one.
fn resolve_transmissions(next: &mut SimulationState) {
    let transmitters: Vec<DeviceId> = next
        .devices
        .iter()
        .filter(|device| device.state == DeviceState::Transmitting)
        .map(|device| device.id)
        .collect();

    let tick = next.tick;
    match transmitters.len() {
        0 => {}
        1 => {
            for device in &mut next.devices {
                if device.state != DeviceState::Transmitting {
                    continue;
                }
                let from = device.id;
                if let Some(to) = device.complete_delivery() {
                    next.total_delivered += 1;
                    next.log.push(tick, LogEvent::Delivered { from, to });
                }
            }
        }
        count => {
            tracing::trace!("Tick {tick}: {count} devices collided");
            for device in &mut next.devices {
                if device.state != DeviceState::Transmitting {
                    continue;
                }
                device.state = DeviceState::Collision;
                next.collision_count += 1;
                next.log
                    .push(tick, LogEvent::Collided { device: device.id });
            }
        }
    }

    next.transmitters = transmitters;
}
