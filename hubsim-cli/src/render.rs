//! Text rendering of hub snapshots.

use std::collections::VecDeque;
use std::fmt::Write;

use hubsim_core::device::{Device, DeviceState};
use hubsim_core::state::SimulationState;
use hubsim_core::walkthrough::WalkthroughStep;
use hubsim_sim::PlaybackFrame;

/// Lines of log history kept on screen.
pub const DEFAULT_SCROLLBACK: usize = 12;

const RULE_WIDTH: usize = 60;

/// Renders header, hub banner and one lane per device.
pub fn render_snapshot(state: &SimulationState) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Tick {:>5}   Collisions: {:<5} Delivered: {}/{} ({:.0}%)",
        state.tick,
        state.collision_count,
        state.total_delivered,
        state.total_messages(),
        state.delivery_progress()
    );
    let _ = writeln!(out, "{:=<RULE_WIDTH$}", "");
    let _ = writeln!(out, "{:^RULE_WIDTH$}", "[ HUB ]");
    let _ = writeln!(out, "{:^RULE_WIDTH$}", state.medium.banner());
    let _ = writeln!(out, "{:-<RULE_WIDTH$}", "");

    let peers = state.devices.len().saturating_sub(1);
    for device in &state.devices {
        out.push_str(&render_lane(device, peers));
        out.push('\n');
    }

    if state.complete {
        let _ = writeln!(out, "{:-<RULE_WIDTH$}", "");
        let _ = writeln!(out, "Every device has greeted every other device.");
    }

    out
}

fn render_lane(device: &Device, peers: usize) -> String {
    let activity = match device.state {
        DeviceState::Backoff => format!("Backoff ({} slots)", device.backoff_remaining),
        state => state.label().to_string(),
    };
    let target = match (device.state, device.current_peer) {
        (DeviceState::Idle, _) | (_, None) => String::new(),
        (_, Some(peer)) => format!("-> {peer}"),
    };

    format!(
        "{:<4}{:<20}{:<8}sent {}/{}",
        device.id.to_string(),
        activity,
        target,
        device.messages_delivered,
        peers
    )
}

/// Scrolling event log fed from successive snapshots.
///
/// Each update appends only entries newer than the last rendered tick, so a
/// line is never shown twice even though every snapshot carries the full
/// bounded log.
#[derive(Debug, Clone)]
pub struct LogPanel {
    lines: VecDeque<String>,
    scrollback: usize,
    last_tick: Option<u64>,
}

impl LogPanel {
    /// Creates empty panel keeping at most `scrollback` lines.
    pub fn new(scrollback: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(scrollback),
            scrollback: scrollback.max(1),
            last_tick: None,
        }
    }

    /// Appends entries newer than the last rendered tick and returns how many were added.
    ///
    /// A snapshot older than the last one seen means the run was restarted;
    /// the panel clears and starts over.
    pub fn update(&mut self, state: &SimulationState) -> usize {
        if self.last_tick.is_some_and(|tick| state.tick < tick) {
            self.lines.clear();
            self.last_tick = None;
        }

        let fresh: Vec<String> = match self.last_tick {
            Some(tick) => state.log.entries_after(tick).map(ToString::to_string).collect(),
            None => state.log.iter().map(ToString::to_string).collect(),
        };
        let added = fresh.len();

        for line in fresh {
            if self.lines.len() == self.scrollback {
                self.lines.pop_front();
            }
            self.lines.push_back(line);
        }
        self.last_tick = Some(state.tick);

        added
    }

    /// Lines currently on screen, oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:-<RULE_WIDTH$}", "-- Event Log ");
        for line in self.lines() {
            let _ = writeln!(out, "{line}");
        }
        out
    }
}

/// Renders one full screen: snapshot followed by the log panel.
pub fn render_frame(state: &SimulationState, panel: &LogPanel) -> String {
    let mut out = render_snapshot(state);
    out.push('\n');
    out.push_str(&panel.render());
    out
}

/// Renders one walkthrough step with the transition that led into it.
pub fn render_walkthrough_frame(frame: &PlaybackFrame<'_>, total: usize) -> String {
    let WalkthroughStep { phase, duration } = frame.step;
    let mut out = String::new();

    if let Some(transition) = frame.via {
        let _ = writeln!(out, "   | {} ({})", transition.label, transition.condition);
        let _ = writeln!(out, "   v");
    }
    let _ = writeln!(
        out,
        "[{}/{}] {:<10} ({} ms)  {}",
        frame.index + 1,
        total,
        phase.label(),
        duration.as_millis(),
        phase.description()
    );

    out
}

#[cfg(test)]
mod tests {
    use hubsim_core::backoff::ScriptedBackoff;
    use hubsim_core::config::SimulationConfig;
    use hubsim_core::transition::advance;

    use super::*;

    fn hub(devices: u8) -> SimulationState {
        SimulationState::initial(&SimulationConfig {
            device_count: devices,
            ..Default::default()
        })
    }

    #[test]
    fn test_initial_snapshot_layout() {
        let frame = render_snapshot(&hub(8));

        assert!(frame.contains("Collisions: 0"));
        assert!(frame.contains("Delivered: 0/56 (0%)"));
        assert!(frame.contains("-- Wire Idle --"));
        assert_eq!(frame.matches("sent 0/7").count(), 8);
    }

    #[test]
    fn test_collision_is_shown_on_banner_and_lanes() {
        let mut backoff = ScriptedBackoff::constant(2);
        let sensing = advance(&hub(2), &mut backoff);
        let collided = advance(&sensing, &mut backoff);

        let frame = render_snapshot(&collided);
        assert!(frame.contains("COLLISION - Signals Interfering"));
        assert_eq!(frame.matches("COLLISION!").count(), 2);
        assert!(frame.contains("-> D2"));
        assert!(frame.contains("Collisions: 2"));
    }

    #[test]
    fn test_header_shows_delivery_progress() {
        let mut state = hub(2);
        state.total_delivered = 1;

        assert!(render_snapshot(&state).contains("Delivered: 1/2 (50%)"));
    }

    #[test]
    fn test_backoff_lane_shows_remaining_slots() {
        let mut state = hub(2);
        state.devices[0].state = DeviceState::Backoff;
        state.devices[0].backoff_remaining = 4;

        let lane = render_lane(&state.devices[0], 1);
        assert!(lane.contains("Backoff (4 slots)"));
    }

    #[test]
    fn test_log_panel_appends_only_new_entries() {
        let mut backoff = ScriptedBackoff::constant(1);
        let mut panel = LogPanel::new(DEFAULT_SCROLLBACK);

        let initial = hub(2);
        assert_eq!(panel.update(&initial), 0);

        let first = advance(&initial, &mut backoff);
        assert_eq!(panel.update(&first), 2);
        // Same snapshot again adds nothing
        assert_eq!(panel.update(&first), 0);

        let second = advance(&first, &mut backoff);
        let added = panel.update(&second);
        assert!(added > 0);
        assert_eq!(panel.lines().count(), 2 + added);
        assert!(panel.lines().any(|line| line.contains("wants to send")));
    }

    #[test]
    fn test_log_panel_scrollback_is_bounded() {
        let mut backoff = ScriptedBackoff::new([1, 3]);
        let mut panel = LogPanel::new(3);
        let mut state = hub(4);

        for _ in 0..20 {
            state = advance(&state, &mut backoff);
            panel.update(&state);
        }

        assert_eq!(panel.lines().count(), 3);
        let newest = state.log.iter().last().map(ToString::to_string);
        assert_eq!(panel.lines().last().map(str::to_string), newest);
    }

    #[test]
    fn test_log_panel_clears_on_restart() {
        let mut backoff = ScriptedBackoff::constant(1);
        let mut panel = LogPanel::new(DEFAULT_SCROLLBACK);

        let mut state = hub(2);
        for _ in 0..3 {
            state = advance(&state, &mut backoff);
            panel.update(&state);
        }
        assert!(panel.lines().count() > 0);

        panel.update(&hub(2));
        assert_eq!(panel.lines().count(), 0);
    }
}
