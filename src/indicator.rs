//! LIVE / OFFLINE indicator state machine
//!
//! Consumes liveness verdicts and reports when the underlying media source
//! should be reconnected (every OFFLINE -> LIVE transition).

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum LinkState {
    /// Optimistic initial state until the first verdict arrives.
    #[default]
    Live,
    Offline,
}

/// What changed after feeding a verdict into the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: LinkState,
    pub to: LinkState,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }

    /// The source came back: the stream must be reopened.
    pub fn reconnect(&self) -> bool {
        self.from == LinkState::Offline && self.to == LinkState::Live
    }
}

#[derive(Debug, Clone, Default)]
pub struct LinkIndicator {
    state: LinkState,
}

impl LinkIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_online(&self) -> bool {
        self.state == LinkState::Live
    }

    pub fn apply(&mut self, alive: bool) -> Transition {
        let to = if alive { LinkState::Live } else { LinkState::Offline };
        self.set(to)
    }

    /// Force OFFLINE without a verdict, e.g. on a transport or stream error.
    pub fn mark_offline(&mut self) -> Transition {
        self.set(LinkState::Offline)
    }

    fn set(&mut self, to: LinkState) -> Transition {
        let from = std::mem::replace(&mut self.state, to);
        Transition { from, to }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_live() {
        let ind = LinkIndicator::new();
        assert_eq!(ind.state(), LinkState::Live);
        assert!(ind.is_online());
    }

    #[test]
    fn test_reconnect_only_when_coming_back() {
        let mut ind = LinkIndicator::new();
        assert!(!ind.apply(true).reconnect());

        let down = ind.apply(false);
        assert!(down.changed());
        assert!(!down.reconnect());
        assert!(!ind.apply(false).changed());

        let up = ind.apply(true);
        assert!(up.reconnect());
        assert!(!ind.apply(true).reconnect());
    }

    #[test]
    fn test_mark_offline_then_recover() {
        let mut ind = LinkIndicator::new();
        ind.mark_offline();
        assert_eq!(ind.state(), LinkState::Offline);
        assert!(ind.apply(true).reconnect());
    }

    #[test]
    fn test_state_display_and_parse() {
        assert_eq!(LinkState::Live.to_string(), "LIVE");
        assert_eq!(LinkState::Offline.to_string(), "OFFLINE");
        assert_eq!("OFFLINE".parse::<LinkState>().unwrap(), LinkState::Offline);
        assert!("unknown".parse::<LinkState>().is_err());
    }
}
