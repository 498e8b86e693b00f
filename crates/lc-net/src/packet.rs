//! The one packet type the simulation core must interpret (spec §6):
//! everything below it — framing, retransmission, addressing — is out of
//! scope ("Network transport below the level of 'ordered control packets
//! per frame'").

/// One player's input for a given frame. What a "command" string contains
/// (key names, an encoded axis pair, ...) is a client-side concern; the
/// core only needs it attached to a player and a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInput {
    pub player: i32,
    pub command: String,
}

/// The control packet spec §6 names as the only one the core interprets.
/// `deterministic_seed` reseeds every peer's RNG identically for the
/// frame so replays and lockstep clients diverge only from local bugs,
/// never from platform randomness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlSyncTick {
    pub frame: u32,
    pub deterministic_seed: u64,
    pub inputs: Vec<PlayerInput>,
}

impl ControlSyncTick {
    pub fn new(frame: u32, deterministic_seed: u64) -> Self {
        ControlSyncTick { frame, deterministic_seed, inputs: Vec::new() }
    }

    pub fn with_input(mut self, player: i32, command: impl Into<String>) -> Self {
        self.inputs.push(PlayerInput { player, command: command.into() });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_inputs_in_call_order() {
        let tick = ControlSyncTick::new(5, 42).with_input(0, "left").with_input(1, "right");
        assert_eq!(tick.frame, 5);
        assert_eq!(tick.inputs[0].player, 0);
        assert_eq!(tick.inputs[1].command, "right");
    }
}
