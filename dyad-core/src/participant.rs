use serde::{Deserialize, Serialize};

/// Identity of one member of the pair. Chamber numbering follows the lab:
/// participant one sits in chamber 1, participant two in chamber 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantId {
    One,
    Two,
}

impl ParticipantId {
    pub fn other(self) -> ParticipantId {
        match self {
            ParticipantId::One => ParticipantId::Two,
            ParticipantId::Two => ParticipantId::One,
        }
    }

    pub fn chamber(self) -> u8 {
        match self {
            ParticipantId::One => 1,
            ParticipantId::Two => 2,
        }
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParticipantId::One => write!(f, "s1"),
            ParticipantId::Two => write!(f, "s2"),
        }
    }
}

/// Trial role: the acting participant's input is collected and scored, the
/// observing participant passively views the actor's response indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Acting,
    Observing,
}

impl Role {
    pub fn is_acting(self) -> bool {
        matches!(self, Role::Acting)
    }

    /// 1 for acting, 0 for observing; the data file keeps the numeric
    /// state columns.
    pub fn as_flag(self) -> u8 {
        match self {
            Role::Acting => 1,
            Role::Observing => 0,
        }
    }
}

/// Role assignment for one trial. Holding only the actor makes the
/// complementary assignment the only representable one: exactly one
/// participant acts, the other observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolePair {
    acting: ParticipantId,
}

impl RolePair {
    pub fn with_actor(acting: ParticipantId) -> Self {
        Self { acting }
    }

    pub fn actor(self) -> ParticipantId {
        self.acting
    }

    pub fn observer(self) -> ParticipantId {
        self.acting.other()
    }

    pub fn role_of(self, id: ParticipantId) -> Role {
        if id == self.acting {
            Role::Acting
        } else {
            Role::Observing
        }
    }
}

/// Left/right output levels for the shared headphone amp, in percent. The
/// acting participant's side carries the cue; the other channel is muted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StereoBalance {
    pub left_pct: u8,
    pub right_pct: u8,
}

impl StereoBalance {
    pub fn new(left_pct: u8, right_pct: u8) -> Self {
        Self { left_pct, right_pct }
    }
}

impl std::fmt::Display for StereoBalance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // mixer argument form, e.g. "30%,0%"
        write!(f, "{}%,{}%", self.left_pct, self.right_pct)
    }
}

/// Decision-onset cue tone. Both participants hear note A in the grating
/// task; the dot task separates them by pitch instead of channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CueSpec {
    pub note: char,
    pub duration_s: f64,
    pub volume: f64,
}

impl CueSpec {
    pub fn note(note: char) -> Self {
        Self {
            note,
            duration_s: 0.5,
            volume: 0.1,
        }
    }
}
