use dyad_core::{
    ButtonMap, CueSpec, Key, ParticipantId, Response, Role, RolePair, StereoBalance,
};

use crate::config::{CueRouting, SessionConfig, Task};

/// One member of the pair with everything the trial loop needs to address
/// them: their button box, their cue, and the mixer setting for the trials
/// they act in.
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: ParticipantId,
    /// Titrated stimulus intensity from the calibration run.
    pub threshold: f64,
    pub buttons: ButtonMap,
    /// Mixer balance that routes the cue to this participant's ear.
    pub acting_balance: StereoBalance,
    pub cue: CueSpec,
    pub role: Role,
}

/// The pair, fully wired for a session. Role bookkeeping lives here so the
/// "exactly one actor" rule cannot be broken piecemeal.
#[derive(Debug, Clone)]
pub struct Participants {
    pub one: Participant,
    pub two: Participant,
}

impl Participants {
    /// Builds both participants from the task parameters.
    ///
    /// `thresholds` come from the chamber titration files, in chamber order.
    /// Which physical key carries which label is counterbalanced across
    /// pairs: low pair ids get the mirrored order.
    pub fn for_session(config: &SessionConfig, pair_id: u32, thresholds: [f64; 2]) -> Self {
        let swap = pair_id < config.swap_keys_below_pair;
        let labels = match config.task {
            Task::Grating if swap => [Response::No, Response::Yes],
            Task::Grating => [Response::Yes, Response::No],
            Task::RandomDots if swap => [Response::Right, Response::Left],
            Task::RandomDots => [Response::Left, Response::Right],
        };

        let mut pair = Self {
            one: Participant {
                id: ParticipantId::One,
                threshold: thresholds[0],
                buttons: ButtonMap::new([Key('1'), Key('2')], labels),
                // chamber 1 listens on the right channel
                acting_balance: StereoBalance::new(0, 30),
                cue: cue_for(config, ParticipantId::One),
                role: Role::Observing,
            },
            two: Participant {
                id: ParticipantId::Two,
                threshold: thresholds[1],
                buttons: ButtonMap::new([Key('8'), Key('7')], labels),
                acting_balance: StereoBalance::new(30, 0),
                cue: cue_for(config, ParticipantId::Two),
                role: Role::Observing,
            },
        };
        // fresh pairs start with a definite actor so the invariant holds
        // before the first trial assignment
        pair.assign(RolePair::with_actor(ParticipantId::One));
        pair
    }

    /// Applies a trial's role assignment to both members.
    pub fn assign(&mut self, roles: RolePair) {
        self.one.role = roles.role_of(ParticipantId::One);
        self.two.role = roles.role_of(ParticipantId::Two);
    }

    pub fn get(&self, id: ParticipantId) -> &Participant {
        match id {
            ParticipantId::One => &self.one,
            ParticipantId::Two => &self.two,
        }
    }

    pub fn acting(&self) -> &Participant {
        if self.one.role.is_acting() {
            &self.one
        } else {
            &self.two
        }
    }

    pub fn roles(&self) -> RolePair {
        RolePair::with_actor(self.acting().id)
    }
}

fn cue_for(config: &SessionConfig, id: ParticipantId) -> CueSpec {
    let note = match config.cue_routing {
        CueRouting::Balance => 'A',
        CueRouting::Pitch => match id {
            ParticipantId::One => 'A',
            ParticipantId::Two => 'E',
        },
    };
    CueSpec {
        note,
        duration_s: config.cue_duration_s,
        volume: config.cue_volume,
    }
}
