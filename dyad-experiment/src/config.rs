use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which task the pair runs this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    /// Signal detection on a noise-embedded grating (yes/no).
    Grating,
    /// Motion discrimination on random dot patches (left/right).
    RandomDots,
}

/// How acting turns are drawn for the main blocks. Practice turns are
/// always balanced so each side acts before the experiment starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnPolicy {
    /// Equal number of turns per side, order shuffled.
    Balanced,
    /// Independent coin flip per trial.
    Random,
}

/// How the auditory turn cue tells the sides apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CueRouting {
    /// Same note for both sides, routed to one ear via the mixer balance.
    Balance,
    /// Distinct note per side (A left chamber, E right chamber).
    Pitch,
}

/// Response-time bounds used to flag implausible decisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RtFlagBounds {
    /// Below this the press likely anticipated the stimulus.
    pub fast_s: f64,
    /// Above this the pair likely disengaged.
    pub slow_s: f64,
}

/// Full parameter set for one dyadic session.
///
/// The two [`Task`] presets carry the values the tasks were run with;
/// a JSON file can override any subset of fields on top of the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Prefix for the data file name.
    pub experiment_name: String,
    pub task: Task,
    pub blocks: usize,
    pub trials_per_block: usize,
    /// Number of unlogged warm-up trials before block one.
    pub practice_trials: usize,
    pub turn_policy: TurnPolicy,
    /// Nominal monitor refresh rate used to convert seconds to frames.
    pub refresh_hz: f64,
    /// Uniform sampling range for the baseline phase, seconds.
    pub baseline_range_s: (f64, f64),
    /// Decision window length, seconds.
    pub decision_s: f64,
    /// Feedback display length, seconds.
    pub feedback_s: f64,
    pub cue_routing: CueRouting,
    pub cue_duration_s: f64,
    pub cue_volume: f64,
    /// Alternative dot patches to draw from, motion task only.
    pub n_patches: Option<usize>,
    /// When unset every trial is flagged NA.
    pub rt_flags: Option<RtFlagBounds>,
    /// Pairs below this id get the mirrored button order.
    pub swap_keys_below_pair: u32,
    /// An experimenter-gated break follows every Nth block.
    pub mandatory_break_every: usize,
    /// Measure the effective refresh rate before the first trial.
    pub verify_refresh: bool,
}

impl SessionConfig {
    /// Parameters of the grating detection task.
    pub fn grating() -> Self {
        Self {
            experiment_name: "DDM".to_owned(),
            task: Task::Grating,
            blocks: 2,
            trials_per_block: 80,
            practice_trials: 2,
            turn_policy: TurnPolicy::Random,
            refresh_hz: 60.0,
            baseline_range_s: (2.0, 4.0),
            decision_s: 2.5,
            feedback_s: 2.0,
            cue_routing: CueRouting::Balance,
            cue_duration_s: 0.5,
            cue_volume: 0.1,
            n_patches: None,
            rt_flags: None,
            swap_keys_below_pair: 13,
            mandatory_break_every: 2,
            verify_refresh: false,
        }
    }

    /// Parameters of the random dot motion task.
    pub fn random_dots() -> Self {
        Self {
            experiment_name: "DDM".to_owned(),
            task: Task::RandomDots,
            blocks: 4,
            trials_per_block: 80,
            practice_trials: 2,
            turn_policy: TurnPolicy::Random,
            refresh_hz: 60.0,
            baseline_range_s: (1.0, 2.0),
            decision_s: 100.0,
            feedback_s: 0.7,
            cue_routing: CueRouting::Pitch,
            cue_duration_s: 0.5,
            cue_volume: 0.1,
            n_patches: Some(3),
            rt_flags: Some(RtFlagBounds { fast_s: 0.1, slow_s: 1.5 }),
            swap_keys_below_pair: 14,
            mandatory_break_every: 2,
            verify_refresh: false,
        }
    }

    /// Preset for a task.
    pub fn preset(task: Task) -> Self {
        match task {
            Task::Grating => Self::grating(),
            Task::RandomDots => Self::random_dots(),
        }
    }

    /// Loads a config from JSON, filling missing fields from the default.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects parameter sets the session cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blocks == 0 {
            return Err(ConfigError::NoBlocks);
        }
        if self.trials_per_block == 0 || self.trials_per_block % 2 != 0 {
            return Err(ConfigError::OddTrials(self.trials_per_block));
        }
        if self.practice_trials % 2 != 0 {
            return Err(ConfigError::OddPractice(self.practice_trials));
        }
        if !(self.refresh_hz > 0.0) {
            return Err(ConfigError::BadRefresh(self.refresh_hz));
        }
        let (lo, hi) = self.baseline_range_s;
        if !(lo >= 0.0 && hi > lo) {
            return Err(ConfigError::BadBaseline(lo, hi));
        }
        if self.decision_s <= 0.0 || self.feedback_s < 0.0 {
            return Err(ConfigError::BadPhase);
        }
        if self.task == Task::RandomDots && self.n_patches.unwrap_or(0) == 0 {
            return Err(ConfigError::NoPatches);
        }
        if self.mandatory_break_every == 0 {
            return Err(ConfigError::BadBreakCadence);
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::grating()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("at least one block is required")]
    NoBlocks,
    #[error("trials per block must be even and non-zero to balance conditions, got {0}")]
    OddTrials(usize),
    #[error("practice trials must be even to balance turns, got {0}")]
    OddPractice(usize),
    #[error("refresh rate must be positive, got {0}")]
    BadRefresh(f64),
    #[error("baseline range is empty or inverted: {0}..{1} s")]
    BadBaseline(f64, f64),
    #[error("decision and feedback phases need a positive duration")]
    BadPhase,
    #[error("the motion task needs at least one dot patch")]
    NoPatches,
    #[error("mandatory break cadence must be at least one block")]
    BadBreakCadence,
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: io::Error,
    },
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
