use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Serialize, Serializer};
use thiserror::Error;

use dyad_core::{Condition, Direction, Outcome, ParticipantId, Response, RolePair, RtFlag};

use crate::schedule::TrialPlan;
use crate::sequencer::TrialCapture;

/// One row of the wide-format data file. Field order is column order.
///
/// Both task variants share the layout: the grating task leaves `direction`
/// empty, the motion task leaves `condition` empty. The analysis scripts key
/// on the acting-state columns, so those stay numeric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialRecord {
    pub pair: u32,
    pub block: usize,
    /// 1-based index within the block.
    pub trial: usize,
    /// 1-based index within the session.
    pub total_trial: usize,
    pub s1_state: u8,
    pub s2_state: u8,
    pub condition: Option<Condition>,
    pub direction: Option<Direction>,
    pub response: Response,
    #[serde(serialize_with = "serialize_rt")]
    pub rt: Option<f64>,
    pub rt_flag: RtFlag,
}

/// Missed windows keep the literal `None` the analysis scripts expect,
/// not an empty field.
fn serialize_rt<S: Serializer>(rt: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match rt {
        Some(v) => serializer.serialize_f64(*v),
        None => serializer.serialize_str("None"),
    }
}

impl TrialRecord {
    pub fn new(
        pair: u32,
        block: usize,
        trial: usize,
        total_trial: usize,
        roles: RolePair,
        plan: &TrialPlan,
        capture: &TrialCapture,
    ) -> Self {
        Self {
            pair,
            block,
            trial,
            total_trial,
            s1_state: roles.role_of(ParticipantId::One).as_flag(),
            s2_state: roles.role_of(ParticipantId::Two).as_flag(),
            condition: plan.stimulus.condition(),
            direction: plan.stimulus.direction(),
            response: capture.response,
            rt: capture.rt,
            rt_flag: capture.rt_flag,
        }
    }

    /// The response this row's stimulus called for.
    pub fn expected_response(&self) -> Option<Response> {
        match (self.condition, self.direction) {
            (Some(Condition::Signal), _) => Some(Response::Yes),
            (Some(Condition::Noise), _) => Some(Response::No),
            (None, Some(d)) => Some(d.as_response()),
            (None, None) => None,
        }
    }

    /// Signal-detection outcome, grating rows only.
    pub fn outcome(&self) -> Option<Outcome> {
        self.condition
            .map(|c| Outcome::classify(c, self.response))
    }

    pub fn is_correct(&self) -> bool {
        self.expected_response()
            .is_some_and(|expected| expected == self.response)
    }
}

/// Append-only CSV writer for the session's data file. Every row is flushed
/// as it is written so an interrupted session keeps all finished trials.
pub struct SessionLog {
    writer: csv::Writer<File>,
    path: PathBuf,
}

impl SessionLog {
    /// Opens `<dir>/<experiment>_pair<id>_<timestamp>.csv`, creating the
    /// directory if needed.
    pub fn create(dir: &Path, experiment: &str, pair_id: u32) -> Result<Self, LogError> {
        let stamp = Local::now().format("%Y-%m-%d_%H%M%S");
        let path = dir.join(format!("{experiment}_pair{pair_id}_{stamp}.csv"));
        std::fs::create_dir_all(dir).map_err(|source| LogError::Create {
            path: path.clone(),
            source: csv::Error::from(source),
        })?;
        Self::at_path(path)
    }

    /// Opens the data file at an explicit path.
    pub fn at_path(path: PathBuf) -> Result<Self, LogError> {
        let writer = csv::Writer::from_path(&path).map_err(|source| LogError::Create {
            path: path.clone(),
            source,
        })?;
        Ok(Self { writer, path })
    }

    pub fn append(&mut self, record: &TrialRecord) -> Result<(), LogError> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("cannot create data file {path}: {source}")]
    Create {
        path: PathBuf,
        source: csv::Error,
    },
    #[error("cannot append trial row: {0}")]
    Append(#[from] csv::Error),
    #[error("cannot flush data file: {0}")]
    Flush(#[from] std::io::Error),
}

/// Per-outcome trial counts for the grating task's signal-detection cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutcomeCounts {
    pub hits: usize,
    pub misses: usize,
    pub false_alarms: usize,
    pub correct_rejects: usize,
    pub no_responses: usize,
}

impl OutcomeCounts {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Hit => self.hits += 1,
            Outcome::Miss => self.misses += 1,
            Outcome::FalseAlarm => self.false_alarms += 1,
            Outcome::CorrectReject => self.correct_rejects += 1,
            Outcome::NoResponse => self.no_responses += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.hits + self.misses + self.false_alarms + self.correct_rejects + self.no_responses
    }
}

/// End-of-session digest printed for the experimenter. Derived purely from
/// the logged rows; the data file stays the source of truth.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub trials: usize,
    pub responded: usize,
    pub correct: usize,
    pub outcomes: OutcomeCounts,
    pub mean_rt_s: Option<f64>,
    pub min_rt_s: Option<f64>,
    pub max_rt_s: Option<f64>,
}

impl SessionSummary {
    pub fn from_records(records: &[TrialRecord]) -> Self {
        let mut outcomes = OutcomeCounts::default();
        let mut rts = Vec::new();
        let mut correct = 0;
        let mut responded = 0;
        for record in records {
            if record.response != Response::NoResponse {
                responded += 1;
            }
            if record.is_correct() {
                correct += 1;
            }
            if let Some(outcome) = record.outcome() {
                outcomes.record(outcome);
            }
            if let Some(rt) = record.rt {
                rts.push(rt);
            }
        }
        let (mean, min, max) = if rts.is_empty() {
            (None, None, None)
        } else {
            let mean = rts.iter().sum::<f64>() / rts.len() as f64;
            let min = rts.iter().copied().fold(f64::INFINITY, f64::min);
            let max = rts.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (Some(mean), Some(min), Some(max))
        };
        Self {
            trials: records.len(),
            responded,
            correct,
            outcomes,
            mean_rt_s: mean,
            min_rt_s: min,
            max_rt_s: max,
        }
    }

    /// Fraction of trials answered correctly; `None` before any trial ran.
    pub fn accuracy(&self) -> Option<f64> {
        (self.trials > 0).then(|| self.correct as f64 / self.trials as f64)
    }

    pub fn response_rate(&self) -> Option<f64> {
        (self.trials > 0).then(|| self.responded as f64 / self.trials as f64)
    }
}

#[cfg(test)]
mod tests {
    use dyad_core::{ParticipantId, StimulusSpec};

    use super::*;

    fn grating_record(
        trial: usize,
        condition: Condition,
        response: Response,
        rt: Option<f64>,
    ) -> TrialRecord {
        let plan = TrialPlan {
            stimulus: StimulusSpec::Grating { condition },
            baseline_s: 3.0,
            feedback_patch: None,
        };
        let capture = TrialCapture {
            response,
            rt,
            rt_flag: RtFlag::Na,
            decision_frames: 10,
        };
        TrialRecord::new(
            12,
            1,
            trial,
            trial,
            RolePair::with_actor(ParticipantId::One),
            &plan,
            &capture,
        )
    }

    #[test]
    fn rows_serialize_in_the_expected_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut log = SessionLog::at_path(path.clone()).unwrap();
        log.append(&grating_record(1, Condition::Signal, Response::Yes, Some(0.5)))
            .unwrap();
        log.append(&grating_record(2, Condition::Noise, Response::NoResponse, None))
            .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let mut lines = raw.lines();
        assert_eq!(
            lines.next().unwrap(),
            "pair,block,trial,total_trial,s1_state,s2_state,condition,direction,response,rt,rt_flag"
        );
        assert_eq!(lines.next().unwrap(), "12,1,1,1,1,0,signal,,yes,0.5,NA");
        assert_eq!(lines.next().unwrap(), "12,1,2,2,1,0,noise,,noresponse,None,NA");
    }

    #[test]
    fn motion_rows_fill_direction_instead_of_condition() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut log = SessionLog::at_path(path.clone()).unwrap();

        let plan = TrialPlan {
            stimulus: StimulusSpec::RandomDots {
                direction: Direction::Left,
                patch: 2,
            },
            baseline_s: 1.5,
            feedback_patch: Some(1),
        };
        let capture = TrialCapture {
            response: Response::Left,
            rt: Some(0.42),
            rt_flag: RtFlag::Fast,
            decision_frames: 25,
        };
        let record = TrialRecord::new(
            3,
            2,
            5,
            85,
            RolePair::with_actor(ParticipantId::Two),
            &plan,
            &capture,
        );
        log.append(&record).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert_eq!(raw.lines().nth(1).unwrap(), "3,2,5,85,0,1,,left,left,0.42,fast");
    }

    #[test]
    fn data_file_name_carries_experiment_and_pair() {
        let dir = tempfile::tempdir().unwrap();
        let log = SessionLog::create(dir.path(), "DDM", 7).unwrap();
        let name = log.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("DDM_pair7_"), "{name}");
        assert!(name.ends_with(".csv"), "{name}");
    }

    #[test]
    fn expected_response_and_outcome_per_row() {
        let hit = grating_record(1, Condition::Signal, Response::Yes, Some(0.4));
        assert_eq!(hit.expected_response(), Some(Response::Yes));
        assert_eq!(hit.outcome(), Some(Outcome::Hit));
        assert!(hit.is_correct());

        let lapse = grating_record(2, Condition::Noise, Response::NoResponse, None);
        assert_eq!(lapse.outcome(), Some(Outcome::NoResponse));
        assert!(!lapse.is_correct());
    }

    #[test]
    fn summary_counts_outcomes_and_rts() {
        let records = vec![
            grating_record(1, Condition::Signal, Response::Yes, Some(0.4)),
            grating_record(2, Condition::Signal, Response::No, Some(0.8)),
            grating_record(3, Condition::Noise, Response::No, Some(0.6)),
            grating_record(4, Condition::Noise, Response::NoResponse, None),
        ];
        let summary = SessionSummary::from_records(&records);

        assert_eq!(summary.trials, 4);
        assert_eq!(summary.responded, 3);
        assert_eq!(summary.correct, 2);
        assert_eq!(summary.outcomes.hits, 1);
        assert_eq!(summary.outcomes.misses, 1);
        assert_eq!(summary.outcomes.correct_rejects, 1);
        assert_eq!(summary.outcomes.no_responses, 1);
        assert_eq!(summary.outcomes.total(), 4);
        assert_eq!(summary.accuracy(), Some(0.5));
        assert_eq!(summary.response_rate(), Some(0.75));
        assert_eq!(summary.min_rt_s, Some(0.4));
        assert_eq!(summary.max_rt_s, Some(0.8));
        assert!((summary.mean_rt_s.unwrap() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn empty_summary_has_no_rates() {
        let summary = SessionSummary::from_records(&[]);
        assert_eq!(summary.accuracy(), None);
        assert_eq!(summary.response_rate(), None);
        assert_eq!(summary.mean_rt_s, None);
    }
}
