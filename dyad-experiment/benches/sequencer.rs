use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

use dyad_core::{
    BreakCommand, Condition, CuePlayer, CueSpec, Frontend, FrontendError, Key, Outcome,
    ParticipantId, Response, Scene, StereoBalance, StimulusSpec,
};
use dyad_experiment::{
    Participants, SessionConfig, TrialIo, TrialPlan, TrialSequencer, plan_block,
};
use dyad_timing::PrecisionTimer;

// Minimal collaborators: free-running flips, silent button boxes
struct NullFrontend;

impl Frontend for NullFrontend {
    fn render(&mut self, _scene: &Scene) -> Result<(), FrontendError> {
        Ok(())
    }
    fn flip(&mut self) -> Result<(), FrontendError> {
        Ok(())
    }
    fn poll_response(&mut self, _who: ParticipantId) -> Option<Key> {
        None
    }
    fn clear_input(&mut self) {}
    fn wait_ack(&mut self) -> Result<(), FrontendError> {
        Ok(())
    }
    fn wait_experimenter(&mut self) -> Result<BreakCommand, FrontendError> {
        Ok(BreakCommand::Continue)
    }
}

struct NullCue;

impl CuePlayer for NullCue {
    fn set_balance(&mut self, _balance: StereoBalance) -> Result<(), FrontendError> {
        Ok(())
    }
    fn play_at(&mut self, _cue: &CueSpec, _when_ns: u64) {}
    fn stop(&mut self) {}
}

fn harness() -> (TrialSequencer, Participants, TrialPlan) {
    let mut config = SessionConfig::grating();
    config.decision_s = 0.5;
    config.feedback_s = 0.2;
    let pair = Participants::for_session(&config, 5, [0.5, 0.5]);
    let sequencer = TrialSequencer::from_config(&config);
    let plan = TrialPlan {
        stimulus: StimulusSpec::Grating {
            condition: Condition::Signal,
        },
        baseline_s: 0.2,
        feedback_patch: None,
    };
    (sequencer, pair, plan)
}

pub fn bench_sequencer(c: &mut Criterion) {
    let mut g = c.benchmark_group("sequencer");
    g.sample_size(60);

    g.bench_function("trial_unanswered", |b| {
        b.iter_batched(
            || (harness(), PrecisionTimer::new(), NullFrontend, NullCue),
            |((sequencer, pair, plan), mut timer, mut frontend, mut cue)| {
                let mut io = TrialIo {
                    frontend: &mut frontend,
                    cue: &mut cue,
                    timer: &mut timer,
                };
                let _ = sequencer.run_trial(black_box(&plan), pair.acting(), None, &mut io);
            },
            BatchSize::SmallInput,
        )
    });

    g.bench_function("plan_block_80", |b| {
        let config = SessionConfig::random_dots();
        b.iter_batched(
            || StdRng::seed_from_u64(1),
            |mut rng| {
                let _ = plan_block(&mut rng, black_box(&config), 80);
            },
            BatchSize::SmallInput,
        )
    });

    g.bench_function("classify", |b| {
        b.iter(|| Outcome::classify(black_box(Condition::Signal), black_box(Response::Yes)))
    });

    g.finish();
}

criterion_group!(benches, bench_sequencer);
criterion_main!(benches);
