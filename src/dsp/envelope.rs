/*
Gain Envelope
=============

Each voice multiplies its oscillator sum by this envelope. It is shaped like
the gain automation of a hardware voice card rather than a textbook ADSR:

  Level
    1.0 ┐   ╱╲
        │  ╱  ╲_____________
    S   │ ╱                 ╲
        │╱                   ╲___
  floor └───────────────────────────→ Time
        A   D    Sustain     Release (exponential)

Vocabulary
----------

  floor       The envelope never starts from exactly 0.0. It starts from
              GAIN_FLOOR (1e-4) so the multiply never feeds denormals into
              the oscillator path. Release decays toward RELEASE_FLOOR.

  ramp        A linear segment from a snapshot level to a target over a
              fixed number of frames. Attack and decay are ramps.

  retrigger   Restart the attack from the CURRENT level instead of the floor.
              A held-then-repressed note swells back up without a click.

  release     Exponential approach toward RELEASE_FLOOR with time constant
              window / 3, so after one window the level is down ~95%.
              The voice's oscillators are stopped at the end of the window
              by the lane, not by the envelope.

State machine
-------------

    Idle ──start──→ Attack ──→ Decay ──→ Sustain
                      ↑                     │
                      └──── retrigger ──────┤
                      ↑                     ↓
                      └──── retrigger ── Release

Release is entered from any stage and never returns to Idle on its own; the
owner calls `reset()` once the voice is silenced.
*/

/// Lowest level an attack starts from.
pub const GAIN_FLOOR: f32 = 1e-4;
/// Level the release decays toward.
pub const RELEASE_FLOOR: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

#[derive(Debug, Clone)]
pub struct GainEnvelope {
    // Shape (frames), fixed at construction
    attack_frames: u32,
    decay_frames: u32,
    sustain_level: f32,

    stage: EnvelopeStage,
    level: f32,

    // Linear ramp bookkeeping for attack/decay
    ramp_start: f32,
    ramp_elapsed: u32,

    // Per-sample multiplier for the exponential release
    release_coeff: f32,
}

impl GainEnvelope {
    pub fn new(attack_frames: u32, decay_frames: u32, sustain_level: f32) -> Self {
        Self {
            attack_frames: attack_frames.max(1),
            decay_frames: decay_frames.max(1),
            sustain_level: sustain_level.clamp(0.0, 1.0),
            stage: EnvelopeStage::Idle,
            level: 0.0,
            ramp_start: 0.0,
            ramp_elapsed: 0,
            release_coeff: 0.0,
        }
    }

    /// Begin a fresh attack from the gain floor.
    pub fn start(&mut self) {
        self.level = GAIN_FLOOR;
        self.begin_attack();
    }

    /// Re-attack from wherever the level currently is.
    pub fn retrigger(&mut self) {
        self.level = self.level.max(GAIN_FLOOR);
        self.begin_attack();
    }

    fn begin_attack(&mut self) {
        self.ramp_start = self.level;
        self.ramp_elapsed = 0;
        self.stage = EnvelopeStage::Attack;
    }

    /// Start the exponential release. `window_frames` is the full release
    /// window; the time constant is a third of it.
    pub fn release(&mut self, window_frames: u32) {
        if self.stage == EnvelopeStage::Idle {
            return;
        }
        let tau = (window_frames.max(3) as f32) / 3.0;
        self.release_coeff = (-1.0 / tau).exp();
        self.stage = EnvelopeStage::Release;
    }

    /// Advance by one sample and return the new level.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }

            EnvelopeStage::Attack => {
                self.ramp_elapsed += 1;
                let progress = self.ramp_elapsed as f32 / self.attack_frames as f32;
                self.level = self.ramp_start + (1.0 - self.ramp_start) * progress.min(1.0);

                if self.ramp_elapsed >= self.attack_frames {
                    self.level = 1.0;
                    self.ramp_start = 1.0;
                    self.ramp_elapsed = 0;
                    self.stage = EnvelopeStage::Decay;
                }
            }

            EnvelopeStage::Decay => {
                self.ramp_elapsed += 1;
                let progress = self.ramp_elapsed as f32 / self.decay_frames as f32;
                self.level =
                    self.ramp_start + (self.sustain_level - self.ramp_start) * progress.min(1.0);

                if self.ramp_elapsed >= self.decay_frames {
                    self.level = self.sustain_level;
                    self.stage = EnvelopeStage::Sustain;
                }
            }

            EnvelopeStage::Sustain => {
                self.level = self.sustain_level;
            }

            EnvelopeStage::Release => {
                self.level = RELEASE_FLOOR + (self.level - RELEASE_FLOOR) * self.release_coeff;
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// Render a block of envelope values into the buffer.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
        self.ramp_start = 0.0;
        self.ramp_elapsed = 0;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(env: &mut GainEnvelope, samples: usize) {
        for _ in 0..samples {
            env.next_sample();
        }
    }

    #[test]
    fn attack_starts_above_zero_and_reaches_full_level() {
        let mut env = GainEnvelope::new(10, 50, 0.85);
        env.start();
        let first = env.next_sample();
        assert!(first > 0.0);

        run(&mut env, 9);
        assert_eq!(env.level(), 1.0);
        assert_eq!(env.stage(), EnvelopeStage::Decay);
    }

    #[test]
    fn decay_settles_on_sustain() {
        let mut env = GainEnvelope::new(10, 50, 0.85);
        env.start();
        run(&mut env, 60);

        assert_eq!(env.stage(), EnvelopeStage::Sustain);
        assert!((env.level() - 0.85).abs() < 1e-6);
    }

    #[test]
    fn retrigger_ramps_from_current_level() {
        let mut env = GainEnvelope::new(10, 50, 0.5);
        env.start();
        run(&mut env, 100);
        env.release(300);
        run(&mut env, 100);
        let before = env.level();

        env.retrigger();
        assert_eq!(env.stage(), EnvelopeStage::Attack);
        let next = env.next_sample();
        assert!(next > before, "retrigger should climb from {before}, got {next}");
        assert!(next < 1.0);
    }

    #[test]
    fn release_decays_exponentially_but_never_below_floor() {
        let mut env = GainEnvelope::new(10, 10, 0.8);
        env.start();
        run(&mut env, 40);

        env.release(300);
        run(&mut env, 300);
        // one full window is three time constants: ~5% remains
        assert!(env.level() < 0.8 * 0.06, "level {}", env.level());

        run(&mut env, 48_000);
        assert!(env.level() >= RELEASE_FLOOR);
        assert!(env.level() < 1e-4);
    }

    #[test]
    fn release_from_idle_is_ignored() {
        let mut env = GainEnvelope::new(10, 10, 0.8);
        env.release(100);
        assert!(!env.is_active());
        assert_eq!(env.next_sample(), 0.0);
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut env = GainEnvelope::new(10, 10, 0.8);
        env.start();
        run(&mut env, 5);
        assert!(env.is_active());

        env.reset();
        assert!(!env.is_active());
        assert_eq!(env.level(), 0.0);
    }
}
