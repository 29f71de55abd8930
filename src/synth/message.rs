use log::warn;
use rtrb::{Producer, PushError};

/// Control → render instruction for one lane.
///
/// Every frame field is in audio-clock frames. `epoch` identifies which
/// stop/retrigger request a later `RenderReport` answers.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum VoiceCommand {
    /// Start the lane's oscillators and attack from the gain floor.
    Start {
        lane: usize,
        epoch: u32,
        base_frequency: f64,
    },
    /// Re-attack from the current gain, cancelling any pending stop.
    Retrigger { lane: usize, epoch: u32 },
    /// Release over `release_frames`, silence the oscillators at `stop_at`
    /// and report once a block ends at or after `dispose_at`.
    Stop {
        lane: usize,
        epoch: u32,
        release_frames: u32,
        stop_at: u64,
        dispose_at: u64,
    },
    /// Hard silence at the next block boundary. Never reported.
    Kill { lane: usize },
}

impl VoiceCommand {
    pub fn lane(&self) -> usize {
        match *self {
            VoiceCommand::Start { lane, .. }
            | VoiceCommand::Retrigger { lane, .. }
            | VoiceCommand::Stop { lane, .. }
            | VoiceCommand::Kill { lane } => lane,
        }
    }
}

/// Render → control notification.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RenderReport {
    /// The lane passed its disposal deadline for the stop tagged `epoch`.
    Finished { lane: usize, epoch: u32 },
}

/// Notifications for the host surface.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SynthEvent {
    /// Voices not yet released by a note-off.
    PolyCountChanged(usize),
}

/// Destination for voice commands.
pub trait CommandSink {
    /// Queue a command. Returns `false` if it had to be dropped.
    fn send(&mut self, command: VoiceCommand) -> bool;
}

impl CommandSink for Producer<VoiceCommand> {
    fn send(&mut self, command: VoiceCommand) -> bool {
        match self.push(command) {
            Ok(()) => true,
            Err(PushError::Full(command)) => {
                warn!("voice command ring full, dropping {command:?}");
                false
            }
        }
    }
}
