// Purpose - external interfaces: the audio device

pub mod output;

pub use output::{AudioOutput, OutputDevice};
