//! Real-time audio output using cpal

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use log::{error, info};

use crate::{error::Error, graph::bus::AudioGraph, MAX_BLOCK_SIZE};

/// The host's default output device and its preferred stream format.
pub struct OutputDevice {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
}

impl OutputDevice {
    pub fn default_output() -> Result<Self, Error> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(Error::NoOutputDevice)?;
        let supported = device.default_output_config()?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();

        if config.channels == 0 {
            return Err(Error::Config("output device reports zero channels".into()));
        }

        Ok(Self {
            device,
            config,
            sample_format,
        })
    }

    pub fn sample_rate(&self) -> f32 {
        self.config.sample_rate.0 as f32
    }

    pub fn channels(&self) -> usize {
        usize::from(self.config.channels)
    }

    pub fn name(&self) -> String {
        self.device.name().unwrap_or_else(|_| "unknown device".into())
    }

    /// Move `graph` into the device callback and start the stream.
    pub fn play(self, graph: AudioGraph) -> Result<AudioOutput, Error> {
        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(graph)?,
            SampleFormat::I16 => self.build_stream::<i16>(graph)?,
            SampleFormat::U16 => self.build_stream::<u16>(graph)?,
            other => return Err(Error::UnsupportedSampleFormat(other)),
        };
        stream.play()?;

        info!(
            "output stream started on {} ({} Hz, {} channels, {:?})",
            self.name(),
            self.config.sample_rate.0,
            self.config.channels,
            self.sample_format
        );
        Ok(AudioOutput { _stream: stream })
    }

    fn build_stream<T>(&self, mut graph: AudioGraph) -> Result<Stream, Error>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = self.channels();
        let mut left = vec![0.0f32; MAX_BLOCK_SIZE];
        let mut right = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = self.device.build_output_stream(
            &self.config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                for frames in data.chunks_mut(channels * MAX_BLOCK_SIZE) {
                    let n = frames.len() / channels;
                    let (l, r) = (&mut left[..n], &mut right[..n]);
                    graph.render_block(l, r);
                    write_frames(frames, channels, l, r);
                }
            },
            |err| error!("audio stream error: {err}"),
            None,
        )?;

        Ok(stream)
    }
}

/// Interleave a stereo block into a device buffer. Mono devices get the
/// average; channels past the second repeat left/right.
fn write_frames<T>(data: &mut [T], channels: usize, left: &[f32], right: &[f32])
where
    T: SizedSample + FromSample<f32>,
{
    for ((frame, &l), &r) in data.chunks_mut(channels).zip(left).zip(right) {
        if channels == 1 {
            frame[0] = T::from_sample(0.5 * (l + r));
            continue;
        }
        for (ch, sample) in frame.iter_mut().enumerate() {
            let value = if ch % 2 == 0 { l } else { r };
            *sample = T::from_sample(value);
        }
    }
}

/// A running output stream. Audio stops when this is dropped.
pub struct AudioOutput {
    _stream: Stream,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_frames_interleave() {
        let mut data = [0.0f32; 6];
        write_frames(&mut data, 2, &[0.1, 0.2, 0.3], &[-0.1, -0.2, -0.3]);
        assert_eq!(data, [0.1, -0.1, 0.2, -0.2, 0.3, -0.3]);
    }

    #[test]
    fn mono_device_gets_the_average() {
        let mut data = [0.0f32; 2];
        write_frames(&mut data, 1, &[0.5, 0.2], &[0.1, 0.2]);
        assert!((data[0] - 0.3).abs() < 1e-6);
        assert!((data[1] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn integer_formats_convert() {
        let mut data = [0i16; 2];
        write_frames(&mut data, 2, &[1.0], &[0.0]);
        assert!(data[0] > 32_000);
        assert_eq!(data[1], 0);
    }
}
