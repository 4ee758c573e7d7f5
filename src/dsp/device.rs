//! Output devices — the seam between the voice engine and whatever actually
//! plays samples.
//!
//! Devices start suspended and must be resumed from a user gesture. A resume
//! may complete later (`ResumeStatus::Pending`); the host reports completion
//! through `VoiceEngine::device_resumed`.

use serde::Serialize;

use crate::error::DeviceError;

/// Lifecycle state of an output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    Suspended,
    Running,
    Closed,
}

/// Outcome of a resume request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeStatus {
    Running,
    Pending,
}

pub trait OutputDevice {
    fn sample_rate(&self) -> f64;
    fn resume(&mut self) -> Result<ResumeStatus, DeviceError>;
    fn suspend(&mut self) -> Result<(), DeviceError>;
    fn close(&mut self) -> Result<(), DeviceError>;
}

/// Creates output devices on demand.
pub trait AudioHost {
    type Device: OutputDevice;

    fn open(&mut self) -> Result<Self::Device, DeviceError>;
}

/// Host for devices whose samples are pulled by the embedder, e.g. an
/// AudioWorklet calling into WASM or an offline render loop.
#[derive(Debug, Clone)]
pub struct PullHost {
    sample_rate: f64,
    denied: Option<String>,
    defer_resume: bool,
    opened: usize,
}

impl PullHost {
    pub fn new(sample_rate: f64) -> Self {
        PullHost {
            sample_rate,
            denied: None,
            defer_resume: false,
            opened: 0,
        }
    }

    /// Refuse to open devices until cleared with `None`.
    pub fn set_denied(&mut self, reason: Option<String>) {
        self.denied = reason;
    }

    /// Make resume requests complete asynchronously.
    pub fn with_deferred_resume(mut self) -> Self {
        self.defer_resume = true;
        self
    }

    /// Number of devices opened so far.
    pub fn opened(&self) -> usize {
        self.opened
    }
}

impl AudioHost for PullHost {
    type Device = PullDevice;

    fn open(&mut self) -> Result<PullDevice, DeviceError> {
        if let Some(reason) = &self.denied {
            return Err(DeviceError::Unavailable(reason.clone()));
        }
        self.opened += 1;
        Ok(PullDevice {
            sample_rate: self.sample_rate,
            defer_resume: self.defer_resume,
            closed: false,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PullDevice {
    sample_rate: f64,
    defer_resume: bool,
    closed: bool,
}

impl OutputDevice for PullDevice {
    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn resume(&mut self) -> Result<ResumeStatus, DeviceError> {
        if self.closed {
            return Err(DeviceError::Closed);
        }
        if self.defer_resume {
            Ok(ResumeStatus::Pending)
        } else {
            Ok(ResumeStatus::Running)
        }
    }

    fn suspend(&mut self) -> Result<(), DeviceError> {
        if self.closed {
            return Err(DeviceError::Closed);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), DeviceError> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denied_host_fails_to_open() {
        let mut host = PullHost::new(48000.0);
        host.set_denied(Some("no permission".into()));
        assert_eq!(
            host.open().unwrap_err(),
            DeviceError::Unavailable("no permission".into())
        );
        assert_eq!(host.opened(), 0);

        host.set_denied(None);
        assert!(host.open().is_ok());
        assert_eq!(host.opened(), 1);
    }

    #[test]
    fn closed_device_rejects_resume() {
        let mut host = PullHost::new(48000.0);
        let mut dev = host.open().unwrap();
        assert_eq!(dev.resume().unwrap(), ResumeStatus::Running);
        dev.close().unwrap();
        assert_eq!(dev.resume().unwrap_err(), DeviceError::Closed);
        assert_eq!(dev.suspend().unwrap_err(), DeviceError::Closed);
    }

    #[test]
    fn deferred_resume_is_pending() {
        let mut host = PullHost::new(48000.0).with_deferred_resume();
        let mut dev = host.open().unwrap();
        assert_eq!(dev.resume().unwrap(), ResumeStatus::Pending);
        assert_eq!(dev.sample_rate(), 48000.0);
    }
}
