//! Audio engine context — owns the output device, the audio graph, the master
//! gain and the context clock. Created once on first use, closed once on
//! teardown; a closed context is recreated by the next `ensure_running`.

use crate::error::DeviceError;

use super::device::{AudioHost, DeviceState, OutputDevice, ResumeStatus};
use super::graph::{AudioGraph, NodeId, Output};

/// A live device with its graph. Exists between creation and close.
pub struct LiveContext<D> {
    device: D,
    state: DeviceState,
    resume_pending: bool,
    pub graph: AudioGraph,
    master: NodeId,
    frame: u64,
    sample_rate: f64,
}

impl<D: OutputDevice> LiveContext<D> {
    /// Context time in seconds (frames rendered / sample rate).
    pub fn now(&self) -> f64 {
        self.frame as f64 / self.sample_rate
    }

    pub fn master(&self) -> NodeId {
        self.master
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}

pub struct AudioEngineContext<H: AudioHost> {
    host: H,
    live: Option<LiveContext<H::Device>>,
    closed: bool,
}

impl<H: AudioHost> AudioEngineContext<H> {
    pub fn new(host: H) -> Self {
        AudioEngineContext {
            host,
            live: None,
            closed: false,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Create the device and master gain if needed, then resume if suspended.
    ///
    /// While a resume is pending, repeated calls neither reopen the device nor
    /// issue another resume.
    pub fn ensure_running(&mut self, master_volume: f64) -> Result<(), DeviceError> {
        if self.live.is_none() {
            let device = self.host.open()?;
            let sample_rate = device.sample_rate();
            let mut graph = AudioGraph::new(sample_rate);
            let master = graph.create_gain(master_volume);
            graph.connect(master, Output::Destination);
            log::debug!("audio context created at {sample_rate} Hz");
            self.closed = false;
            self.live = Some(LiveContext {
                device,
                state: DeviceState::Suspended,
                resume_pending: false,
                graph,
                master,
                frame: 0,
                sample_rate,
            });
        }
        self.resume()
    }

    /// Resume a suspended device. No-op if running, pending or absent.
    pub fn resume(&mut self) -> Result<(), DeviceError> {
        let Some(live) = self.live.as_mut() else {
            return Ok(());
        };
        if live.state != DeviceState::Suspended || live.resume_pending {
            return Ok(());
        }
        match live.device.resume()? {
            ResumeStatus::Running => live.state = DeviceState::Running,
            ResumeStatus::Pending => live.resume_pending = true,
        }
        Ok(())
    }

    /// The host finished an asynchronous resume.
    pub fn resumed(&mut self) {
        if let Some(live) = self.live.as_mut() {
            if live.resume_pending {
                live.resume_pending = false;
                live.state = DeviceState::Running;
            }
        }
    }

    pub fn suspend(&mut self) -> Result<(), DeviceError> {
        let Some(live) = self.live.as_mut() else {
            return Ok(());
        };
        if live.state == DeviceState::Running {
            live.device.suspend()?;
            live.state = DeviceState::Suspended;
        }
        live.resume_pending = false;
        Ok(())
    }

    /// Close the device and drop the graph.
    pub fn close(&mut self) {
        if let Some(mut live) = self.live.take() {
            if let Err(e) = live.device.close() {
                log::warn!("closing audio device failed: {e}");
            }
            log::debug!("audio context closed");
            self.closed = true;
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.live.is_some()
    }

    /// Device state: `None` before the first creation, `Closed` after close
    /// until the next `ensure_running`.
    pub fn state(&self) -> Option<DeviceState> {
        match &self.live {
            Some(live) => Some(live.state),
            None if self.closed => Some(DeviceState::Closed),
            None => None,
        }
    }

    pub fn live(&self) -> Option<&LiveContext<H::Device>> {
        self.live.as_ref()
    }

    pub fn live_mut(&mut self) -> Option<&mut LiveContext<H::Device>> {
        self.live.as_mut()
    }

    pub fn now(&self) -> f64 {
        self.live.as_ref().map_or(0.0, LiveContext::now)
    }

    /// Render one frame and advance the clock. `None` while the device is not
    /// running; the clock stands still then.
    pub fn render_frame(&mut self, ended: &mut Vec<NodeId>) -> Option<f64> {
        let live = self.live.as_mut()?;
        if live.state != DeviceState::Running {
            return None;
        }
        let t = live.now();
        let sample = live.graph.render_sample(t, ended);
        live.frame += 1;
        Some(sample)
    }
}
