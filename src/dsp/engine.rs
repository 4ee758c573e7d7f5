//! Voice Engine — schedules oscillator voices on the audio graph and tears
//! them down again.
//!
//! Every sounding note is an oscillator feeding its own gain node, which feeds
//! a per-chord group gain, which feeds the master gain. The active set maps each
//! oscillator to its note gain and group; an oscillator enters it only here and
//! leaves it through one of three paths: its scheduled stop elapsing
//! (`cleanup_oscillator`), its group being destroyed (`destroy_group`), or a
//! full teardown.
//!
//! Two playback styles share the graph:
//! - one-shot chords stop themselves after a fixed duration, and any number of
//!   them may overlap;
//! - the continuous chord sounds until stopped. At most one exists, and a new
//!   chord hard-stops the previous one before it starts.
//!
//! Time is the context clock, which only advances while samples are rendered.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::ChordError;
use crate::frequency::FrequencyTable;
use crate::settings::EngineConfig;

use super::context::AudioEngineContext;
use super::device::{AudioHost, DeviceState};
use super::graph::{NodeId, Output};
use super::mixer::soft_clip;
use super::oscillator::Waveform;
use super::scheduler::{Scheduler, TaskId};

/// Handle to a chord's group gain.
pub type GroupId = NodeId;

#[derive(Debug, Clone, Copy)]
struct VoiceRecord {
    gain: NodeId,
    group: GroupId,
}

#[derive(Debug)]
struct ActiveChord {
    group: GroupId,
    frequencies: Vec<f64>,
    waveform: Waveform,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Task {
    StopContinuous,
    DisconnectGroup(GroupId),
}

/// Snapshot of the engine for UI display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub is_initialized: bool,
    pub context_state: Option<DeviceState>,
    pub is_playing: bool,
    pub active_note_count: usize,
    pub master_volume: f64,
}

pub struct VoiceEngine<H: AudioHost> {
    config: EngineConfig,
    context: AudioEngineContext<H>,
    scheduler: Scheduler<Task>,
    active: BTreeMap<NodeId, VoiceRecord>,
    groups: BTreeSet<GroupId>,
    continuous: Option<ActiveChord>,
    /// Released continuous chords still fading out.
    fading: BTreeSet<GroupId>,
    pending_stop: Option<TaskId>,
    master_volume: f64,
    note_table: Option<FrequencyTable>,
    ended: Vec<NodeId>,
}

impl<H: AudioHost> VoiceEngine<H> {
    pub fn new(host: H, config: EngineConfig) -> Self {
        let master_volume = clamp_volume(config.master_volume);
        VoiceEngine {
            config,
            context: AudioEngineContext::new(host),
            scheduler: Scheduler::new(),
            active: BTreeMap::new(),
            groups: BTreeSet::new(),
            continuous: None,
            fading: BTreeSet::new(),
            pending_stop: None,
            master_volume,
            note_table: None,
            ended: Vec::new(),
        }
    }

    pub fn with_defaults(host: H) -> Self {
        VoiceEngine::new(host, EngineConfig::default())
    }

    /// Create the output device on first call and resume it if suspended.
    /// Call from a user gesture; hosts keep new devices suspended until then.
    pub fn ensure_running(&mut self) -> Result<(), ChordError> {
        self.context.ensure_running(self.master_volume)?;
        Ok(())
    }

    /// The host completed an asynchronous resume.
    pub fn device_resumed(&mut self) {
        self.context.resumed();
    }

    fn ready(&mut self) -> bool {
        match self.ensure_running() {
            Ok(()) => true,
            Err(e) => {
                log::warn!("playback skipped: {e}");
                false
            }
        }
    }

    fn playable(frequencies: &[f64]) -> Vec<f64> {
        frequencies
            .iter()
            .copied()
            .filter(|&f| {
                let ok = f.is_finite() && f > 0.0;
                if !ok {
                    log::warn!("skipping invalid frequency {f}");
                }
                ok
            })
            .collect()
    }

    /// Wire one group gain plus an oscillator/gain pair per frequency, all
    /// starting now with a linear attack.
    fn build_group(
        &mut self,
        frequencies: &[f64],
        waveform: Waveform,
        duration: Option<f64>,
    ) -> Option<GroupId> {
        let attack = self.config.attack;
        let level = self.config.chord_gain(frequencies.len());

        let live = self.context.live_mut()?;
        let now = live.now();
        let master = live.master();
        let graph = &mut live.graph;

        let group = graph.create_gain(level);
        graph.connect(group, Output::Node(master));
        if let Some(param) = graph.gain_param(group) {
            param.set_value_at_time(level, now);
        }

        for &frequency in frequencies {
            let osc = graph.create_oscillator(waveform, frequency);
            let gain = graph.create_gain(0.0);
            graph.connect(osc, Output::Node(gain));
            graph.connect(gain, Output::Node(group));

            if let Some(param) = graph.gain_param(gain) {
                param.set_value_at_time(0.0, now);
                param.linear_ramp_to_value_at_time(1.0, now + attack);
            }

            graph.start(osc, now);
            if let Some(duration) = duration {
                graph.stop(osc, now + duration);
            }

            self.active.insert(osc, VoiceRecord { gain, group });
        }

        self.groups.insert(group);
        Some(group)
    }

    /// Play a chord for `duration` seconds. The group fades exponentially over
    /// the second half and is disconnected shortly after it ends.
    ///
    /// Returns `None` when nothing was scheduled (no valid frequency, bad
    /// duration, or no output device).
    pub fn play_one_shot(
        &mut self,
        frequencies: &[f64],
        waveform: Waveform,
        duration: f64,
    ) -> Option<GroupId> {
        if !(duration.is_finite() && duration > 0.0) {
            log::warn!("ignoring one-shot with duration {duration}");
            return None;
        }
        let frequencies = Self::playable(frequencies);
        if frequencies.is_empty() || !self.ready() {
            return None;
        }

        let group = self.build_group(&frequencies, waveform, Some(duration))?;

        let level = self.config.chord_gain(frequencies.len());
        let floor = self.config.fade_floor;
        let now = self.context.now();
        if let Some(param) = self
            .context
            .live_mut()
            .and_then(|live| live.graph.gain_param(group))
        {
            param.set_value_at_time(level, now + duration * 0.5);
            param.exponential_ramp_to_value_at_time(floor, now + duration);
        }

        let cleanup_at = now + duration + self.config.group_cleanup_delay;
        self.scheduler
            .schedule(cleanup_at, Task::DisconnectGroup(group));

        log::debug!(
            "one-shot {:?}: {} notes, {waveform}, {duration}s",
            group,
            frequencies.len()
        );
        Some(group)
    }

    /// Start a chord that sounds until stopped.
    ///
    /// Requesting the chord that is already sounding (same frequencies in the
    /// same order) only cancels a pending stop. Any other chord replaces the
    /// current one with no overlap. Returns whether a new chord was started.
    pub fn start_continuous(&mut self, frequencies: &[f64], waveform: Waveform) -> bool {
        let frequencies = Self::playable(frequencies);
        if frequencies.is_empty() || !self.ready() {
            return false;
        }

        self.cancel_pending_stop();

        if let Some(current) = &self.continuous {
            if current.frequencies == frequencies {
                log::trace!("continuous chord unchanged, keeping {:?}", current.group);
                return false;
            }
        }

        self.hard_stop_continuous();

        let Some(group) = self.build_group(&frequencies, waveform, None) else {
            return false;
        };
        log::debug!(
            "continuous {:?}: {} notes, {waveform}",
            group,
            frequencies.len()
        );
        self.continuous = Some(ActiveChord {
            group,
            frequencies,
            waveform,
        });
        true
    }

    /// Stop sounding voices.
    ///
    /// Without `immediate`, while a continuous chord sounds, the stop is
    /// deferred by `stop_debounce` so a following `start_continuous` can
    /// supersede it; a repeated call restarts the delay. Otherwise every active
    /// oscillator fades out over `release` and all groups are disconnected once
    /// the fade ends.
    pub fn stop_continuous(&mut self, immediate: bool) {
        self.cancel_pending_stop();

        if !immediate && self.continuous.is_some() {
            let at = self.context.now() + self.config.stop_debounce;
            self.pending_stop = Some(self.scheduler.schedule(at, Task::StopContinuous));
            return;
        }

        self.release_all();
    }

    fn cancel_pending_stop(&mut self) {
        if let Some(id) = self.pending_stop.take() {
            self.scheduler.cancel(id);
        }
    }

    fn release_all(&mut self) {
        let release = self.config.release;
        let floor = self.config.fade_floor;

        let Some(live) = self.context.live_mut() else {
            self.forget_all();
            return;
        };
        let now = live.now();
        let end = now + release;

        for &osc in self.active.keys() {
            live.graph.stop(osc, end);
        }
        for &group in &self.groups {
            if let Some(param) = live.graph.gain_param(group) {
                param.hold_at(now);
                param.exponential_ramp_to_value_at_time(floor, end);
            }
        }

        for &group in &self.groups {
            self.scheduler.schedule(end, Task::DisconnectGroup(group));
        }
        if let Some(chord) = self.continuous.take() {
            log::debug!("releasing continuous {:?} ({})", chord.group, chord.waveform);
            self.fading.insert(chord.group);
        }
    }

    /// Synchronously silence the continuous chord and any released one still
    /// fading, so two continuous chords never overlap.
    fn hard_stop_continuous(&mut self) {
        let mut doomed: Vec<GroupId> = std::mem::take(&mut self.fading).into_iter().collect();
        if let Some(chord) = self.continuous.take() {
            doomed.push(chord.group);
        }
        for group in doomed {
            self.destroy_group(group);
        }
    }

    /// Stop and drop every voice of a group, then the group gain itself.
    fn destroy_group(&mut self, group: GroupId) {
        let voices: Vec<(NodeId, VoiceRecord)> = self
            .active
            .iter()
            .filter(|(_, rec)| rec.group == group)
            .map(|(&osc, &rec)| (osc, rec))
            .collect();

        for (osc, _) in &voices {
            self.active.remove(osc);
        }
        self.groups.remove(&group);
        self.fading.remove(&group);

        if let Some(live) = self.context.live_mut() {
            let now = live.now();
            for (osc, rec) in &voices {
                live.graph.stop(*osc, now);
                live.graph.remove(*osc);
                live.graph.remove(rec.gain);
            }
            live.graph.remove(group);
        }
        log::trace!("destroyed {:?} with {} voices", group, voices.len());
    }

    /// Ended-notification path: drop the oscillator and its note gain.
    fn cleanup_oscillator(&mut self, osc: NodeId) {
        let record = self.active.remove(&osc);
        if let Some(live) = self.context.live_mut() {
            live.graph.disconnect(osc);
            live.graph.remove(osc);
            if let Some(rec) = record {
                live.graph.disconnect(rec.gain);
                live.graph.remove(rec.gain);
            }
        }
        log::trace!("oscillator {osc:?} ended");
    }

    fn forget_all(&mut self) {
        self.active.clear();
        self.groups.clear();
        self.fading.clear();
        self.continuous = None;
        self.pending_stop = None;
        self.scheduler.clear();
    }

    /// Set master volume, clamped to [0, 1], effective immediately.
    pub fn set_master_volume(&mut self, volume: f64) {
        self.master_volume = clamp_volume(volume);
        if let Some(live) = self.context.live_mut() {
            let now = live.now();
            let master = live.master();
            if let Some(param) = live.graph.gain_param(master) {
                param.cancel_scheduled_values(now);
                param.set_value_at_time(self.master_volume, now);
            }
        }
    }

    /// Stop everything, forget all voices and close the output device.
    pub fn teardown_all(&mut self) {
        if let Some(live) = self.context.live_mut() {
            let now = live.now();
            for &osc in self.active.keys() {
                live.graph.stop(osc, now);
            }
        }
        let voices = self.active.len();
        self.forget_all();
        self.context.close();
        log::debug!("teardown released {voices} voices");
    }

    /// Host visibility changed: suspend when hidden, resume a suspended (not
    /// closed) device when visible again.
    pub fn visibility_changed(&mut self, hidden: bool) {
        let result = if hidden {
            self.context.suspend()
        } else if self.context.state() == Some(DeviceState::Suspended) {
            self.context.resume()
        } else {
            Ok(())
        };
        if let Err(e) = result {
            log::warn!("visibility change handling failed: {e}");
        }
    }

    /// Render `out.len()` frames. Frames the device cannot produce (not
    /// running) are silent and do not advance the clock.
    pub fn process(&mut self, out: &mut [f32]) {
        let mut written = 0;
        while written < out.len() {
            let Some(sample) = self.context.render_frame(&mut self.ended) else {
                break;
            };
            out[written] = soft_clip(sample) as f32;
            written += 1;

            if !self.ended.is_empty() {
                let ended = std::mem::take(&mut self.ended);
                for &osc in &ended {
                    self.cleanup_oscillator(osc);
                }
                self.ended = ended;
                self.ended.clear();
            }
            self.run_due_tasks();
        }
        out[written..].fill(0.0);
    }

    /// Render `frames` frames into a new buffer.
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        self.process(&mut out);
        out
    }

    /// Render and discard `seconds` worth of frames.
    pub fn advance(&mut self, seconds: f64) {
        let Some(sample_rate) = self.context.live().map(|l| l.sample_rate()) else {
            return;
        };
        let frames = (seconds * sample_rate).round().max(0.0) as usize;
        let mut block = [0.0f32; 256];
        let mut left = frames;
        while left > 0 {
            let n = left.min(block.len());
            self.process(&mut block[..n]);
            left -= n;
        }
    }

    fn run_due_tasks(&mut self) {
        let now = self.context.now();
        if self.scheduler.next_deadline().is_none_or(|t| t > now) {
            return;
        }
        for task in self.scheduler.take_due(now) {
            match task {
                Task::StopContinuous => {
                    self.pending_stop = None;
                    log::trace!("debounced stop fired at {now}");
                    self.release_all();
                }
                Task::DisconnectGroup(group) => {
                    if self.groups.contains(&group) {
                        self.destroy_group(group);
                    }
                }
            }
        }
    }

    fn lookup_notes<S: AsRef<str>>(&mut self, notes: &[S]) -> Vec<f64> {
        let (low, high) = self.config.lookup_octaves;
        let table = self
            .note_table
            .get_or_insert_with(|| FrequencyTable::new(low, high, true));
        notes
            .iter()
            .filter_map(|note| {
                let note = note.as_ref();
                let freq = table.get(note);
                if freq.is_none() {
                    log::warn!("Note \"{note}\" not found in frequency map");
                }
                freq
            })
            .collect()
    }

    /// One-shot playback by note name. Unknown notes are skipped; nothing
    /// plays when none remain.
    pub fn play_notes<S: AsRef<str>>(
        &mut self,
        notes: &[S],
        waveform: Waveform,
        duration: f64,
    ) -> Option<GroupId> {
        let frequencies = self.lookup_notes(notes);
        if frequencies.is_empty() {
            log::warn!("no playable notes in {} requested", notes.len());
            return None;
        }
        self.play_one_shot(&frequencies, waveform, duration)
    }

    /// Continuous playback by note name, with the same skipping rules as
    /// [`VoiceEngine::play_notes`].
    pub fn start_continuous_notes<S: AsRef<str>>(&mut self, notes: &[S], waveform: Waveform) -> bool {
        let frequencies = self.lookup_notes(notes);
        if frequencies.is_empty() {
            log::warn!("no playable notes in {} requested", notes.len());
            return false;
        }
        self.start_continuous(&frequencies, waveform)
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            is_initialized: self.context.is_initialized(),
            context_state: self.context.state(),
            is_playing: !self.active.is_empty(),
            active_note_count: self.active.len(),
            master_volume: self.master_volume,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        self.context.host()
    }

    pub fn host_mut(&mut self) -> &mut H {
        self.context.host_mut()
    }

    /// Context clock in seconds.
    pub fn now(&self) -> f64 {
        self.context.now()
    }

    pub fn active_voice_count(&self) -> usize {
        self.active.len()
    }

    /// Number of live chord groups (one-shot, continuous and fading).
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn has_pending_stop(&self) -> bool {
        self.pending_stop.is_some()
    }

    /// Frequencies of the continuous chord currently sounding.
    pub fn continuous_frequencies(&self) -> Option<&[f64]> {
        self.continuous.as_ref().map(|c| c.frequencies.as_slice())
    }

    /// Oscillator and gain node counts in the graph, master gain included.
    pub fn graph_node_counts(&self) -> (usize, usize) {
        self.context
            .live()
            .map_or((0, 0), |l| (l.graph.oscillator_count(), l.graph.gain_count()))
    }
}

fn clamp_volume(volume: f64) -> f64 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}
