//! Audio graph — oscillator and gain nodes wired towards the destination.
//!
//! Nodes live in an arena keyed by [`NodeId`]. Oscillators start and stop at
//! scheduled context times; when a stop time passes the oscillator is reported
//! as ended exactly once so its owner can run cleanup. Every teardown call
//! tolerates nodes that were already stopped, disconnected or removed.

use std::collections::BTreeMap;

use super::oscillator::{Oscillator, Waveform};
use super::param::AudioParam;

/// Handle to a node in an [`AudioGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// Where a node sends its signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Node(NodeId),
    Destination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Playback {
    Scheduled,
    Playing,
    Ended,
}

#[derive(Debug)]
struct OscillatorNode {
    oscillator: Oscillator,
    start: Option<f64>,
    stop: Option<f64>,
    playback: Playback,
    output: Option<Output>,
}

#[derive(Debug)]
struct GainNode {
    gain: AudioParam,
    output: Option<Output>,
}

#[derive(Debug)]
enum Node {
    Oscillator(OscillatorNode),
    Gain(GainNode),
}

impl Node {
    fn output_mut(&mut self) -> &mut Option<Output> {
        match self {
            Node::Oscillator(o) => &mut o.output,
            Node::Gain(g) => &mut g.output,
        }
    }

    fn output(&self) -> Option<Output> {
        match self {
            Node::Oscillator(o) => o.output,
            Node::Gain(g) => g.output,
        }
    }
}

// Longest oscillator → destination chain the renderer will follow.
const MAX_CHAIN: usize = 16;

#[derive(Debug)]
pub struct AudioGraph {
    sample_rate: f64,
    nodes: BTreeMap<NodeId, Node>,
    next_id: u64,
    scratch: Vec<(Output, f64)>,
}

impl AudioGraph {
    pub fn new(sample_rate: f64) -> Self {
        AudioGraph {
            sample_rate,
            nodes: BTreeMap::new(),
            next_id: 0,
            scratch: Vec::new(),
        }
    }

    fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    pub fn create_oscillator(&mut self, waveform: Waveform, frequency: f64) -> NodeId {
        self.add(Node::Oscillator(OscillatorNode {
            oscillator: Oscillator::new(waveform, frequency, self.sample_rate),
            start: None,
            stop: None,
            playback: Playback::Scheduled,
            output: None,
        }))
    }

    pub fn create_gain(&mut self, initial: f64) -> NodeId {
        self.add(Node::Gain(GainNode {
            gain: AudioParam::new(initial),
            output: None,
        }))
    }

    /// Route `from` into `to`. Returns false if either end is gone.
    pub fn connect(&mut self, from: NodeId, to: Output) -> bool {
        if let Output::Node(target) = to {
            if !matches!(self.nodes.get(&target), Some(Node::Gain(_))) {
                return false;
            }
        }
        match self.nodes.get_mut(&from) {
            Some(node) => {
                *node.output_mut() = Some(to);
                true
            }
            None => false,
        }
    }

    /// Detach a node's output. No-op for unknown or already-detached nodes.
    pub fn disconnect(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(&id) {
            *node.output_mut() = None;
        }
    }

    /// Disconnect and drop a node. Returns whether it existed.
    pub fn remove(&mut self, id: NodeId) -> bool {
        self.nodes.remove(&id).is_some()
    }

    /// Schedule an oscillator to start at `when`.
    pub fn start(&mut self, id: NodeId, when: f64) {
        if let Some(Node::Oscillator(o)) = self.nodes.get_mut(&id) {
            if o.start.is_none() {
                o.start = Some(when);
            }
        }
    }

    /// Schedule an oscillator to stop at `when`. An earlier stop already in
    /// place wins; ended or unknown oscillators are ignored.
    pub fn stop(&mut self, id: NodeId, when: f64) {
        if let Some(Node::Oscillator(o)) = self.nodes.get_mut(&id) {
            if o.playback == Playback::Ended {
                return;
            }
            o.stop = Some(match o.stop {
                Some(existing) => existing.min(when),
                None => when,
            });
        }
    }

    pub fn gain_param(&mut self, id: NodeId) -> Option<&mut AudioParam> {
        match self.nodes.get_mut(&id) {
            Some(Node::Gain(g)) => Some(&mut g.gain),
            _ => None,
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn output_of(&self, id: NodeId) -> Option<Output> {
        self.nodes.get(&id).and_then(Node::output)
    }

    pub fn oscillator_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| matches!(n, Node::Oscillator(_)))
            .count()
    }

    pub fn gain_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| matches!(n, Node::Gain(_)))
            .count()
    }

    /// Render the mix arriving at the destination at context time `time`.
    /// Oscillators whose stop time has passed are appended to `ended`.
    pub fn render_sample(&mut self, time: f64, ended: &mut Vec<NodeId>) -> f64 {
        self.scratch.clear();

        for (id, node) in self.nodes.iter_mut() {
            let Node::Oscillator(o) = node else { continue };
            match o.playback {
                Playback::Ended => continue,
                Playback::Scheduled => match o.start {
                    Some(start) if time >= start => o.playback = Playback::Playing,
                    _ => continue,
                },
                Playback::Playing => {}
            }
            if o.stop.is_some_and(|stop| time >= stop) {
                o.playback = Playback::Ended;
                ended.push(*id);
                continue;
            }
            let sample = o.oscillator.next_sample();
            if let Some(out) = o.output {
                self.scratch.push((out, sample));
            }
        }

        let mut mix = 0.0;
        for &(out, sample) in &self.scratch {
            let mut level = sample;
            let mut cursor = Some(out);
            for _ in 0..MAX_CHAIN {
                match cursor {
                    Some(Output::Destination) => {
                        mix += level;
                        break;
                    }
                    Some(Output::Node(gid)) => match self.nodes.get(&gid) {
                        Some(Node::Gain(g)) => {
                            level *= g.gain.value_at(time);
                            cursor = g.output;
                        }
                        _ => break,
                    },
                    None => break,
                }
            }
        }
        mix
    }
}
