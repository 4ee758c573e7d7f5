//! DSP Engine — pure Rust chord playback.
//!
//! A small WebAudio-style graph (oscillators, gains, automated params) driven
//! by the sample clock. The same code runs inside an AudioWorklet through WASM
//! and in offline rendering.

pub mod context;
pub mod device;
pub mod engine;
pub mod graph;
pub mod mixer;
pub mod oscillator;
pub mod param;
pub mod renderer;
pub mod scheduler;
