//! Output stage — soft clipping of the summed graph output.

/// Soft clipper using tanh to prevent harsh digital clipping.
pub fn soft_clip(x: f64) -> f64 {
    x.tanh()
}
