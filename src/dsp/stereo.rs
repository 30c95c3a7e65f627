//! Stereo placement: equal-power panning and mid/side width.

use std::f32::consts::FRAC_PI_2;

/// Equal-power gains `(left, right)` for a mono source at `position`
/// (-1 = hard left, 0 = centre, +1 = hard right).
#[inline]
pub fn pan_gains(position: f32) -> (f32, f32) {
    let x = (position.clamp(-1.0, 1.0) + 1.0) * 0.5;
    ((x * FRAC_PI_2).cos(), (x * FRAC_PI_2).sin())
}

/// Pan an existing stereo pair in place, as WebAudio's `StereoPannerNode`
/// does: the far channel is folded into the near one.
pub fn pan_stereo(left: &mut [f32], right: &mut [f32], position: f32) {
    let pan = position.clamp(-1.0, 1.0);
    if pan <= 0.0 {
        let x = (pan + 1.0) * FRAC_PI_2;
        let (gl, gr) = (x.cos(), x.sin());
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (in_l, in_r) = (*l, *r);
            *l = in_l + in_r * gl;
            *r = in_r * gr;
        }
    } else {
        let x = pan * FRAC_PI_2;
        let (gl, gr) = (x.cos(), x.sin());
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let (in_l, in_r) = (*l, *r);
            *l = in_l * gl;
            *r = in_r + in_l * gr;
        }
    }
}

/// Scale the side signal by `2 · width`: 0 collapses to mono, 0.5 leaves
/// the image untouched, 1 doubles the side level.
pub fn apply_width(left: &mut [f32], right: &mut [f32], width: f32) {
    let side_gain = 2.0 * width.clamp(0.0, 1.0);
    for (l, r) in left.iter_mut().zip(right.iter_mut()) {
        let mid = (*l + *r) * 0.5;
        let side = (*l - *r) * 0.5 * side_gain;
        *l = mid + side;
        *r = mid - side;
    }
}
