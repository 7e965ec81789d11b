//! Frame-driven animations.
//!
//! Nothing here reads a clock. The host passes its frame timestamp to
//! `sample`/`frame`, so the same inputs always give the same output.

use crate::constants::{
    CELEBRATION_FADE_SHARE, CELEBRATION_FILL_DURATION_MS, CELEBRATION_WAVE_DELAY_MS,
};
use crate::models::{PieceId, Point};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    Linear,
    /// `1 - (1 - t)^3`
    #[default]
    CubicOut,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// Start time, length and curve of one animation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationState {
    pub start_ms: f64,
    pub duration_ms: f64,
    pub easing: Easing,
}

impl AnimationState {
    pub fn new(start_ms: f64, duration_ms: f64, easing: Easing) -> Self {
        AnimationState {
            start_ms,
            duration_ms,
            easing,
        }
    }

    /// Linear progress in `[0, 1]`.
    pub fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        let t = (now_ms - self.start_ms) / self.duration_ms;
        if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) }
    }

    pub fn sample(&self, now_ms: f64) -> f64 {
        self.easing.apply(self.progress(now_ms))
    }

    pub fn is_finished(&self, now_ms: f64) -> bool {
        self.progress(now_ms) >= 1.0
    }
}

/// A released piece gliding to its grid cell.
#[derive(Clone, Debug, PartialEq)]
pub struct SnapAnimation {
    pub piece: PieceId,
    pub from: Point,
    pub to: Point,
    pub target: (i32, i32),
    pub timing: AnimationState,
}

impl SnapAnimation {
    pub fn position(&self, now_ms: f64) -> Point {
        let e = self.timing.sample(now_ms);
        Point {
            x: self.from.x + (self.to.x - self.from.x) * e,
            y: self.from.y + (self.to.y - self.from.y) * e,
        }
    }

    pub fn is_finished(&self, now_ms: f64) -> bool {
        self.timing.is_finished(now_ms)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CelebrationCell {
    pub col: u32,
    pub row: u32,
    /// Chebyshev ring index from the board centre.
    pub distance: u32,
    /// Fill rectangle size relative to the cell, `0..=1`.
    pub scale: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CelebrationFrame {
    pub cells: Vec<CelebrationCell>,
    pub piece_opacity: f64,
    pub glow: f64,
    pub finished: bool,
}

/// Ripple over the visual grid played once a puzzle is solved.
#[derive(Clone, Debug, PartialEq)]
pub struct CelebrationAnimation {
    pub start_ms: f64,
    pub visual: u32,
    pub wave_delay_ms: f64,
    pub fill_duration_ms: f64,
}

impl CelebrationAnimation {
    pub fn new(start_ms: f64, visual: u32) -> Self {
        CelebrationAnimation {
            start_ms,
            visual,
            wave_delay_ms: CELEBRATION_WAVE_DELAY_MS,
            fill_duration_ms: CELEBRATION_FILL_DURATION_MS,
        }
    }

    pub fn max_distance(&self) -> u32 {
        self.visual.div_ceil(2)
    }

    pub fn total_duration(&self) -> f64 {
        (self.max_distance() + 2) as f64 * self.wave_delay_ms + self.fill_duration_ms
    }

    fn ring(&self, col: u32, row: u32) -> u32 {
        let mid = self.visual as f64 / 2.0 - 0.5;
        (col as f64 - mid)
            .abs()
            .max((row as f64 - mid).abs())
            .floor() as u32
    }

    fn cell_scale(&self, distance: u32, elapsed: f64) -> f64 {
        let fill_start = distance as f64 * self.wave_delay_ms;
        let fill_end = fill_start + self.fill_duration_ms;
        let unfill_start = (distance + 1) as f64 * self.wave_delay_ms;
        let unfill_end = unfill_start + self.fill_duration_ms;
        let p = if elapsed >= fill_start && elapsed < fill_end {
            (elapsed - fill_start) / self.fill_duration_ms
        } else if elapsed >= fill_end && elapsed < unfill_start {
            1.0
        } else if elapsed >= unfill_start && elapsed < unfill_end {
            1.0 - (elapsed - unfill_start) / self.fill_duration_ms
        } else {
            0.0
        };
        p.clamp(0.0, 1.0)
    }

    pub fn frame(&self, now_ms: f64) -> CelebrationFrame {
        let elapsed = (now_ms - self.start_ms).max(0.0);
        let total = self.total_duration();
        let fade = total * CELEBRATION_FADE_SHARE;

        let mut cells = Vec::with_capacity((self.visual * self.visual) as usize);
        for row in 0..self.visual {
            for col in 0..self.visual {
                let distance = self.ring(col, row);
                cells.push(CelebrationCell {
                    col,
                    row,
                    distance,
                    scale: self.cell_scale(distance, elapsed),
                });
            }
        }

        let t = elapsed / total;
        let glow = if t <= 0.5 { t * 2.0 } else { (1.0 - t) * 2.0 };
        CelebrationFrame {
            cells,
            piece_opacity: (1.0 - elapsed / fade).max(0.0),
            glow: glow.max(0.0),
            finished: elapsed >= total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubic_out_curve() {
        assert_eq!(Easing::CubicOut.apply(0.0), 0.0);
        assert_eq!(Easing::CubicOut.apply(0.5), 0.875);
        assert_eq!(Easing::CubicOut.apply(1.0), 1.0);
        assert_eq!(Easing::CubicOut.apply(3.0), 1.0);
    }

    #[test]
    fn sample_is_pure_in_now() {
        let a = AnimationState::new(1000.0, 150.0, Easing::CubicOut);
        assert_eq!(a.sample(900.0), 0.0);
        assert_eq!(a.sample(1075.0), a.sample(1075.0));
        assert!(!a.is_finished(1149.0));
        assert!(a.is_finished(1150.0));
        assert_eq!(AnimationState::new(0.0, 0.0, Easing::Linear).progress(0.0), 1.0);
    }

    #[test]
    fn snap_interpolates_between_endpoints() {
        let snap = SnapAnimation {
            piece: PieceId(0),
            from: Point::new(0.0, 100.0),
            to: Point::new(80.0, 20.0),
            target: (2, 0),
            timing: AnimationState::new(0.0, 150.0, Easing::CubicOut),
        };
        assert_eq!(snap.position(0.0), snap.from);
        assert_eq!(snap.position(150.0), snap.to);
        assert_eq!(snap.position(75.0), Point::new(70.0, 30.0));
    }

    #[test]
    fn celebration_timeline() {
        let anim = CelebrationAnimation::new(0.0, 8);
        assert_eq!(anim.total_duration(), 960.0);

        let start = anim.frame(0.0);
        assert_eq!(start.cells.len(), 64);
        assert_eq!(start.piece_opacity, 1.0);
        assert!(start.cells.iter().all(|c| c.scale == 0.0));

        let f = anim.frame(120.0);
        let centre = f.cells.iter().find(|c| (c.col, c.row) == (3, 4)).unwrap();
        let corner = f.cells.iter().find(|c| (c.col, c.row) == (0, 0)).unwrap();
        assert_eq!(centre.distance, 0);
        assert_eq!(corner.distance, 3);
        assert_eq!(centre.scale, 0.5);
        assert_eq!(corner.scale, 0.0);

        assert_eq!(anim.frame(480.0).glow, 1.0);
        assert!(anim.frame(384.0).piece_opacity < 1e-9);

        let end = anim.frame(960.0);
        assert!(end.finished);
        assert!(end.cells.iter().all(|c| c.scale == 0.0));
        assert_eq!(end.glow, 0.0);
    }
}
