//! Element placement by rejection sampling.

use rand::Rng;

use crate::config::PlayArea;
use crate::elements::Position;

/// Where a new element may be dropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementRegion {
    Anywhere,
    /// Within the given radius of the centre.
    Central(f64),
}

/// Uniform draw from `lo..=hi`; an empty range yields its midpoint.
fn between<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if lo < hi {
        rng.gen_range(lo..=hi)
    } else {
        (lo + hi) / 2.0
    }
}

/// Draw one candidate position in the region.
fn sample<R: Rng + ?Sized>(rng: &mut R, area: &PlayArea, region: PlacementRegion) -> Position {
    match region {
        PlacementRegion::Anywhere => Position::new(
            between(rng, area.min_x(), area.max_x()),
            between(rng, area.min_y(), area.max_y()),
        ),
        PlacementRegion::Central(radius) => {
            let center = area.center();
            let angle = rng.gen_range(0.0..std::f64::consts::TAU);
            let distance = between(rng, 0.0, radius.max(0.0));
            area.clamp(Position::new(
                center.x + angle.cos() * distance,
                center.y + angle.sin() * distance,
            ))
        }
    }
}

/// Whether a candidate keeps at least `min_spacing` from every placed element.
pub fn is_spaced(candidate: Position, placed: &[Position], min_spacing: f64) -> bool {
    placed
        .iter()
        .all(|p| p.distance_to(candidate) >= min_spacing)
}

/// Find a position for a new element.
///
/// Up to `attempts` candidates are drawn; the first one far enough from every
/// placed element wins. If none qualifies the last draw is accepted, so a crowded
/// round still makes progress.
pub fn place<R: Rng + ?Sized>(
    rng: &mut R,
    area: &PlayArea,
    placed: &[Position],
    min_spacing: f64,
    attempts: u32,
    region: PlacementRegion,
) -> Position {
    let mut candidate = sample(rng, area, region);
    for _ in 1..attempts.max(1) {
        if is_spaced(candidate, placed, min_spacing) {
            return candidate;
        }
        candidate = sample(rng, area, region);
    }
    candidate
}
