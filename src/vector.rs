//! Resampling of vector boundaries: redistribute the vertices of a
//! linestring or polygon boundary so they are evenly spaced along the path.

use anyhow::{bail, Result};
use geo::{Coord, Geometry, LineString, Polygon};

/// Segment norms below this are treated as zero length.
const NORM_TOLERANCE: f64 = 1e-10;

/// Default clip range for the resampled vertex count: at least 4 vertices,
/// no upper limit.
pub const DEFAULT_RESAMPLE_CLIP: (f64, f64) = (4.0, f64::INFINITY);

/// Manages resampling of linestrings.
///
/// Parameterises positions along a path by distance from its start, so a
/// resampling is just a choice of distances. Corner vertices of the input
/// are not guaranteed to survive into the sampled output.
pub struct LinestringSampler {
    points: Vec<Coord<f64>>,
    unit_vectors: Vec<Coord<f64>>,
    cumulative: Vec<f64>,
    length: f64,
}

impl LinestringSampler {
    pub fn new(line: &LineString<f64>) -> Self {
        let points = line.0.clone();
        let mut unit_vectors = Vec::with_capacity(points.len().saturating_sub(1));
        let mut cumulative = Vec::with_capacity(points.len().saturating_sub(1));
        let mut length = 0.0;
        for pair in points.windows(2) {
            let dx = pair[1].x - pair[0].x;
            let dy = pair[1].y - pair[0].y;
            let norm = (dx * dx + dy * dy).sqrt();
            if norm > NORM_TOLERANCE {
                unit_vectors.push(Coord {
                    x: dx / norm,
                    y: dy / norm,
                });
            } else {
                // Zero-length segment keeps its raw (zero) direction
                unit_vectors.push(Coord { x: dx, y: dy });
            }
            length += norm;
            cumulative.push(length);
        }
        LinestringSampler {
            points,
            unit_vectors,
            cumulative,
            length,
        }
    }

    /// Total path length.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// The point at `distance` along the path. Distances outside
    /// [0, length] extrapolate along the first or last segment.
    pub fn sample(&self, distance: f64) -> Coord<f64> {
        let position = self
            .cumulative
            .partition_point(|&end| end < distance)
            .min(self.unit_vectors.len().saturating_sub(1));
        let offset = if position == 0 {
            0.0
        } else {
            self.cumulative[position - 1]
        };
        let origin = self.points[position];
        let direction = self.unit_vectors[position];
        let projection = distance - offset;
        Coord {
            x: origin.x + direction.x * projection,
            y: origin.y + direction.y * projection,
        }
    }

    /// Sample a set of distances along the path.
    pub fn sample_many(&self, distances: &[f64]) -> Vec<Coord<f64>> {
        distances.iter().map(|&d| self.sample(d)).collect()
    }
}

fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    let count = count.max(2);
    (0..count)
        .map(|i| start + (end - start) * i as f64 / (count - 1) as f64)
        .collect()
}

/// Resample a linestring so its vertices sit `resolution` apart along the
/// path (approximately; the count is rounded and clipped).
///
/// `clip` bounds the vertex count and defaults to
/// [`DEFAULT_RESAMPLE_CLIP`].
pub fn resample_linestring(
    line: &LineString<f64>,
    resolution: f64,
    clip: Option<(f64, f64)>,
) -> LineString<f64> {
    let (min_count, max_count) = clip.unwrap_or(DEFAULT_RESAMPLE_CLIP);
    let sampler = LinestringSampler::new(line);
    let count = (sampler.length() / resolution).clamp(min_count, max_count) as usize;
    let samples = linspace(0.0, sampler.length(), count);
    LineString::from(sampler.sample_many(&samples))
}

/// Resample the boundaries of a polygon with [`resample_linestring`],
/// holes included.
pub fn resample_polygon(
    polygon: &Polygon<f64>,
    resolution: f64,
    clip: Option<(f64, f64)>,
) -> Polygon<f64> {
    let shell = resample_linestring(polygon.exterior(), resolution, clip);
    let holes = polygon
        .interiors()
        .iter()
        .map(|hole| resample_linestring(hole, resolution, clip))
        .collect();
    Polygon::new(shell, holes)
}

/// Resample the boundary of a linestring or polygon geometry.
///
/// Other geometry types have no boundary path to resample and are an error.
pub fn resample(
    geometry: &Geometry<f64>,
    resolution: f64,
    clip: Option<(f64, f64)>,
) -> Result<Geometry<f64>> {
    match geometry {
        Geometry::LineString(line) => Ok(Geometry::LineString(resample_linestring(
            line, resolution, clip,
        ))),
        Geometry::Polygon(polygon) => Ok(Geometry::Polygon(resample_polygon(
            polygon, resolution, clip,
        ))),
        other => bail!("Don't know how to resample a {:?}", other),
    }
}
