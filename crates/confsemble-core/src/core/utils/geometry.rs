use nalgebra::{Matrix3, Point3, Rotation3, Vector3};

/// A rigid-body transformation: rotation followed by translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            rotation: Rotation3::identity(),
            translation: Vector3::zeros(),
        }
    }

    #[inline]
    pub fn apply_to_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.rotation * point + self.translation
    }

    pub fn apply(&self, points: &mut [Point3<f64>]) {
        for p in points.iter_mut() {
            *p = self.apply_to_point(p);
        }
    }
}

pub fn centroid(points: &[Point3<f64>], weights: Option<&[f64]>) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    match weights {
        None => {
            let sum: Vector3<f64> = points.iter().map(|p| p.coords).sum();
            Some(Point3::from(sum / points.len() as f64))
        }
        Some(w) => {
            if w.len() != points.len() {
                return None;
            }
            let total: f64 = w.iter().sum();
            if total <= 0.0 {
                return None;
            }
            let sum: Vector3<f64> = points.iter().zip(w).map(|(p, wi)| p.coords * *wi).sum();
            Some(Point3::from(sum / total))
        }
    }
}

/// Computes the rigid transformation that superposes `mobile` onto `target`
/// with minimal (weighted) RMSD, using the Kabsch algorithm.
///
/// Improper rotations are corrected by flipping the sign of the smallest
/// singular direction. Returns `None` for empty or mismatched input, or when
/// the weights sum to zero.
pub fn kabsch(
    mobile: &[Point3<f64>],
    target: &[Point3<f64>],
    weights: Option<&[f64]>,
) -> Option<Transform> {
    if mobile.len() != target.len() || mobile.is_empty() {
        return None;
    }

    let mobile_centroid = centroid(mobile, weights)?;
    let target_centroid = centroid(target, weights)?;

    let h = mobile
        .iter()
        .zip(target.iter())
        .enumerate()
        .fold(Matrix3::zeros(), |acc, (i, (m, t))| {
            let w = weights.map_or(1.0, |w| w[i]);
            acc + (t - target_centroid) * (m - mobile_centroid).transpose() * w
        });

    let svd = h.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;

    let d = (u * v_t).determinant();
    let mut correction = Matrix3::identity();
    if d < 0.0 {
        correction[(2, 2)] = -1.0;
    }

    let rotation = Rotation3::from_matrix_unchecked(u * correction * v_t);
    let translation = target_centroid.coords - rotation * mobile_centroid.coords;

    Some(Transform {
        rotation,
        translation,
    })
}

/// Root-mean-square deviation between two coordinate sets of equal length.
///
/// With weights the deviation is `sqrt(sum(w_i * |d_i|^2) / sum(w_i))`.
pub fn rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>], weights: Option<&[f64]>) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    match weights {
        None => {
            let n = coords1.len() as f64;
            let squared_dist_sum: f64 = coords1
                .iter()
                .zip(coords2.iter())
                .map(|(p1, p2)| (p1 - p2).norm_squared())
                .sum();
            Some((squared_dist_sum / n).sqrt())
        }
        Some(w) => {
            if w.len() != coords1.len() {
                return None;
            }
            let total: f64 = w.iter().sum();
            if total <= 0.0 {
                return None;
            }
            let weighted_sum: f64 = coords1
                .iter()
                .zip(coords2.iter())
                .zip(w)
                .map(|((p1, p2), wi)| (p1 - p2).norm_squared() * wi)
                .sum();
            Some((weighted_sum / total).sqrt())
        }
    }
}

/// Averages a list of coordinate sets atom by atom.
pub fn mean_coords(coordsets: &[Vec<Point3<f64>>]) -> Option<Vec<Point3<f64>>> {
    let first = coordsets.first()?;
    let n_atoms = first.len();
    if coordsets.iter().any(|set| set.len() != n_atoms) {
        return None;
    }
    let n_sets = coordsets.len() as f64;
    let mean = (0..n_atoms)
        .map(|i| {
            let sum: Vector3<f64> = coordsets.iter().map(|set| set[i].coords).sum();
            Point3::from(sum / n_sets)
        })
        .collect();
    Some(mean)
}
