use nalgebra::{Matrix3, Point3, Rotation3, SymmetricEigen, Unit, Vector3};

pub fn rotation_from_axis_angle(axis: &Vector3<f64>, angle_radians: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle_radians)
}

pub fn vec_distance(p1: &Point3<f64>, p2: &Point3<f64>) -> f64 {
    (p1 - p2).norm()
}

/// Angle in radians between two vectors, `None` if either has zero length.
pub fn vec_angle(v1: &Vector3<f64>, v2: &Vector3<f64>) -> Option<f64> {
    let norms = v1.norm() * v2.norm();
    if norms <= f64::EPSILON {
        return None;
    }
    let cos = (v1.dot(v2) / norms).clamp(-1.0, 1.0);
    Some(cos.acos())
}

/// Signed rotation angle (radians) taking `from` onto `to` around `axis`, measured on the
/// plane perpendicular to the axis.
pub fn signed_angle_about(axis: &Vector3<f64>, from: &Vector3<f64>, to: &Vector3<f64>) -> f64 {
    let axis = axis.normalize();
    let from_perp = from - axis * axis.dot(from);
    let to_perp = to - axis * axis.dot(to);
    let sin = axis.dot(&from_perp.cross(&to_perp));
    let cos = from_perp.dot(&to_perp);
    sin.atan2(cos)
}

pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

pub fn radius_of_gyration(points: &[Point3<f64>]) -> Option<f64> {
    let center = centroid(points)?;
    let sq_sum: f64 = points.iter().map(|p| (p - center).norm_squared()).sum();
    Some((sq_sum / points.len() as f64).sqrt())
}

pub fn gyration_tensor(points: &[Point3<f64>]) -> Option<Matrix3<f64>> {
    let center = centroid(points)?;
    let sum = points.iter().fold(Matrix3::zeros(), |acc, p| {
        let d = p - center;
        acc + d * d.transpose()
    });
    Some(sum / points.len() as f64)
}

/// Principal moments of the gyration tensor, largest first.
pub fn gyration_eigenvalues(points: &[Point3<f64>]) -> Option<[f64; 3]> {
    let tensor = gyration_tensor(points)?;
    let eigen = SymmetricEigen::new(tensor);
    let mut values = [
        eigen.eigenvalues[0],
        eigen.eigenvalues[1],
        eigen.eigenvalues[2],
    ];
    values.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    Some(values)
}

/// Asphericity `b = l1 - (l2 + l3) / 2` of the gyration tensor.
pub fn asphericity(points: &[Point3<f64>]) -> Option<f64> {
    let [l1, l2, l3] = gyration_eigenvalues(points)?;
    Some(l1 - 0.5 * (l2 + l3))
}

/// Relative shape anisotropy `k^2 = 3/2 * sum(l^2) / (sum l)^2 - 1/2`.
///
/// Zero for spherically symmetric point sets and one for collinear ones; `NaN` when every
/// point coincides.
pub fn anisotropy(points: &[Point3<f64>]) -> Option<f64> {
    let [l1, l2, l3] = gyration_eigenvalues(points)?;
    let trace = l1 + l2 + l3;
    Some(1.5 * (l1 * l1 + l2 * l2 + l3 * l3) / (trace * trace) - 0.5)
}
