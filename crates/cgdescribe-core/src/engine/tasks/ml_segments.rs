use crate::core::models::coords::GeometryError;
use crate::core::models::graph::GraphError;
use crate::core::models::ids::ElementId;
use crate::core::models::rna::CoarseGrainRna;
use crate::core::topology::multiloop::MultiloopDescriptor;
use crate::core::utils::geometry;
use crate::engine::error::EngineError;
use crate::engine::features::{FeatureRow, FeatureValue};
use tracing::{debug, instrument};

/// Describes every multiloop segment of `rna`, one row per `m` element in loop order.
///
/// Unlike whole-structure features, nothing is downgraded to `NaN` here: any failure
/// aborts the structure.
#[instrument(skip_all, name = "ml_segments_task", fields(name = rna.name()))]
pub fn run(rna: &CoarseGrainRna) -> Result<Vec<FeatureRow>, EngineError> {
    let mut rows = Vec::new();

    for ml in rna.find_mlonly_multiloops()? {
        let description = rna.describe_multiloop(&ml)?;
        debug!(
            "Multiloop of {} elements starting at {:?}: {:?}",
            ml.len(),
            ml.elements().first(),
            description
        );

        for segment in ml.segments() {
            let mut row = FeatureRow::new();
            row.set("segment", segment.to_string());
            row.set("junction_length", FeatureValue::count(ml.len()));
            row.set(
                "segment_length",
                FeatureValue::count(rna.element_length(segment)?),
            );
            row.set(
                "angle_type",
                FeatureValue::Int(i64::from(rna.angle_type(segment)?.abs())),
            );
            row.set("angle_between_stems", angle_between_stems(rna, segment)?);
            row.set(
                "junction_va_distance",
                rna.junction_virtual_atom_distance(segment)?,
            );
            row.set(
                "is_external_multiloop",
                description.contains(&MultiloopDescriptor::Open),
            );
            row.set(
                "is_pseudoknotted_multiloop",
                description.contains(&MultiloopDescriptor::Pseudoknot),
            );
            row.set(
                "is_regular_multiloop",
                description.contains(&MultiloopDescriptor::RegularMultiloop),
            );
            rows.push(row);
        }
    }
    Ok(rows)
}

fn angle_between_stems(rna: &CoarseGrainRna, segment: ElementId) -> Result<f64, EngineError> {
    let stems = rna.connections(segment)?;
    let [first, second] = stems.as_slice() else {
        return Err(GraphError::UnresolvedConnection {
            id: segment,
            reason: format!("expected two connected stems, found {}", stems.len()),
        }
        .into());
    };
    let v1 = rna.direction(*first)?;
    let v2 = rna.direction(*second)?;
    let angle = geometry::vec_angle(&v1, &v2).ok_or_else(|| {
        GeometryError::Degenerate(format!("stems {} and {} have no direction", first, second))
    })?;
    Ok(angle)
}
