//! `.npy` export of surface points, shaped `(points, 3)`.

use crate::error::{SurfaceError, SurfaceResult};
use ndarray::Array2;
use std::path::Path;

pub fn points_to_array(points: &[[f32; 3]]) -> SurfaceResult<Array2<f32>> {
    let flat: Vec<f32> = points.iter().flatten().copied().collect();
    Array2::from_shape_vec((points.len(), 3), flat)
        .map_err(|e| SurfaceError::Snapshot(e.to_string()))
}

pub fn write_points<P: AsRef<Path>>(path: P, points: &[[f32; 3]]) -> SurfaceResult<()> {
    let path = path.as_ref();
    let array = points_to_array(points)?;
    ndarray_npy::write_npy(path, &array)
        .map_err(|e| SurfaceError::Snapshot(format!("failed to write {}: {}", path.display(), e)))?;
    log::info!("Wrote {} points to {}", points.len(), path.display());
    Ok(())
}

pub fn read_points<P: AsRef<Path>>(path: P) -> SurfaceResult<Vec<[f32; 3]>> {
    let path = path.as_ref();
    let array: Array2<f32> = ndarray_npy::read_npy(path)
        .map_err(|e| SurfaceError::Snapshot(format!("failed to read {}: {}", path.display(), e)))?;

    if array.ncols() != 3 {
        return Err(SurfaceError::Snapshot(format!(
            "expected (points, 3) array, got shape {:?}",
            array.shape()
        )));
    }

    Ok(array.rows().into_iter().map(|row| [row[0], row[1], row[2]]).collect())
}
