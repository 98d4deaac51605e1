//! Reading one MATLAB v7.3 (HDF5) sample file.
//!
//! Each file holds a single scan under one group: an integer image, its class
//! label and a binary tumor mask of the same shape as the image.

use std::path::Path;

use ndarray::{ArrayD, Axis};
use tracing::debug;

use crate::error::DataError;

/// Names of the group and fields read from every sample file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleLayout {
    pub group: String,
    pub label: String,
    pub image: String,
    pub mask: String,
    /// File extension without the dot; matched case-sensitively.
    pub extension: String,
}

impl Default for SampleLayout {
    fn default() -> Self {
        Self {
            group: "cjdata".to_string(),
            label: "label".to_string(),
            image: "image".to_string(),
            mask: "tumorMask".to_string(),
            extension: "mat".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Image scaled into `[0, 1]` with a leading axis of length 1.
    pub image: ArrayD<f32>,
    pub label: f64,
    pub mask: ArrayD<u8>,
}

/// Opens `path`, reads the three fields and normalizes the image.
///
/// The file handle is released before this returns.
pub fn load_sample(path: &Path, layout: &SampleLayout) -> Result<Sample, DataError> {
    let read_err = |err: hdf5::Error| DataError::SampleRead {
        path: path.to_path_buf(),
        message: err.to_string(),
    };
    let missing = |field: &str| DataError::MissingField {
        path: path.to_path_buf(),
        field: field.to_string(),
    };

    let (image, label, mask) = {
        let file = hdf5::File::open(path).map_err(read_err)?;
        if !file.link_exists(&layout.group) {
            return Err(missing(&layout.group));
        }
        let group = file.group(&layout.group).map_err(read_err)?;
        for field in [&layout.label, &layout.image, &layout.mask] {
            if !group.link_exists(field) {
                return Err(missing(&format!("{}/{field}", layout.group)));
            }
        }

        let label = group
            .dataset(&layout.label)
            .and_then(|ds| ds.read_raw::<f64>())
            .map_err(read_err)?;
        let image = group
            .dataset(&layout.image)
            .and_then(|ds| ds.read_dyn::<f32>())
            .map_err(read_err)?;
        let mask = group
            .dataset(&layout.mask)
            .and_then(|ds| ds.read_dyn::<u8>())
            .map_err(read_err)?;
        (image, label, mask)
    };

    let label = *label
        .first()
        .ok_or_else(|| DataError::EmptyLabel(path.to_path_buf()))?;
    let image = normalize_by_max(image)
        .ok_or_else(|| DataError::DegenerateImage(path.to_path_buf()))?;
    debug!(path = %path.display(), shape = ?image.shape(), label, "loaded sample");

    Ok(Sample {
        image: image.insert_axis(Axis(0)),
        label,
        mask,
    })
}

/// Divides every element by the array maximum.
///
/// Returns `None` when the array is empty, holds a non-finite element, or its maximum
/// is not positive.
pub fn normalize_by_max(image: ArrayD<f32>) -> Option<ArrayD<f32>> {
    if image.iter().any(|value| !value.is_finite()) {
        return None;
    }
    let max = image.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() || max <= 0.0 {
        return None;
    }
    Some(image.mapv_into(|value| value / max))
}
