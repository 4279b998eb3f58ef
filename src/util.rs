//! Small vector utilities.
use crate::error::check_dimension;
use crate::{Real, TransferError};
use nalgebra::DVector;

/// Subtracts the mean of the selected entries from each selected entry.
///
/// Entries that are not selected are left untouched. This is typically used to fix the
/// constant in the solution of a pure Neumann problem, where `selection` marks the dofs of
/// the pressure or potential component.
///
/// # Errors
///
/// Returns [`TransferError::DimensionMismatch`] if the selection does not have one entry per
/// vector entry, and [`TransferError::EmptySelection`] if no entry is selected.
pub fn subtract_mean_value<T: Real>(vector: &mut DVector<T>, selection: &[bool]) -> Result<(), TransferError> {
    check_dimension(vector.len(), selection.len())?;

    let (sum, count) = vector
        .iter()
        .zip(selection)
        .filter(|(_, &selected)| selected)
        .fold((T::zero(), 0usize), |(sum, count), (&value, _)| (sum + value, count + 1));
    if count == 0 {
        return Err(TransferError::EmptySelection);
    }

    let count = T::from_usize(count).expect("Count must fit in T");
    let mean = sum / count;
    for (value, _) in vector
        .iter_mut()
        .zip(selection)
        .filter(|(_, &selected)| selected)
    {
        *value -= mean;
    }
    Ok(())
}
