use fetra::util::subtract_mean_value;
use fetra::TransferError;
use nalgebra::DVector;
use proptest::collection::vec;
use proptest::prelude::*;
use util::selected_mean;

#[test]
fn subtract_mean_value_rejects_invalid_selection() {
    let mut v = DVector::from_column_slice(&[1.0, 2.0, 3.0]);
    assert!(matches!(
        subtract_mean_value(&mut v, &[true, false]),
        Err(TransferError::DimensionMismatch { expected: 3, actual: 2 })
    ));
    assert!(matches!(
        subtract_mean_value(&mut v, &[false, false, false]),
        Err(TransferError::EmptySelection)
    ));
    assert_eq!(v.as_slice(), &[1.0, 2.0, 3.0]);
}

#[test]
fn subtract_mean_value_of_simple_vector() {
    let mut v = DVector::from_column_slice(&[1.0, 10.0, 3.0, -4.0]);
    subtract_mean_value(&mut v, &[true, false, true, false]).unwrap();
    assert_eq!(v.as_slice(), &[-1.0, 10.0, 1.0, -4.0]);
}

proptest! {
    #[test]
    fn selected_mean_vanishes_and_unselected_entries_are_unchanged(
        entries in vec((-10.0..10.0f64, any::<bool>()), 1..30)
    ) {
        let (values, mut selection): (Vec<f64>, Vec<bool>) = entries.into_iter().unzip();
        selection[0] = true;

        let original = DVector::from_vec(values);
        let mut v = original.clone();
        subtract_mean_value(&mut v, &selection).unwrap();

        let mean = selected_mean(&v, &selection).unwrap();
        prop_assert!(mean.abs() <= 1e-12);
        for ((after, before), &selected) in v.iter().zip(original.iter()).zip(&selection) {
            if !selected {
                prop_assert_eq!(after.to_bits(), before.to_bits());
            }
        }
    }
}
