//! Change detection between successive samples.

/// Whether `current` should be emitted given the last emitted value.
///
/// The comparison is exact: no trimming or normalisation beyond what the
/// sampler already did.
pub fn has_changed(previous: Option<&str>, current: &str) -> bool {
    previous != Some(current)
}
