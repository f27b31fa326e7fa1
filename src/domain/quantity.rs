/// The quantity to commit on a line.
///
/// An absent or zero `requested` quantity means the host has no suggestion, so
/// everything available is committed. Otherwise the smaller of the two wins:
/// the payload never over-allocates and the host never receives more than it
/// asked for.
#[must_use]
pub fn commit(requested: Option<u32>, available: u32) -> u32 {
    match requested {
        None | Some(0) => available,
        Some(requested) => requested.min(available),
    }
}
