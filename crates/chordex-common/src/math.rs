/// Clamp `value` into `[low, high]`.
///
/// Values inside the range are returned unchanged; below `low` gives `low`,
/// anything else gives `high`.
pub fn clamp<T: PartialOrd>(value: T, low: T, high: T) -> T {
    if value < low {
        low
    } else if value > high {
        high
    } else {
        value
    }
}
