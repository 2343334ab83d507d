use rand::Rng;

/// Return a uniformly shuffled copy of `items` using the thread-local RNG.
#[must_use]
pub fn shuffle<T: Clone>(items: &[T]) -> Vec<T> {
    shuffle_with(items, &mut rand::rng())
}

/// Return a uniformly shuffled copy of `items` drawing from `rng`.
///
/// Fisher–Yates from the back: for each `i` in `len-1..=1`, pick `j` in
/// `0..=i` and swap. The input slice is left untouched.
#[must_use]
pub fn shuffle_with<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    for i in (1..out.len()).rev() {
        let j = rng.random_range(0..=i);
        out.swap(i, j);
    }
    out
}
