use rand::Rng;

/// Pick a variant index uniformly from `[0, variant_count)`.
///
/// Counts of 0 or 1 return 0 without drawing from the generator.
pub fn select(variant_count: usize) -> usize {
    if variant_count <= 1 {
        return 0;
    }
    select_with(&mut rand::rng(), variant_count)
}

pub fn select_with<R: Rng + ?Sized>(rng: &mut R, variant_count: usize) -> usize {
    if variant_count <= 1 {
        return 0;
    }
    rng.random_range(0..variant_count)
}

#[cfg(test)]
#[path = "../../tests/unit/dispatch/variant.rs"]
mod tests;
