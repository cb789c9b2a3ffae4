//! Tag-exclusive quote selection.
//!
//! The corpus is shuffled (by reference) and scanned in permutation order;
//! the first quote sharing no tag with the forbidden set wins.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use quotecast_core::{Error, Result};
use quotecast_store::Quote;

/// A quote is eligible when none of its tags is forbidden. Untagged quotes always are.
pub fn is_eligible(quote: &Quote, forbidden: &HashSet<String>) -> bool {
    !quote.tags.iter().any(|t| forbidden.contains(t))
}

/// Pick a random eligible quote using `rng` for the permutation.
pub fn select_unique_with<R: Rng + ?Sized>(
    corpus: &[Quote],
    forbidden: &HashSet<String>,
    rng: &mut R,
) -> Result<Quote> {
    let mut order: Vec<&Quote> = corpus.iter().collect();
    order.shuffle(rng);
    order
        .into_iter()
        .find(|q| is_eligible(q, forbidden))
        .cloned()
        .ok_or(Error::NoUniqueQuoteAvailable)
}

enum RandomSource {
    /// Fresh OS-seeded generator on every call.
    Entropy,
    Seeded(StdRng),
}

/// Selector with an injectable random source.
pub struct Selector {
    source: RandomSource,
}

impl Selector {
    pub fn from_entropy() -> Self {
        Self {
            source: RandomSource::Entropy,
        }
    }

    /// Use `rng` for every permutation (deterministic with a fixed seed).
    pub fn seeded(rng: StdRng) -> Self {
        Self {
            source: RandomSource::Seeded(rng),
        }
    }

    pub fn select_unique(&mut self, corpus: &[Quote], forbidden: &HashSet<String>) -> Result<Quote> {
        match &mut self.source {
            RandomSource::Entropy => {
                let mut rng = StdRng::from_os_rng();
                select_unique_with(corpus, forbidden, &mut rng)
            }
            RandomSource::Seeded(rng) => select_unique_with(corpus, forbidden, rng),
        }
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self::from_entropy()
    }
}
