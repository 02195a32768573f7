//! Movie subset selection.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

/// Pick `n` items uniformly at random, keeping their original order.
///
/// Returns everything when `n` is at least the number of items. With a
/// seed the selection is reproducible.
pub fn sample_movies<T: Clone>(movies: &[T], n: usize, seed: Option<u64>) -> Vec<T> {
    if n >= movies.len() {
        debug!(available = movies.len(), requested = n, "taking all movies");
        return movies.to_vec();
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut picked = rand::seq::index::sample(&mut rng, movies.len(), n).into_vec();
    picked.sort_unstable();

    info!(available = movies.len(), sampled = n, seeded = seed.is_some(), "sampled movies");
    picked.into_iter().map(|i| movies[i].clone()).collect()
}
