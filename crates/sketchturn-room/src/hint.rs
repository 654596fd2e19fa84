//! Hint masking.

use rand::Rng;

/// Masks `word`, keeping `reveal` distinct randomly chosen characters and
/// replacing every other one with `_`.
///
/// Positions are counted in `char`s, so multi-byte letters stay intact.
/// Words shorter than `reveal` are shown in full.
pub fn mask_word<R: Rng + ?Sized>(word: &str, reveal: usize, rng: &mut R) -> String {
    let chars: Vec<char> = word.chars().collect();
    let amount = reveal.min(chars.len());
    let shown = rand::seq::index::sample(rng, chars.len(), amount);

    let mut masked = vec!['_'; chars.len()];
    for i in shown.iter() {
        masked[i] = chars[i];
    }
    masked.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_mask_reveals_exactly_two_letters() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let masked = mask_word("apple", 2, &mut rng);
            assert_eq!(masked.chars().count(), 5);
            let shown: Vec<(usize, char)> = masked
                .chars()
                .enumerate()
                .filter(|(_, c)| *c != '_')
                .collect();
            assert_eq!(shown.len(), 2);
            for (i, c) in shown {
                assert_eq!(Some(c), "apple".chars().nth(i));
            }
        }
    }

    #[test]
    fn test_mask_short_words() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(mask_word("a", 2, &mut rng), "a");
        assert_eq!(mask_word("", 2, &mut rng), "");
    }

    #[test]
    fn test_mask_counts_chars_not_bytes() {
        let mut rng = StdRng::seed_from_u64(3);
        let masked = mask_word("crème", 0, &mut rng);
        assert_eq!(masked, "_____");
    }
}
