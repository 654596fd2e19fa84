//! Point formulas.
//!
//! Pure functions over integers. Rounding is half-up, done in integer
//! arithmetic so `round(11 * 0.8)` is exactly 9 on every platform.

/// Flat part of every correct guess.
pub const BASE_GUESS_POINTS: u32 = 10;
/// Time bonus for a guess made the instant guessing opens.
pub const MAX_TIME_BONUS: u32 = 10;
/// A guess made after the hint keeps this share of its points.
pub const HINT_PENALTY_PERCENT: u32 = 80;
/// Paid to the drawer for each correct guess, immediately.
pub const DRAWER_GUESS_BONUS: u32 = 5;
/// End-of-turn drawer bonus when every guesser got it.
pub const MAX_DRAWER_TURN_BONUS: u32 = 10;
/// Extra drawer bonus for a full clear, on top of the end-of-turn bonus.
pub const FULL_CLEAR_BONUS: u32 = 10;

/// `numerator / denominator` rounded half-up. `denominator` must be non-zero.
fn div_round(numerator: u64, denominator: u64) -> u64 {
    (2 * numerator + denominator) / (2 * denominator)
}

/// Points for a correct guess.
///
/// `10 + round(10 * remaining / total)`, scaled to 80% (rounded) when the
/// hint was already out. A zero `total_guess_time` earns no time bonus.
pub fn guess_award(seconds_remaining: u32, total_guess_time: u32, hint_revealed: bool) -> u32 {
    let time_bonus = if total_guess_time == 0 {
        0
    } else {
        let remaining = u64::from(seconds_remaining.min(total_guess_time));
        div_round(
            u64::from(MAX_TIME_BONUS) * remaining,
            u64::from(total_guess_time),
        ) as u32
    };
    let base = BASE_GUESS_POINTS + time_bonus;

    if hint_revealed {
        div_round(
            u64::from(base) * u64::from(HINT_PENALTY_PERCENT),
            100,
        ) as u32
    } else {
        base
    }
}

/// End-of-turn drawer bonus: `round(10 * correct / eligible)`, or nothing
/// if nobody guessed.
pub fn drawer_turn_bonus(correct: usize, eligible: usize) -> u32 {
    if correct == 0 || eligible == 0 {
        return 0;
    }
    let correct = correct.min(eligible) as u64;
    div_round(u64::from(MAX_DRAWER_TURN_BONUS) * correct, eligible as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_award_before_hint() {
        // 40/45 of the time left: round(8.89) = 9 bonus.
        assert_eq!(guess_award(40, 45, false), 19);
        assert_eq!(guess_award(45, 45, false), 20);
        assert_eq!(guess_award(0, 45, false), 10);
    }

    #[test]
    fn test_guess_award_after_hint() {
        // round(10 * 5/45) = 1, base 11, round(11 * 0.8) = 9.
        assert_eq!(guess_award(5, 45, true), 9);
        assert_eq!(guess_award(20, 45, true), 11);
    }

    #[test]
    fn test_guess_award_rounds_half_up() {
        // 10 * 1/4 = 2.5 → 3
        assert_eq!(guess_award(1, 4, false), 13);
    }

    #[test]
    fn test_guess_award_is_monotonic_in_remaining_time() {
        for hint in [false, true] {
            let mut previous = guess_award(45, 45, hint);
            for remaining in (0..45).rev() {
                let award = guess_award(remaining, 45, hint);
                assert!(award <= previous, "award rose at {remaining}s");
                previous = award;
            }
        }
    }

    #[test]
    fn test_hint_penalty_always_costs_points() {
        for remaining in 0..=45 {
            assert!(guess_award(remaining, 45, true) < guess_award(remaining, 45, false));
        }
    }

    #[test]
    fn test_guess_award_zero_total() {
        assert_eq!(guess_award(0, 0, false), BASE_GUESS_POINTS);
    }

    #[test]
    fn test_drawer_turn_bonus() {
        assert_eq!(drawer_turn_bonus(0, 3), 0);
        assert_eq!(drawer_turn_bonus(1, 3), 3);
        assert_eq!(drawer_turn_bonus(2, 3), 7);
        assert_eq!(drawer_turn_bonus(2, 2), 10);
        assert_eq!(drawer_turn_bonus(1, 0), 0);
    }
}
