//! Player identity and rating.
//!
//! A `Player` is a named identity with a mutable Elo-style rating. It is
//! reference-counted (`Arc`) rather than owned by any single client: the
//! same player can be looked up by multiple client sessions (e.g. a
//! reconnect, or a query from another client), and the player registry
//! itself holds a strong reference for as long as the process runs.

use std::sync::Mutex;

/// Starting rating assigned to every new player.
pub const INITIAL_RATING: i32 = 1500;

/// The outcome of a finished game from the perspective of two specific
/// players, used to drive the rating update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameResult {
    Draw,
    FirstWon,
    SecondWon,
}

struct PlayerInner {
    username: String,
    rating: i32,
}

/// A named identity with a mutable rating.
///
/// Mutable fields (`rating`) live behind the player's own lock; `username`
/// never changes after creation; it's copied out of the lock so reading it
/// doesn't require holding a guard across logging or formatting calls.
pub struct Player {
    inner: Mutex<PlayerInner>,
}

impl Player {
    /// Creates a player with [`INITIAL_RATING`].
    pub(crate) fn new(username: String) -> Self {
        Player {
            inner: Mutex::new(PlayerInner {
                username,
                rating: INITIAL_RATING,
            }),
        }
    }

    pub fn username(&self) -> String {
        self.inner.lock().expect("player mutex poisoned").username.clone()
    }

    pub fn rating(&self) -> i32 {
        self.inner.lock().expect("player mutex poisoned").rating
    }

}

/// Updates both players' ratings after a finished game.
///
/// `result` is from `first`'s perspective. Acquires both players' locks in
/// a fixed order — by username, ascending — and holds both for the whole
/// read-compute-write, so that two games finishing concurrently (e.g.
/// alice-bob and bob-carol) can never deadlock on the shared player, and a
/// third result posting to the same player mid-update can never observe a
/// torn rating.
pub fn post_result(first: &Player, second: &Player, result: GameResult) {
    let (score_first, score_second) = match result {
        GameResult::Draw => (0.5, 0.5),
        GameResult::FirstWon => (1.0, 0.0),
        GameResult::SecondWon => (0.0, 1.0),
    };

    let first_before_second = first.username() <= second.username();

    let (mut first_guard, mut second_guard) = if first_before_second {
        let g1 = first.inner.lock().expect("player mutex poisoned");
        let g2 = second.inner.lock().expect("player mutex poisoned");
        (g1, g2)
    } else {
        let g2 = second.inner.lock().expect("player mutex poisoned");
        let g1 = first.inner.lock().expect("player mutex poisoned");
        (g1, g2)
    };

    let rating_first = first_guard.rating;
    let rating_second = second_guard.rating;

    let expected_first = 1.0 / (1.0 + 10f64.powf((rating_second - rating_first) as f64 / 400.0));
    let expected_second = 1.0 - expected_first;

    let delta_first = (32.0 * (score_first - expected_first)) as i32;
    let delta_second = (32.0 * (score_second - expected_second)) as i32;

    first_guard.rating = rating_first + delta_first;
    second_guard.rating = rating_second + delta_second;

    tracing::info!(
        first = %first_guard.username,
        second = %second_guard.username,
        ?result,
        delta_first,
        delta_second,
        "ratings updated"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_starts_at_initial_rating() {
        let p = Player::new("alice".into());
        assert_eq!(p.rating(), INITIAL_RATING);
        assert_eq!(p.username(), "alice");
    }

    #[test]
    fn test_post_result_draw_between_equal_ratings_does_not_change_rating() {
        let alice = Player::new("alice".into());
        let bob = Player::new("bob".into());
        post_result(&alice, &bob, GameResult::Draw);
        assert_eq!(alice.rating(), INITIAL_RATING);
        assert_eq!(bob.rating(), INITIAL_RATING);
    }

    #[test]
    fn test_post_result_win_between_equal_ratings_moves_16_points() {
        let alice = Player::new("alice".into());
        let bob = Player::new("bob".into());
        post_result(&alice, &bob, GameResult::FirstWon);
        assert_eq!(alice.rating(), INITIAL_RATING + 16);
        assert_eq!(bob.rating(), INITIAL_RATING - 16);
    }

    #[test]
    fn test_post_result_is_symmetric_regardless_of_argument_order() {
        let alice = Player::new("alice".into());
        let bob = Player::new("bob".into());
        // bob passed first, alice second: alice should still be "the loser".
        post_result(&bob, &alice, GameResult::SecondWon);
        assert_eq!(alice.rating(), INITIAL_RATING - 16);
        assert_eq!(bob.rating(), INITIAL_RATING + 16);
    }
}
