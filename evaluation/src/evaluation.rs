use std::{iter::Sum, ops::AddAssign};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
    /// Doubled and split hands can win or lose more than one unit.
    pub total_return: i64,
}

impl AddAssign for Evaluation {
    fn add_assign(&mut self, rhs: Self) {
        self.wins += rhs.wins;
        self.losses += rhs.losses;
        self.draws += rhs.draws;
        self.total_return += rhs.total_return;
    }
}

impl Sum for Evaluation {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |mut a, b| {
            a += b;
            a
        })
    }
}

impl Evaluation {
    /// Classify one episode by the sign of its return.
    pub fn from_return(episode_return: i32) -> Self {
        let mut evaluation = match episode_return.signum() {
            1 => Self::win(),
            -1 => Self::loss(),
            _ => Self::draw(),
        };
        evaluation.total_return = i64::from(episode_return);
        evaluation
    }

    pub const fn games(&self) -> u64 {
        self.wins + self.losses + self.draws
    }

    pub fn win_rate(&self) -> f64 {
        #![allow(clippy::cast_precision_loss)]
        if self.games() == 0 {
            return 0.0;
        }
        self.wins as f64 / self.games() as f64
    }

    pub fn mean_return(&self) -> f64 {
        #![allow(clippy::cast_precision_loss)]
        if self.games() == 0 {
            return 0.0;
        }
        self.total_return as f64 / self.games() as f64
    }

    pub fn win() -> Self {
        Self {
            wins: 1,
            ..Default::default()
        }
    }

    pub fn loss() -> Self {
        Self {
            losses: 1,
            ..Default::default()
        }
    }

    pub fn draw() -> Self {
        Self {
            draws: 1,
            ..Default::default()
        }
    }
}
