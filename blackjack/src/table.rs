//! Plain-text storage of the action values, one state per line:
//!
//! `{player_sum};{dealer_upcard};{usable_ace};{is_pair};{value}:{weight},...`
//!
//! with one `value:weight` pair per action, in action index order. The
//! weight is the visit count for on-policy values and the cumulative
//! importance weight `C` for off-policy values.

use std::{
    fmt,
    fs::OpenOptions,
    io::{self, BufRead, BufReader, BufWriter, Write},
    num::{ParseFloatError, ParseIntError},
    path::Path,
    str::{FromStr, ParseBoolError},
};

use thiserror::Error;

use crate::{
    action::ACTION_COUNT,
    env::hand::State,
    value::{ActionValues, Entry, Estimate},
};

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Row {
    pub state: State,
    pub entry: Entry,
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let State {
            player_sum,
            dealer_upcard,
            usable_ace,
            is_pair,
        } = self.state;
        let estimates = self
            .entry
            .iter()
            .map(|e| format!("{}:{}", e.value, e.weight))
            .collect::<Vec<_>>()
            .join(",");

        writeln!(f, "{player_sum};{dealer_upcard};{usable_ace};{is_pair};{estimates}")
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseRowError {
    #[error("missing player sum")]
    MissingPlayerSum,
    #[error("missing dealer upcard")]
    MissingDealerUpcard,
    #[error("missing usable ace flag")]
    MissingUsableAce,
    #[error("missing pair flag")]
    MissingPair,
    #[error("missing estimates")]
    MissingEstimates,
    #[error("estimate format is wrong")]
    WrongEstimateFormat,
    #[error("expected {ACTION_COUNT} estimates, found {0}")]
    WrongEstimateCount(usize),
    #[error("unexpected trailing field")]
    Trailing,
    #[error("{0}")]
    Int(#[from] ParseIntError),
    #[error("{0}")]
    Float(#[from] ParseFloatError),
    #[error("{0}")]
    Bool(#[from] ParseBoolError),
}

impl FromStr for Row {
    type Err = ParseRowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut iter = s.trim().split(';');
        let state = State {
            player_sum: iter.next().ok_or(ParseRowError::MissingPlayerSum)?.parse()?,
            dealer_upcard: iter
                .next()
                .ok_or(ParseRowError::MissingDealerUpcard)?
                .parse()?,
            usable_ace: iter.next().ok_or(ParseRowError::MissingUsableAce)?.parse()?,
            is_pair: iter.next().ok_or(ParseRowError::MissingPair)?.parse()?,
        };
        let estimates = iter
            .next()
            .ok_or(ParseRowError::MissingEstimates)?
            .split(',')
            .map(|s| {
                s.split_once(':')
                    .ok_or(ParseRowError::WrongEstimateFormat)
                    .and_then(|(v, w)| {
                        Ok(Estimate {
                            value: v.parse()?,
                            weight: w.parse()?,
                        })
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if iter.next().is_some() {
            return Err(ParseRowError::Trailing);
        }
        let count = estimates.len();
        let entry: Entry = estimates
            .try_into()
            .map_err(|_| ParseRowError::WrongEstimateCount(count))?;

        Ok(Self { state, entry })
    }
}

#[derive(Error, Debug)]
pub enum TableError {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("line {line}: {source}")]
    Parse { line: usize, source: ParseRowError },
}

/// All rows, ordered by state so that output is stable.
#[must_use]
pub fn rows(values: &ActionValues) -> Vec<Row> {
    let mut rows: Vec<_> = values
        .iter()
        .map(|(state, entry)| Row {
            state: *state,
            entry: *entry,
        })
        .collect();
    rows.sort_by_key(|row| row.state);
    rows
}

/// Write the values to `path`, replacing the file if it exists.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save(values: &ActionValues, path: impl AsRef<Path>) -> Result<(), io::Error> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    let mut writer = BufWriter::new(file);
    for row in rows(values) {
        write!(writer, "{row}")?;
    }
    writer.flush()
}

/// Read values written by [`save`]. Blank lines are skipped.
///
/// # Errors
///
/// Returns an error if the file cannot be read or any line is malformed.
pub fn load(path: impl AsRef<Path>) -> Result<ActionValues, TableError> {
    let reader = BufReader::new(OpenOptions::new().read(true).open(path)?);
    let mut values = ActionValues::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row: Row = line.parse().map_err(|source| TableError::Parse {
            line: index + 1,
            source,
        })?;
        values.insert(row.state, row.entry);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use std::env;

    use rand::{Rng, SeedableRng};

    use super::{load, rows, save, ParseRowError, Row, TableError};
    use crate::{
        action::Action,
        env::hand::State,
        value::{ActionValues, Estimate},
    };

    const STATE: State = State {
        player_sum: 13,
        dealer_upcard: 11,
        usable_ace: true,
        is_pair: false,
    };

    #[test]
    fn row_format() {
        let mut entry = [Estimate::default(); 4];
        entry[Action::Hit.index()] = Estimate {
            value: -0.25,
            weight: 4.0,
        };
        let row = Row {
            state: STATE,
            entry,
        };
        let string = row.to_string();
        assert_eq!(string, "13;11;true;false;0:0,-0.25:4,0:0,0:0\n");
        assert_eq!(string.parse::<Row>(), Ok(row));
    }

    #[test]
    fn malformed_rows() {
        assert!(matches!("".parse::<Row>(), Err(ParseRowError::Int(_))));
        assert_eq!("13;11".parse::<Row>(), Err(ParseRowError::MissingUsableAce));
        assert_eq!(
            "13;11;true;false".parse::<Row>(),
            Err(ParseRowError::MissingEstimates)
        );
        assert_eq!(
            "13;11;true;false;0:0,0:0".parse::<Row>(),
            Err(ParseRowError::WrongEstimateCount(2))
        );
        assert_eq!(
            "13;11;true;false;0:0,0,0:0,0:0".parse::<Row>(),
            Err(ParseRowError::WrongEstimateFormat)
        );
        assert_eq!(
            "13;11;true;false;0:0,0:0,0:0,0:0;x".parse::<Row>(),
            Err(ParseRowError::Trailing)
        );
        assert!(matches!(
            "13;11;yes;false;0:0,0:0,0:0,0:0".parse::<Row>(),
            Err(ParseRowError::Bool(_))
        ));
    }

    #[test]
    fn save_and_load() {
        const SEED: u64 = 123;
        let mut rng = rand::rngs::StdRng::seed_from_u64(SEED);
        let mut values = ActionValues::new();
        for _ in 0..500 {
            let state = State {
                player_sum: rng.gen_range(4..=21),
                dealer_upcard: rng.gen_range(2..=11),
                usable_ace: rng.gen(),
                is_pair: rng.gen(),
            };
            let action = Action::ALL[rng.gen_range(0..4)];
            values.update(state, action, rng.gen_range(-2.0..=2.0), rng.gen_range(0.1..10.0));
        }

        let path = env::temp_dir().join(format!("blackjack_table_{}.txt", std::process::id()));
        save(&values, &path).unwrap();
        let loaded = load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded, values);
        assert_eq!(rows(&loaded), rows(&values));
    }

    #[test]
    fn load_reports_line_numbers() {
        let path = env::temp_dir().join(format!("blackjack_bad_{}.txt", std::process::id()));
        std::fs::write(&path, "13;11;true;false;0:0,0:0,0:0,0:0\n\n13;11;true\n").unwrap();
        let result = load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            result,
            Err(TableError::Parse {
                line: 3,
                source: ParseRowError::MissingPair
            })
        ));
    }
}
