//! Composite: a fixed sequence of actions applied one after another via the
//! transition algebra (spec §4.4, §4.6). Used to build EndPhase out of a
//! MoraleCheck per eligible unit followed by the phase-advance transition,
//! but is otherwise a generic action combinator.

use anyhow::Result;
use std::fmt;

use crate::core::game::GameState;

use super::{compose, Action, CommandType};

#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub actions: Vec<Action>,
    pub reported_type: CommandType,
}

impl Composite {
    pub fn apply(&self, state: &GameState) -> Result<(Vec<GameState>, Vec<f64>)> {
        let mut states = vec![state.clone()];
        let mut probs = vec![1.0];

        for action in &self.actions {
            let (s, p) = compose(action, &states, &probs)?;
            states = s;
            probs = p;
        }

        Ok((states, probs))
    }
}

impl fmt::Display for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reported_type {
            CommandType::EndPhase => write!(f, "end phase"),
            _ => {
                write!(f, "composite(")?;
                for (i, a) in self.actions.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ")")
            }
        }
    }
}
