//! Ambient configuration structs, following the teacher's `GameConfig`
//! pattern (`core/game.rs`) of a plain struct with a `Default` impl.

/// Static board configuration for a game: size and real-world scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameConfig {
    pub board_size: i32,
    pub scale: f64,
    pub turn_limit: i32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_size: 25,
            scale: 1.0,
            turn_limit: -1,
        }
    }
}

/// Tuning knobs for the self-play MCTS driver (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfPlayConfig {
    /// UCB1 exploration constant `c`.
    pub exploration_c: f64,
    /// Final-policy temperature `tau`. `0.0` means argmax-on-visits.
    pub temperature: f64,
    /// Number of root simulations to accumulate before Commit is allowed.
    pub num_simulations: u32,
    /// Worker-pool thread count for Select/Update (spec §5).
    pub num_threads: usize,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            exploration_c: 1.41421356,
            temperature: 1.0,
            num_simulations: 100,
            num_threads: 1,
        }
    }
}
