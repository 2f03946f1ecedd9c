//! Impulsive transfer utilities: Lambert solver and classical transfer approximations.

pub mod lambert;
pub mod transfers;

pub use lambert::{
    Direction, LambertBranch, LambertError, LambertProblem, LambertSolution, Period,
    SolverOptions, solve as lambert_solve, solve_all as lambert_solve_all,
};
pub use transfers::TransferError;
