//! A SAT-based oracle over a set of constraints.
//!
//! The deduction engine never needs it to make progress; it exists to catch
//! contradictions that propagation alone would only notice later, and to
//! check the engine's conclusions against an exhaustive solver.

use crate::constraint::Constraint;
use crate::error::{Error, Result};
use crate::grid::Cell;
use itertools::Itertools;
use std::collections::HashMap;
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

/// What every assignment satisfying the constraints agrees on for one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forced {
    Mine,
    Safe,
    Undetermined,
}

/// Cardinality constraints larger than this use a sequential counter instead
/// of enumerating combinations.
const NAIVE_ENCODING_LIMIT: usize = 10;

struct Encoded<'a> {
    solver: Solver<'a>,
    vars: HashMap<Cell, Var>,
}

fn encode<'a>(constraints: &[Constraint]) -> Encoded<'a> {
    let mut solver = Solver::new();
    let mut vars: HashMap<Cell, Var> = HashMap::new();
    let mut formula = CnfFormula::new();

    for constraint in constraints {
        let lits: Vec<Lit> = constraint
            .cells()
            .iter()
            .map(|cell| {
                let var = *vars.entry(*cell).or_insert_with(|| solver.new_var());
                Lit::from_var(var, true)
            })
            .collect();
        encode_exactly_k(&mut formula, &mut solver, &lits, constraint.count());
    }

    solver.add_formula(&formula);
    Encoded { solver, vars }
}

/// Whether some placement of mines satisfies every constraint at once.
pub fn is_satisfiable(constraints: &[Constraint]) -> Result<bool> {
    let Encoded { mut solver, .. } = encode(constraints);
    solver.solve().map_err(|e| Error::Solver(e.to_string()))
}

/// Tests both values of `cell` against the constraints. Cells the constraints
/// never mention are always undetermined.
pub fn forced(constraints: &[Constraint], cell: Cell) -> Result<Forced> {
    let Encoded { mut solver, vars } = encode(constraints);

    let Some(&var) = vars.get(&cell) else {
        return Ok(Forced::Undetermined);
    };

    let mut possible = |lit: Lit| -> Result<bool> {
        solver.assume(&[lit]);
        let result = solver.solve().map_err(|e| Error::Solver(e.to_string()));
        solver.assume(&[]);
        result
    };

    let mine_possible = possible(Lit::from_var(var, true))?;
    let safe_possible = possible(Lit::from_var(var, false))?;

    match (mine_possible, safe_possible) {
        (true, true) => Ok(Forced::Undetermined),
        (true, false) => Ok(Forced::Mine),
        (false, true) => Ok(Forced::Safe),
        (false, false) => Err(Error::Contradiction(
            "constraints admit no placement of mines".to_string(),
        )),
    }
}

fn encode_exactly_k(formula: &mut CnfFormula, solver: &mut Solver, vars: &[Lit], k: usize) {
    encode_at_most_k(formula, solver, vars, k);
    encode_at_least_k(formula, solver, vars, k);
}

fn encode_at_most_k(formula: &mut CnfFormula, solver: &mut Solver, vars: &[Lit], k: usize) {
    if k >= vars.len() {
        return;
    }
    if k == 0 {
        for &lit in vars {
            formula.add_clause(&[!lit]);
        }
        return;
    }

    if vars.len() <= NAIVE_ENCODING_LIMIT {
        // No k + 1 of them may all be mines.
        for combo in vars.iter().copied().combinations(k + 1) {
            let clause: Vec<Lit> = combo.iter().map(|&lit| !lit).collect();
            formula.add_clause(&clause);
        }
    } else {
        encode_sequential_counter(formula, solver, vars, k);
    }
}

fn encode_at_least_k(formula: &mut CnfFormula, solver: &mut Solver, vars: &[Lit], k: usize) {
    if k == 0 {
        return;
    }
    if k > vars.len() {
        formula.add_clause(&[]);
        return;
    }

    if vars.len() <= NAIVE_ENCODING_LIMIT {
        // Any n - k + 1 of them must contain a mine.
        for combo in vars.iter().copied().combinations(vars.len() - k + 1) {
            formula.add_clause(&combo);
        }
    } else {
        // At least k true is at most n - k false.
        let negated: Vec<Lit> = vars.iter().map(|&lit| !lit).collect();
        encode_sequential_counter(formula, solver, &negated, vars.len() - k);
    }
}

/// Sinz's sequential counter for "at most k of `vars`". `r[i][j]` holds when
/// at least `j + 1` of the first `i + 1` literals are true.
fn encode_sequential_counter(
    formula: &mut CnfFormula,
    solver: &mut Solver,
    vars: &[Lit],
    k: usize,
) {
    let n = vars.len();
    if n == 0 || k >= n {
        return;
    }
    if k == 0 {
        for &lit in vars {
            formula.add_clause(&[!lit]);
        }
        return;
    }

    let r: Vec<Vec<Lit>> = (0..n)
        .map(|_| (0..k).map(|_| Lit::from_var(solver.new_var(), true)).collect())
        .collect();

    formula.add_clause(&[!vars[0], r[0][0]]);
    for j in 1..k {
        formula.add_clause(&[!r[0][j]]);
    }

    for i in 1..n {
        formula.add_clause(&[!vars[i], r[i][0]]);
        formula.add_clause(&[!r[i - 1][0], r[i][0]]);
        for j in 1..k {
            formula.add_clause(&[!vars[i], !r[i - 1][j - 1], r[i][j]]);
            formula.add_clause(&[!r[i - 1][j], r[i][j]]);
        }
        // Overflow: the (k + 1)th true literal.
        formula.add_clause(&[!vars[i], !r[i - 1][k - 1]]);
    }
}
