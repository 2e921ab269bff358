use crate::constraint::Constraint;
use crate::error::{Error, Result};
use crate::grid::{Bounds, Cell};
use crate::sat;
use itertools::Itertools;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, trace, warn};

/// What a single run of the propagation fixpoint changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Propagation {
    /// Number of deduction/inference rounds that made progress.
    pub rounds: usize,
    pub marked_safe: usize,
    pub marked_mine: usize,
    /// Constraints appended by the subset rule.
    pub derived: usize,
}

impl Propagation {
    pub fn is_noop(&self) -> bool {
        self.marked_safe == 0 && self.marked_mine == 0 && self.derived == 0
    }
}

/// The agent's growing body of facts about one game.
///
/// `moves_made`, `safe` and `mine` only ever grow. A cell whose status is
/// known is purged from every live constraint, so constraints only mention
/// unknown cells.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    bounds: Bounds,
    moves_made: HashSet<Cell>,
    safe: HashSet<Cell>,
    mine: HashSet<Cell>,
    constraints: Vec<Constraint>,
}

impl KnowledgeBase {
    pub fn new(bounds: Bounds) -> Self {
        KnowledgeBase {
            bounds,
            moves_made: HashSet::new(),
            safe: HashSet::new(),
            mine: HashSet::new(),
            constraints: Vec::new(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn moves_made(&self) -> &HashSet<Cell> {
        &self.moves_made
    }

    pub fn safe(&self) -> &HashSet<Cell> {
        &self.safe
    }

    pub fn mine(&self) -> &HashSet<Cell> {
        &self.mine
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Records `cell` as a mine and removes it from every constraint.
    pub fn mark_mine(&mut self, cell: Cell) -> Result<()> {
        if self.safe.contains(&cell) {
            return Err(self.contradiction(format!(
                "{cell} is already known to be safe"
            )));
        }
        if !self.mine.insert(cell) {
            return Ok(());
        }
        for constraint in &mut self.constraints {
            constraint.remove_as_mine(cell)?;
        }
        Ok(())
    }

    /// Records `cell` as safe and removes it from every constraint.
    pub fn mark_safe(&mut self, cell: Cell) -> Result<()> {
        if self.mine.contains(&cell) {
            return Err(self.contradiction(format!(
                "{cell} is already known to be a mine"
            )));
        }
        if !self.safe.insert(cell) {
            return Ok(());
        }
        for constraint in &mut self.constraints {
            constraint.remove_as_safe(cell)?;
        }
        Ok(())
    }

    /// Takes in that `cell` is safe and that `count` of its neighbors are
    /// mines, then propagates until nothing more can be deduced.
    ///
    /// Caller mistakes (an unknown cell, a replayed cell, an impossible count)
    /// are rejected before anything is changed. A [`Error::Contradiction`]
    /// may leave the knowledge base half-updated; it must be discarded.
    pub fn record_observation(&mut self, cell: Cell, count: usize) -> Result<Propagation> {
        self.bounds.check(cell)?;
        if self.moves_made.contains(&cell) {
            return Err(Error::AlreadyObserved(cell));
        }

        let raw: Vec<Cell> = self.bounds.neighbors(cell).collect();
        if count > raw.len() {
            return Err(Error::CountOutOfRange {
                cell,
                count,
                neighbors: raw.len(),
            });
        }

        self.moves_made.insert(cell);
        self.mark_safe(cell)?;

        let known_mines = raw.iter().filter(|&n| self.mine.contains(n)).count();
        let Some(adjusted) = count.checked_sub(known_mines) else {
            return Err(self.contradiction(format!(
                "{cell} reports {count} mines but {known_mines} are already known"
            )));
        };

        let candidates: BTreeSet<Cell> = raw
            .into_iter()
            .filter(|n| !self.safe.contains(n) && !self.mine.contains(n))
            .collect();

        if candidates.is_empty() {
            if adjusted != 0 {
                return Err(self.contradiction(format!(
                    "{cell} reports {adjusted} more mines but has no unknown neighbors"
                )));
            }
        } else {
            let constraint = Constraint::new(candidates, adjusted)?;
            debug!(%constraint, "observed");
            if !self.constraints.contains(&constraint) {
                self.constraints.push(constraint);
            }
        }

        self.propagate()
    }

    /// Alternates the deduction and subset-inference passes until a full
    /// round changes nothing. Calling it again after convergence is a no-op.
    pub fn propagate(&mut self) -> Result<Propagation> {
        let mut summary = Propagation::default();

        loop {
            let (safe, mines) = self.deduce()?;
            let derived = self.infer()?;

            if safe == 0 && mines == 0 && derived == 0 {
                break;
            }

            summary.rounds += 1;
            summary.marked_safe += safe;
            summary.marked_mine += mines;
            summary.derived += derived;
            trace!(round = summary.rounds, safe, mines, derived, "propagation round");
        }

        Ok(summary)
    }

    /// Marks every cell a trivial constraint pins down, then drops the
    /// constraints that became empty or now duplicate another live one.
    /// Returns how many cells were marked safe and mine.
    fn deduce(&mut self) -> Result<(usize, usize)> {
        let mut new_safe = BTreeSet::new();
        let mut new_mines = BTreeSet::new();

        for constraint in &self.constraints {
            if let Some(cells) = constraint.known_safe() {
                new_safe.extend(cells.iter().copied());
            }
            if let Some(cells) = constraint.known_mines() {
                new_mines.extend(cells.iter().copied());
            }
        }

        if let Some(cell) = new_safe.intersection(&new_mines).next() {
            return Err(self.contradiction(format!(
                "{cell} is deduced to be both safe and a mine"
            )));
        }

        if new_safe.is_empty() && new_mines.is_empty() {
            return Ok((0, 0));
        }
        debug!(safe = ?new_safe, mines = ?new_mines, "deduced");

        // Only constraints that lose cells here can become empty or collide
        // with another constraint.
        let touched: Vec<bool> = self
            .constraints
            .iter()
            .map(|c| {
                c.cells()
                    .iter()
                    .any(|cell| new_safe.contains(cell) || new_mines.contains(cell))
            })
            .collect();

        for &cell in &new_safe {
            self.mark_safe(cell)?;
        }
        for &cell in &new_mines {
            self.mark_mine(cell)?;
        }

        let mut keep = vec![true; self.constraints.len()];
        for i in (0..self.constraints.len()).filter(|&i| touched[i]) {
            let constraint = &self.constraints[i];
            let redundant = constraint.is_empty()
                || self.constraints.iter().enumerate().any(|(j, other)| {
                    j != i && keep[j] && (!touched[j] || j < i) && other == constraint
                });
            keep[i] = !redundant;
        }

        let mut keep = keep.into_iter();
        self.constraints.retain(|_| keep.next().unwrap_or(true));

        Ok((new_safe.len(), new_mines.len()))
    }

    /// Applies the subset rule to every ordered pair of live constraints and
    /// appends the derived constraints that are not known yet. Returns how many
    /// were appended.
    fn infer(&mut self) -> Result<usize> {
        let mut derived: Vec<Constraint> = Vec::new();

        for (a, b) in self.constraints.iter().tuple_combinations() {
            for candidate in [a.difference_from(b), b.difference_from(a)]
                .into_iter()
                .flatten()
            {
                let candidate = candidate?;
                if !self.constraints.contains(&candidate) && !derived.contains(&candidate) {
                    derived.push(candidate);
                }
            }
        }

        for constraint in &derived {
            debug!(%constraint, "inferred");
        }

        let count = derived.len();
        self.constraints.extend(derived);
        Ok(count)
    }

    /// Checks the documented invariants: no cell is both safe and a mine, and
    /// no known cell survives inside a constraint.
    pub fn check_invariants(&self) -> Result<()> {
        if let Some(cell) = self.safe.intersection(&self.mine).next() {
            return Err(Error::Contradiction(format!(
                "{cell} is both safe and a mine"
            )));
        }

        for constraint in &self.constraints {
            if constraint.count() > constraint.len() {
                return Err(Error::Contradiction(format!(
                    "{constraint} holds more mines than cells"
                )));
            }
            if let Some(cell) = constraint
                .cells()
                .iter()
                .find(|&c| self.safe.contains(c) || self.mine.contains(c))
            {
                return Err(Error::Contradiction(format!(
                    "{cell} is known but still appears in {constraint}"
                )));
            }
        }

        Ok(())
    }

    /// Asks the SAT oracle whether the live constraints still admit a
    /// placement of mines. Catches contradictions that no single constraint
    /// exposes, such as an odd cycle of pairwise sentences.
    pub fn verify_satisfiable(&self) -> Result<()> {
        if sat::is_satisfiable(&self.constraints)? {
            Ok(())
        } else {
            Err(self.contradiction(format!(
                "{} live constraints admit no placement of mines",
                self.constraints.len()
            )))
        }
    }

    fn contradiction(&self, message: String) -> Error {
        warn!(%message, "knowledge base is inconsistent");
        Error::Contradiction(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb(height: usize, width: usize) -> KnowledgeBase {
        KnowledgeBase::new(Bounds::new(height, width))
    }

    fn set(xs: &[(usize, usize)]) -> HashSet<Cell> {
        xs.iter().copied().map(Cell::from).collect()
    }

    #[test]
    fn test_zero_count_marks_all_neighbors_safe() {
        // Observing a zero in the center of a 3x3 field clears the whole field.
        let mut kb = kb(3, 3);
        kb.record_observation(Cell::new(1, 1), 0).unwrap();

        assert_eq!(kb.safe().len(), 9);
        assert!(kb.mine().is_empty());
        assert!(kb.constraints().is_empty());
        kb.check_invariants().unwrap();
    }

    #[test]
    fn test_full_count_marks_all_neighbors_mines() {
        // A corner with three neighbors reporting three mines.
        let mut kb = kb(3, 3);
        kb.record_observation(Cell::new(0, 0), 3).unwrap();

        assert_eq!(kb.mine(), &set(&[(0, 1), (1, 0), (1, 1)]));
        assert_eq!(kb.safe(), &set(&[(0, 0)]));
        assert!(kb.constraints().is_empty());
    }

    #[test]
    fn test_subset_inference_pins_down_the_difference() {
        // A = {c1, c2} = 1 and B = {c1, c2, c3} = 2 must yield c3 as a mine.
        let mut kb = kb(1, 5);
        let c1 = Cell::new(0, 1);
        let c2 = Cell::new(0, 2);
        let c3 = Cell::new(0, 3);
        kb.constraints.push(Constraint::new([c1, c2], 1).unwrap());
        kb.constraints.push(Constraint::new([c1, c2, c3], 2).unwrap());

        let summary = kb.propagate().unwrap();

        assert!(kb.mine().contains(&c3));
        assert!(!kb.safe().contains(&c1) && !kb.safe().contains(&c2));
        assert_eq!(summary.marked_mine, 1);
        assert!(summary.derived >= 1);
        assert_eq!(kb.constraints(), &[Constraint::new([c1, c2], 1).unwrap()]);
        kb.check_invariants().unwrap();
    }

    #[test]
    fn test_shrunk_constraint_yields_to_its_untouched_twin() {
        // The superset comes first. Once c3 is a mine it collapses onto the
        // subset, and the untouched subset is the one that survives.
        let mut kb = kb(1, 5);
        let c1 = Cell::new(0, 1);
        let c2 = Cell::new(0, 2);
        let c3 = Cell::new(0, 3);
        let c4 = Cell::new(0, 4);
        kb.constraints.push(Constraint::new([c1, c2, c3], 2).unwrap());
        kb.constraints.push(Constraint::new([c1, c2], 1).unwrap());
        kb.constraints.push(Constraint::new([c2, c4], 1).unwrap());

        kb.propagate().unwrap();

        assert_eq!(kb.mine(), &HashSet::from([c3]));
        assert_eq!(
            kb.constraints(),
            &[
                Constraint::new([c1, c2], 1).unwrap(),
                Constraint::new([c2, c4], 1).unwrap(),
            ]
        );
        kb.check_invariants().unwrap();
    }

    #[test]
    fn test_chained_deduction_within_one_observation() {
        let mut kb = kb(2, 3);

        // (0,0) sees {(0,1), (1,0), (1,1)} and reports one mine.
        kb.record_observation(Cell::new(0, 0), 1).unwrap();
        assert!(kb.mine().is_empty());

        // (0,2) sees {(0,1), (1,1), (1,2)} and reports none. Clearing those
        // leaves {(1,0)} = 1 behind, which resolves in the same call.
        kb.record_observation(Cell::new(0, 2), 0).unwrap();

        assert_eq!(kb.mine(), &set(&[(1, 0)]));
        assert!(kb.safe().is_superset(&set(&[(0, 1), (1, 1), (1, 2)])));
        assert!(kb.constraints().is_empty());
        kb.check_invariants().unwrap();
    }

    #[test]
    fn test_overlapping_observations_pin_down_one_cell() {
        let mut kb = kb(3, 4);

        // Clear (1,2), (1,3) and (2,2) so they drop out of later neighborhoods.
        kb.record_observation(Cell::new(2, 3), 0).unwrap();

        // {(0,1), (1,0), (1,1)} = 1
        kb.record_observation(Cell::new(0, 0), 1).unwrap();

        // Playing (0,1) shrinks the first sentence to {(1,0), (1,1)} = 1 and
        // adds {(0,2), (1,0), (1,1)} = 2. The difference is {(0,2)} = 1.
        let summary = kb.record_observation(Cell::new(0, 1), 2).unwrap();

        assert_eq!(kb.mine(), &set(&[(0, 2)]));
        assert_eq!(summary.derived, 1);
        assert_eq!(summary.marked_mine, 1);
        assert_eq!(
            kb.constraints(),
            &[Constraint::new([Cell::new(1, 0), Cell::new(1, 1)], 1).unwrap()]
        );
        kb.check_invariants().unwrap();
    }

    #[test]
    fn test_subset_rule_keeps_derived_sentences() {
        let mut kb = kb(2, 3);

        // {(0,1), (1,0), (1,1)} = 1
        kb.record_observation(Cell::new(0, 0), 1).unwrap();
        // Playing (0,1) shrinks that to {(1,0), (1,1)} = 1 and adds
        // {(0,2), (1,0), (1,1), (1,2)} = 2, so {(0,2), (1,2)} = 1 follows.
        kb.record_observation(Cell::new(0, 1), 2).unwrap();

        let expected = Constraint::new([Cell::new(0, 2), Cell::new(1, 2)], 1).unwrap();
        assert!(kb.constraints().contains(&expected));
        assert!(kb.mine().is_empty());
        kb.check_invariants().unwrap();
    }

    #[test]
    fn test_known_mines_are_subtracted_from_new_counts() {
        let mut kb = kb(3, 3);
        kb.mark_mine(Cell::new(0, 1)).unwrap();

        // (0,0) sees {(0,1), (1,0), (1,1)} with two mines; one is already known.
        kb.record_observation(Cell::new(0, 0), 2).unwrap();

        let expected = Constraint::new([Cell::new(1, 0), Cell::new(1, 1)], 1).unwrap();
        assert_eq!(kb.constraints(), &[expected]);
    }

    #[test]
    fn test_propagate_is_idempotent() {
        let mut kb = kb(4, 4);
        kb.record_observation(Cell::new(0, 0), 1).unwrap();
        kb.record_observation(Cell::new(0, 2), 1).unwrap();

        let safe = kb.safe().clone();
        let mine = kb.mine().clone();
        let constraints = kb.constraints().to_vec();

        assert!(kb.propagate().unwrap().is_noop());
        assert_eq!(kb.safe(), &safe);
        assert_eq!(kb.mine(), &mine);
        assert_eq!(kb.constraints(), constraints.as_slice());
    }

    #[test]
    fn test_rejects_replayed_cell() {
        let mut kb = kb(3, 3);
        kb.record_observation(Cell::new(1, 1), 1).unwrap();
        assert!(matches!(
            kb.record_observation(Cell::new(1, 1), 1),
            Err(Error::AlreadyObserved(_))
        ));
    }

    #[test]
    fn test_rejects_bad_input_without_mutation() {
        let mut kb = kb(3, 3);

        assert!(matches!(
            kb.record_observation(Cell::new(0, 0), 4),
            Err(Error::CountOutOfRange { neighbors: 3, .. })
        ));
        assert!(matches!(
            kb.record_observation(Cell::new(3, 0), 0),
            Err(Error::OutOfBounds { .. })
        ));
        assert!(kb.moves_made().is_empty());
        assert!(kb.safe().is_empty());
    }

    #[test]
    fn test_contradictory_observations_are_surfaced() {
        // (0,0) claims all three neighbors are mines, yet (1,1) is then
        // reported as a played, safe cell.
        let mut kb = kb(3, 3);
        kb.record_observation(Cell::new(0, 0), 3).unwrap();
        assert!(matches!(
            kb.record_observation(Cell::new(1, 1), 3),
            Err(Error::Contradiction(_))
        ));
    }

    #[test]
    fn test_count_lower_than_known_mines_is_a_contradiction() {
        let mut kb = kb(3, 3);
        kb.record_observation(Cell::new(0, 0), 3).unwrap();
        // (0,2) neighbors (0,1), (1,1) which are both known mines.
        assert!(matches!(
            kb.record_observation(Cell::new(0, 2), 1),
            Err(Error::Contradiction(_))
        ));
    }

    #[test]
    fn test_mark_mine_on_safe_cell_is_a_contradiction() {
        let mut kb = kb(2, 2);
        kb.mark_safe(Cell::new(0, 0)).unwrap();
        assert!(matches!(
            kb.mark_mine(Cell::new(0, 0)),
            Err(Error::Contradiction(_))
        ));
    }

    #[test]
    fn test_odd_cycle_needs_the_oracle() {
        // Each pair of {a, b, c} holds exactly one mine, which no placement
        // satisfies. Propagation sees nothing wrong on its own.
        let mut kb = kb(3, 3);
        let a = Cell::new(0, 1);
        let b = Cell::new(1, 2);
        let c = Cell::new(1, 0);
        kb.constraints.push(Constraint::new([a, b], 1).unwrap());
        kb.constraints.push(Constraint::new([b, c], 1).unwrap());
        kb.constraints.push(Constraint::new([a, c], 1).unwrap());

        assert!(kb.propagate().unwrap().is_noop());
        kb.check_invariants().unwrap();
        assert!(matches!(
            kb.verify_satisfiable(),
            Err(Error::Contradiction(_))
        ));
    }

    #[test]
    fn test_monotonic_growth() {
        let mut kb = kb(5, 5);
        let observations = [((0, 0), 1), ((4, 4), 0), ((2, 2), 2), ((0, 4), 1)];

        let mut prev = (HashSet::new(), HashSet::new(), HashSet::new());
        for ((row, col), count) in observations {
            kb.record_observation(Cell::new(row, col), count).unwrap();
            assert!(kb.moves_made().is_superset(&prev.0));
            assert!(kb.safe().is_superset(&prev.1));
            assert!(kb.mine().is_superset(&prev.2));
            kb.check_invariants().unwrap();
            kb.verify_satisfiable().unwrap();
            prev = (kb.moves_made().clone(), kb.safe().clone(), kb.mine().clone());
        }
    }
}
