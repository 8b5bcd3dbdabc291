//! `CellAgent` — agents that know which cell they occupy.

use rand::Rng;

use mesa_core::CellId;

use crate::{DiscreteSpace, SpaceResult};

/// An agent that remembers its cell and moves through the space.
///
/// `A` is the handle stored in cells (usually an `AgentId`).  Implementors
/// supply the three accessors; the movement methods keep the agent's own
/// record and the cells' occupant lists in agreement.  A move either
/// completes or leaves both untouched.
pub trait CellAgent<A: Clone + PartialEq> {
    /// What the space stores for this agent.
    fn handle(&self) -> A;

    fn cell(&self) -> Option<CellId>;

    /// Record the current cell.  Called by the provided methods only.
    fn set_cell(&mut self, cell: Option<CellId>);

    /// Move to `to`, leaving the current cell if there is one.
    fn move_to(&mut self, space: &mut DiscreteSpace<A>, to: CellId) -> SpaceResult<()> {
        match self.cell() {
            Some(from) => space.move_agent(from, to, &self.handle())?,
            None => space.add_agent(to, self.handle())?,
        }
        self.set_cell(Some(to));
        Ok(())
    }

    /// Move to a uniformly random empty cell and return it.
    fn place<R: Rng + ?Sized>(&mut self, space: &mut DiscreteSpace<A>, rng: &mut R) -> SpaceResult<CellId> {
        let target = space.select_random_empty_cell(rng)?;
        self.move_to(space, target)?;
        Ok(target)
    }

    /// Leave the current cell, if any.
    fn leave(&mut self, space: &mut DiscreteSpace<A>) -> SpaceResult<()> {
        if let Some(from) = self.cell() {
            space.remove_agent(from, &self.handle())?;
            self.set_cell(None);
        }
        Ok(())
    }
}
