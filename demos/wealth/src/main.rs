//! wealth — Boltzmann wealth exchange on a Moore torus.
//!
//! Every agent starts with one coin.  On each tick an agent with money
//! moves to a random neighboring cell and hands one coin to a random
//! cellmate.  Wealth is held in an observable list; the Gini coefficient is
//! a computed signal that only re-evaluates when wealth actually changed.
//! A DEVS-style census event reports it every `REPORT_EVERY` ticks.
//!
//! Usage: `wealth [agents] [width] [height] [ticks] [seed]`

use std::rc::Rc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use mesa_cell_space::{CellAgent, Grid, GridConfig};
use mesa_core::{AgentId, CellId, SimRng};
use mesa_schedule::Priority;
use mesa_signals::{Computed, Handler, Message, ObservableList, SignalHub, SignalType, Signals};
use mesa_sim::{AbmSimulator, Model, Scheduler, SimResult, handler};

// ── Defaults ──────────────────────────────────────────────────────────────────

const DEFAULT_AGENTS: usize = 100;
const DEFAULT_WIDTH:  usize = 10;
const DEFAULT_HEIGHT: usize = 10;
const DEFAULT_TICKS:  u64   = 100;
const DEFAULT_SEED:   u64   = 42;
const REPORT_EVERY:   u64   = 10;

struct Params {
    agents: usize,
    width:  usize,
    height: usize,
    ticks:  u64,
    seed:   u64,
}

impl Params {
    fn from_args() -> Result<Self> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let arg = |i: usize, default: u64| -> Result<u64> {
            match args.get(i) {
                Some(raw) => raw.parse().with_context(|| format!("argument {} ({raw:?}) is not a number", i + 1)),
                None => Ok(default),
            }
        };
        let params = Params {
            agents: arg(0, DEFAULT_AGENTS as u64)? as usize,
            width:  arg(1, DEFAULT_WIDTH as u64)? as usize,
            height: arg(2, DEFAULT_HEIGHT as u64)? as usize,
            ticks:  arg(3, DEFAULT_TICKS)?,
            seed:   arg(4, DEFAULT_SEED)?,
        };
        if params.agents == 0 {
            bail!("need at least one agent");
        }
        Ok(params)
    }
}

// ── Agents ────────────────────────────────────────────────────────────────────

struct Trader {
    id:   AgentId,
    cell: Option<CellId>,
}

impl CellAgent<AgentId> for Trader {
    fn handle(&self) -> AgentId {
        self.id
    }

    fn cell(&self) -> Option<CellId> {
        self.cell
    }

    fn set_cell(&mut self, cell: Option<CellId>) {
        self.cell = cell;
    }
}

// ── Model ─────────────────────────────────────────────────────────────────────

struct WealthModel {
    grid:    Grid<AgentId>,
    traders: Vec<Trader>,
    rng:     SimRng,
    hub:     SignalHub,
    wealth:  ObservableList<u32>,
    gini:    Computed<f64>,
}

impl WealthModel {
    fn new(params: &Params, signals: &Signals) -> Result<Self> {
        let config = GridConfig::new([params.width, params.height]).torus(true);
        let mut grid: Grid<AgentId> = Grid::orthogonal_moore(&config)?;
        let mut rng = SimRng::new(params.seed);

        let mut traders = Vec::with_capacity(params.agents);
        for i in 0..params.agents {
            let id = AgentId::try_from(i).context("too many agents")?;
            let mut trader = Trader { id, cell: None };
            let cell = grid.all_cells().select_random_cell(&mut rng)?.id();
            trader.move_to(&mut grid, cell)?;
            traders.push(trader);
        }

        let hub = signals.hub("wealth_model");
        let wealth = hub.observable_list("wealth", vec![1u32; params.agents])?;
        let source = wealth.clone();
        let gini = hub.computed("gini", move || Ok(source.with(gini_coefficient)))?;

        Ok(Self { grid, traders, rng, hub, wealth, gini })
    }

    /// Move one trader to a random neighbor cell, then give a coin to a
    /// random cellmate.
    fn act(&mut self, index: usize) -> SimResult<()> {
        let trader = &mut self.traders[index];
        let Some(here) = trader.cell else { return Ok(()) };

        let target = {
            let neighbors = self.grid.neighborhood(here, 1, false)?;
            // A 1×1 torus wraps every offset back onto the cell itself.
            if neighbors.is_empty() {
                here
            } else {
                neighbors.select_random_cell(&mut self.rng)?.id()
            }
        };
        trader.move_to(&mut self.grid, target)?;

        let coins = self.wealth.with(|w| w[index]);
        if coins == 0 {
            return Ok(());
        }
        let me = trader.id;
        let others: Vec<AgentId> =
            self.grid.cell(target)?.agents().iter().copied().filter(|&a| a != me).collect();
        let Some(&other) = self.rng.choose(&others) else { return Ok(()) };

        let before = self.wealth.with(|w| w[other.index()]);
        self.wealth.replace(index, coins - 1)?;
        self.wealth.replace(other.index(), before + 1)?;
        Ok(())
    }
}

impl Model for WealthModel {
    fn step(&mut self, _scheduler: &mut Scheduler<Self>) -> SimResult<()> {
        let mut order: Vec<usize> = (0..self.traders.len()).collect();
        self.rng.shuffle(&mut order);
        for index in order {
            self.act(index)?;
        }
        Ok(())
    }
}

/// Gini coefficient of `values`, 0 for perfect equality.
fn gini_coefficient(values: &[u32]) -> f64 {
    let total: u64 = values.iter().map(|&v| v as u64).sum();
    if values.is_empty() || total == 0 {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let n = sorted.len() as f64;
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, &v)| (i as f64 + 1.0) * v as f64)
        .sum();
    (2.0 * weighted) / (n * total as f64) - (n + 1.0) / n
}

// ── Census ────────────────────────────────────────────────────────────────────

/// Log the Gini coefficient, then schedule the next census.
fn census(model: &mut WealthModel, scheduler: &mut Scheduler<WealthModel>) -> SimResult<()> {
    let gini = model.gini.get()?;
    let richest = model.wealth.with(|w| w.iter().copied().max().unwrap_or(0));
    info!(time = %scheduler.time(), gini = format_args!("{gini:.3}"), richest, "census");
    // Low priority: runs after the model step of the same tick.
    scheduler.schedule_event_relative(handler(census), REPORT_EVERY, Priority::Low)?;
    Ok(())
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let params = Params::from_args()?;
    info!(
        agents = params.agents,
        width = params.width,
        height = params.height,
        ticks = params.ticks,
        seed = params.seed,
        "wealth model"
    );

    let signals = Signals::new();
    let model = WealthModel::new(&params, &signals)?;

    // Count wealth transfers through the list's element signals.
    let transfers = Rc::new(std::cell::Cell::new(0u64));
    let seen = Rc::clone(&transfers);
    let on_replace: Handler = Rc::new(move |message: &Message<'_>| {
        seen.set(seen.get() + 1);
        debug!(index = ?message.index, "wealth changed");
    });
    model.hub.observe("wealth", SignalType::Replace, &on_replace)?;

    let mut sim = AbmSimulator::new();
    sim.setup(model)?;
    sim.schedule_event_absolute(handler(census), REPORT_EVERY, Priority::Low)?;

    let started = Instant::now();
    sim.run_for(params.ticks)?;
    let elapsed = started.elapsed();

    let model = sim.model().context("simulator lost its model")?;
    let total: u32 = model.wealth.with(|w| w.iter().sum());
    info!(
        time = %sim.time(),
        gini = format_args!("{:.3}", model.gini.get()?),
        total,
        transfers = transfers.get() / 2,
        occupied = model.grid.len() - model.grid.empty_count(),
        elapsed_ms = elapsed.as_millis() as u64,
        "run finished"
    );
    Ok(())
}
