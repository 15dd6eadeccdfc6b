//! This file contains the repeated auction driver.
//!
//! Every round the click model decides how many clicks each slot receives, every agent submits a bid
//! (round 0 uses the initial bid, later rounds react to the recorded history), the configured mechanism
//! resolves the auction and the round is appended to the history. Statistics are derived from the
//! history once all rounds have been played.

use std::f64::consts::PI;
use crate::agents::Agents;
use crate::error::{AuctionError, AuctionResult};
use crate::history::{History, Round};
use crate::logger::{Logger, LogEvent};
use crate::{logln, warnln};
use crate::mechanism::{validate_reserve, MechanismTrait, MechanismType, TieBreak};
use crate::types::{AgentId, AuctionOutcome, Bid};

/// Number of clicks per slot as a function of the round
///
/// The top slot receives `base + amplitude * cos(2 * pi * t / period)` clicks (rounded), so demand
/// goes up and down over the run. Every lower slot receives `decay` times the slot above it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickModel {
    pub base: f64,
    pub amplitude: f64,
    pub period: f64,
    pub decay: f64,
}

impl Default for ClickModel {
    fn default() -> Self {
        Self { base: 50.0, amplitude: 30.0, period: 48.0, decay: 0.75 }
    }
}

impl ClickModel {
    pub fn top_clicks(&self, t: usize) -> f64 {
        (self.base + self.amplitude * (2.0 * PI * t as f64 / self.period).cos()).round()
    }

    fn clicks_for_top(&self, top: f64, num_slots: usize) -> Vec<f64> {
        (0..num_slots).map(|j| (top * self.decay.powi(j as i32)).round()).collect()
    }

    /// Click vector of round `t`, best slot first
    pub fn clicks(&self, t: usize, num_slots: usize) -> Vec<f64> {
        self.clicks_for_top(self.top_clicks(t), num_slots)
    }
}

/// Configuration of a simulation run
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub num_rounds: usize,
    pub num_slots: usize,
    pub reserve: f64,
    pub click_model: ClickModel,
    pub mechanism: MechanismType,
    pub tie_break: TieBreak,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_rounds: 48,
            num_slots: 4,
            reserve: 0.0,
            click_model: ClickModel::default(),
            mechanism: MechanismType::GSP,
            tie_break: TieBreak::LowestId,
        }
    }
}

impl SimulationConfig {
    /// Check that every round will produce a click vector the bidders can work with
    pub fn validate(&self) -> AuctionResult<()> {
        validate_reserve(self.reserve)?;
        if self.num_rounds == 0 {
            return Err(AuctionError::PreconditionViolation("simulation needs at least one round".to_string()));
        }
        if self.num_slots < 2 {
            return Err(AuctionError::PreconditionViolation(format!(
                "position effects need at least 2 slots, got {}",
                self.num_slots
            )));
        }
        let model = &self.click_model;
        if !(model.decay > 0.0 && model.decay < 1.0) || model.period <= 0.0 || model.amplitude < 0.0 {
            return Err(AuctionError::PreconditionViolation(format!("invalid click model {:?}", model)));
        }
        // The quietest round must still separate the top slot from the bottom slot
        let quietest = model.clicks_for_top((model.base - model.amplitude).round(), self.num_slots);
        if quietest[quietest.len() - 1] >= quietest[0] {
            return Err(AuctionError::ArithmeticDegeneracy(format!(
                "click model gives flat click vectors in its quietest round: {:?}",
                quietest
            )));
        }
        Ok(())
    }
}

/// Statistics for a single agent over the whole run
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStat {
    pub agent_id: AgentId,
    pub value: f64,
    pub budget: Option<f64>,
    pub rounds_won: usize,
    pub clicks: f64,
    pub spent: f64,
    /// value * clicks
    pub value_obtained: f64,
    /// value_obtained - spent
    pub utility: f64,
}

impl AgentStat {
    pub fn over_budget(&self) -> bool {
        self.budget.map_or(false, |budget| self.spent > budget)
    }
}

/// Overall statistics for the simulation
#[derive(Debug, Clone, PartialEq)]
pub struct OverallStat {
    pub revenue: f64,
    pub clicks_sold: f64,
    /// Slot-rounds nobody occupied
    pub unfilled_slots: usize,
}

/// Complete simulation statistics
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationStat {
    pub agent_stats: Vec<AgentStat>,
    pub overall_stat: OverallStat,
}

impl SimulationStat {
    pub fn from_history(history: &History, agents: &Agents) -> Self {
        let mut agent_stats: Vec<AgentStat> = agents
            .agents
            .iter()
            .map(|agent| AgentStat {
                agent_id: agent.id(),
                value: agent.value(),
                budget: agent.budget(),
                rounds_won: 0,
                clicks: 0.0,
                spent: 0.0,
                value_obtained: 0.0,
                utility: 0.0,
            })
            .collect();
        let mut overall_stat = OverallStat { revenue: 0.0, clicks_sold: 0.0, unfilled_slots: 0 };

        for round in history.rounds() {
            overall_stat.unfilled_slots += round.clicks.len() - round.outcome.allocation.len();
            for (slot, agent_id) in round.outcome.allocation.iter().enumerate() {
                let clicks = round.clicks[slot];
                let payment = round.outcome.total_payment(slot, &round.clicks);
                if let Some(stat) = agent_stats.iter_mut().find(|s| s.agent_id == *agent_id) {
                    stat.rounds_won += 1;
                    stat.clicks += clicks;
                    stat.spent += payment;
                }
                overall_stat.revenue += payment;
                overall_stat.clicks_sold += clicks;
            }
        }

        for stat in &mut agent_stats {
            stat.value_obtained = stat.value * stat.clicks;
            stat.utility = stat.value_obtained - stat.spent;
        }

        Self { agent_stats, overall_stat }
    }

    pub fn printout(&self, logger: &mut Logger) {
        for stat in &self.agent_stats {
            logln!(
                logger,
                LogEvent::Simulation,
                "{}: value {:.2}, won {} rounds, {:.0} clicks, spent {:.2}, utility {:.2}",
                stat.agent_id,
                stat.value,
                stat.rounds_won,
                stat.clicks,
                stat.spent,
                stat.utility
            );
            if stat.over_budget() {
                warnln!(logger, LogEvent::Simulation, "{} spent {:.2} over a budget of {:.2}", stat.agent_id, stat.spent, stat.budget.unwrap_or(0.0));
            }
        }
        logln!(
            logger,
            LogEvent::Simulation,
            "Revenue: {:.2}, clicks sold: {:.0}, unfilled slot-rounds: {}",
            self.overall_stat.revenue,
            self.overall_stat.clicks_sold,
            self.overall_stat.unfilled_slots
        );
    }
}

/// History and statistics of a finished run
pub struct SimulationRun {
    pub history: History,
    pub stat: SimulationStat,
}

/// Repeated auction between a fixed set of agents
pub struct Simulation {
    pub config: SimulationConfig,
    pub agents: Agents,
    mechanism: Box<dyn MechanismTrait>,
}

impl Simulation {
    pub fn new(config: SimulationConfig, agents: Agents) -> AuctionResult<Self> {
        config.validate()?;
        if agents.is_empty() {
            return Err(AuctionError::PreconditionViolation("simulation needs at least one agent".to_string()));
        }
        let mechanism = config.mechanism.build(config.tie_break);
        Ok(Self { config, agents, mechanism })
    }

    /// Print initialization information about the simulation
    pub fn printout(&self, logger: &mut Logger) {
        logln!(
            logger,
            LogEvent::Simulation,
            "Initialized {} agents, {} slots, {} rounds, {} mechanism, reserve {:.2}",
            self.agents.len(),
            self.config.num_slots,
            self.config.num_rounds,
            self.mechanism.name(),
            self.config.reserve
        );
        for agent in &self.agents.agents {
            logln!(logger, LogEvent::Simulation, "  {} {}: value {:.2}", agent.get_bidding_type(), agent.id(), agent.value());
        }
    }

    /// Collect the bids of all agents for round `t`
    fn collect_bids(&self, t: usize, history: &History) -> AuctionResult<Vec<Bid>> {
        let reserve = self.config.reserve;
        self.agents
            .agents
            .iter()
            .map(|agent| {
                let amount = if t == 0 { agent.initial_bid(reserve) } else { agent.bid(t, history, reserve)? };
                Ok(Bid::new(agent.id(), amount))
            })
            .collect()
    }

    /// Play all rounds and return the history together with the statistics
    pub fn run(&self, logger: &mut Logger) -> AuctionResult<SimulationRun> {
        let mut history = History::new();

        for t in 0..self.config.num_rounds {
            let clicks = self.config.click_model.clicks(t, self.config.num_slots);
            let bids = self.collect_bids(t, &history)?;
            let outcome = self.mechanism.compute(&clicks, self.config.reserve, &bids)?;

            log_auction(logger, t, &bids, &outcome);
            logln!(logger, LogEvent::Round, "Round {}: clicks {:?}, revenue {:.2}", t, clicks, outcome.revenue(&clicks));

            history.push(Round::new(clicks, bids, self.config.reserve, outcome));
        }

        let stat = SimulationStat::from_history(&history, &self.agents);
        Ok(SimulationRun { history, stat })
    }
}

fn log_auction(logger: &mut Logger, t: usize, bids: &[Bid], outcome: &AuctionOutcome) {
    let bids_str: Vec<String> = bids.iter().map(|b| format!("{}: {:.4}", b.agent_id, b.amount)).collect();
    logln!(logger, LogEvent::Auction, "Round {} bids: [{}]", t, bids_str.join(", "));
    if outcome.is_empty() {
        logln!(logger, LogEvent::Auction, "  no bid met the reserve, all slots unfilled");
        return;
    }
    for (slot, (agent_id, price)) in outcome.allocation.iter().zip(&outcome.per_click_payments).enumerate() {
        logln!(logger, LogEvent::Auction, "  slot {}: {} pays {:.4} per click", slot, agent_id, price);
    }
}

/// Resolve every recorded round again under a different mechanism, keeping the submitted bids
pub fn reprice(history: &History, mechanism: &dyn MechanismTrait) -> AuctionResult<Vec<AuctionOutcome>> {
    history
        .rounds()
        .iter()
        .map(|round| mechanism.compute(&round.clicks, round.reserve, &round.bids))
        .collect()
}
