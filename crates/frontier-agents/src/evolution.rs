//! Monster-role evolution.
//!
//! A monster-role actor's stage is the highest index whose kill threshold or
//! eat threshold it has reached. Stages never decrease. Each stage applies a
//! percentage multiplier to the actor's base attack and base max health; a
//! stage-up fully heals.
//!
//! Eating a corpse adds a share of the eaten actor's max health and attack to
//! the eater's base stats before the multiplier is applied.

use frontier_types::Actor;

use crate::config::EvolutionRules;
use crate::error::AgentError;

/// Highest stage reached for the given counters.
pub fn stage_for(kills: u32, eats: u32, rules: &EvolutionRules) -> u8 {
    let mut stage: u8 = 0;
    for (next, (kill_t, eat_t)) in (1_u8..).zip(
        rules
            .kill_thresholds
            .iter()
            .zip(rules.eat_thresholds.iter()),
    ) {
        if kills >= *kill_t || eats >= *eat_t {
            stage = next;
        }
    }
    stage
}

/// Percent multiplier for a stage. Stages past the table use the last entry.
pub fn multiplier_pct(stage: u8, rules: &EvolutionRules) -> u32 {
    rules
        .multipliers_pct
        .get(usize::from(stage))
        .or_else(|| rules.multipliers_pct.last())
        .copied()
        .unwrap_or(100)
}

/// `value * pct / 100` with checked arithmetic.
fn scale(value: u32, pct: u32) -> Result<u32, AgentError> {
    value
        .checked_mul(pct)
        .and_then(|v| v.checked_div(100))
        .ok_or_else(|| AgentError::overflow("stat scaling overflow"))
}

/// Re-derive `attack` and `max_health` from the base stats and the current
/// stage. Health is capped at the new maximum.
pub fn recompute_stats(actor: &mut Actor, rules: &EvolutionRules) -> Result<(), AgentError> {
    let pct = multiplier_pct(actor.evolution_stage, rules);
    actor.stats.attack = scale(actor.stats.base_attack, pct)?;
    actor.stats.max_health = scale(actor.stats.base_max_health, pct)?;
    actor.stats.health = actor.stats.health.min(actor.stats.max_health);
    Ok(())
}

/// Re-evaluate a monster-role actor's stage.
///
/// Returns the new stage if it increased. Other roles never evolve.
pub fn evaluate(actor: &mut Actor, rules: &EvolutionRules) -> Result<Option<u8>, AgentError> {
    if !actor.role.is_monster() {
        return Ok(None);
    }
    let reached = stage_for(actor.kills, actor.eats, rules);
    if reached <= actor.evolution_stage {
        return Ok(None);
    }
    actor.evolution_stage = reached;
    recompute_stats(actor, rules)?;
    actor.stats.health = actor.stats.max_health;
    Ok(Some(reached))
}

/// Apply the gains from eating a corpse with the given stats.
///
/// Adds the configured share of `eaten_max_health` and `eaten_attack` to the
/// eater's base stats, heals by the health gain, counts the eat and
/// re-derives stats. Evolution is not evaluated here.
pub fn apply_eat(
    eater: &mut Actor,
    eaten_max_health: u32,
    eaten_attack: u32,
    rules: &EvolutionRules,
) -> Result<(), AgentError> {
    let health_gain = scale(eaten_max_health, rules.eat_gain_pct)?;
    let attack_gain = scale(eaten_attack, rules.eat_gain_pct)?;
    eater.stats.base_max_health = eater
        .stats
        .base_max_health
        .checked_add(health_gain)
        .ok_or_else(|| AgentError::overflow("base max health overflow"))?;
    eater.stats.base_attack = eater
        .stats
        .base_attack
        .checked_add(attack_gain)
        .ok_or_else(|| AgentError::overflow("base attack overflow"))?;
    eater.eats = eater
        .eats
        .checked_add(1)
        .ok_or_else(|| AgentError::overflow("eat counter overflow"))?;
    recompute_stats(eater, rules)?;
    eater.stats.health = eater
        .stats
        .health
        .saturating_add(health_gain)
        .min(eater.stats.max_health);
    Ok(())
}
