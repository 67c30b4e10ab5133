use crate::config::InvestmentConfig;
use crate::data::validate_price_series;
use crate::error::{EngineError, EngineResult};
use crate::exit::{ExitContext, ExitDecision};
use crate::models::{
    DailyValuation, InvestmentRecord, PortfolioState, PricePoint, SellRecord, SimulationResult,
    SkipReason, SkippedInvestment,
};
use crate::schedule::InvestmentSchedule;
use chrono::NaiveDate;
use log::debug;

const CASH_EPSILON: f64 = 1e-9;
const FULL_EXIT_EPSILON: f64 = 1e-9;

enum BuyOutcome {
    Executed(InvestmentRecord),
    Skipped(SkipReason),
}

/// Runs one backtest: a single forward pass over the trading calendar
/// between the configured dates, applying scheduled buys and
/// exit-triggered sells. Pure function of its inputs; identical inputs
/// produce identical results.
///
/// Fails fast with `ConfigError`/`DataError` before the loop starts; a
/// loop that starts always completes. Each trading day executes in
/// order: exit evaluation, scheduled buy, end-of-day valuation. A
/// terminal exit suppresses the same day's buy and every later one.
pub fn simulate(
    prices: &[PricePoint],
    config: &InvestmentConfig,
) -> EngineResult<SimulationResult> {
    config.validate()?;
    validate_price_series(prices)?;

    let window: Vec<&PricePoint> = prices
        .iter()
        .filter(|p| p.date >= config.start_date && p.date <= config.end_date)
        .collect();
    if window.is_empty() {
        return Err(EngineError::Data(format!(
            "no trading days between {} and {}",
            config.start_date, config.end_date
        )));
    }

    let trading_days: Vec<NaiveDate> = window.iter().map(|p| p.date).collect();
    let schedule = InvestmentSchedule::build(config, &trading_days);
    let first_trading_day = trading_days[0];

    let mut exit_strategy = crate::exit::create_exit_strategy(&config.exit_strategy);
    let mut state = PortfolioState::new(config.initial_cash);
    let mut investments: Vec<InvestmentRecord> = Vec::new();
    let mut sells: Vec<SellRecord> = Vec::new();
    let mut skips: Vec<SkippedInvestment> = schedule.unresolved_skips();
    let mut daily_valuations: Vec<DailyValuation> = Vec::with_capacity(window.len());

    for point in &window {
        if state.shares_held > 0 && !exit_strategy.is_terminal() {
            let decision = {
                let ctx = ExitContext {
                    date: point.date,
                    close: point.close,
                    state: &state,
                    start_date: first_trading_day,
                };
                exit_strategy.evaluate(&ctx)
            };
            if let Some(decision) = decision {
                if let Some(record) = execute_sell(&mut state, config, &decision, point) {
                    debug!(
                        "{} sold {} x {:.4} on {} at {:+.2}%",
                        record.reason,
                        record.shares_sold,
                        record.price,
                        record.date,
                        record.return_pct
                    );
                    sells.push(record);
                }
            }
        }

        if let Some(round) = schedule.round_on(point.date) {
            if !exit_strategy.is_terminal() {
                match execute_buy(&mut state, config, round.round, point) {
                    BuyOutcome::Executed(record) => {
                        debug!(
                            "round {} bought {} x {:.4} on {}",
                            record.round, record.shares, record.price, record.date
                        );
                        investments.push(record);
                    }
                    BuyOutcome::Skipped(reason) => {
                        debug!(
                            "round {} skipped on {} ({})",
                            round.round,
                            point.date,
                            reason.as_str()
                        );
                        skips.push(SkippedInvestment {
                            date: point.date,
                            round: round.round,
                            reason,
                        });
                    }
                }
            }
        }

        daily_valuations.push(DailyValuation {
            date: point.date,
            close: point.close,
            portfolio_value: state.cash + state.position_value(point.close),
            cash: state.cash,
            shares_held: state.shares_held,
        });
    }

    skips.sort_by_key(|s| (s.date, s.round));

    Ok(SimulationResult {
        investments,
        sells,
        skips,
        daily_valuations,
        final_state: state,
    })
}

/// Buys floor(amount / price) whole shares. A floor of zero or a cash
/// shortfall records a skip instead of failing the run.
fn execute_buy(
    state: &mut PortfolioState,
    config: &InvestmentConfig,
    round: u32,
    point: &PricePoint,
) -> BuyOutcome {
    let shares = (config.investment_amount / point.close).floor() as i64;
    if shares <= 0 {
        return BuyOutcome::Skipped(SkipReason::PriceAboveBudget);
    }

    let amount = shares as f64 * point.close;
    let fees = config.costs.buy_fees(amount);
    if amount + fees > state.cash + CASH_EPSILON {
        return BuyOutcome::Skipped(SkipReason::InsufficientCash);
    }

    state.cash -= amount + fees;
    state.shares_held += shares;
    state.total_shares_ever_bought += shares;
    state.total_invested += amount;
    state.rounds_executed += 1;

    BuyOutcome::Executed(InvestmentRecord {
        date: point.date,
        round,
        price: point.close,
        shares,
        amount,
        target_amount: config.investment_amount,
        fees,
        market_value: state.cash + state.position_value(point.close),
    })
}

/// Sells the decided fraction of the held position, whole shares,
/// rounding down; a full exit always clears the position exactly.
fn execute_sell(
    state: &mut PortfolioState,
    config: &InvestmentConfig,
    decision: &ExitDecision,
    point: &PricePoint,
) -> Option<SellRecord> {
    let ratio = decision.ratio.clamp(0.0, 1.0);
    let shares_to_sell = if ratio >= 1.0 - FULL_EXIT_EPSILON {
        state.shares_held
    } else {
        (state.shares_held as f64 * ratio).floor() as i64
    };
    if shares_to_sell <= 0 {
        return None;
    }

    let return_pct = state.unrealized_return_pct(point.close).unwrap_or(0.0);
    let amount = shares_to_sell as f64 * point.close;
    let fees = config.costs.sell_fees(amount);

    state.cash += amount - fees;
    state.shares_held -= shares_to_sell;

    Some(SellRecord {
        date: point.date,
        price: point.close,
        shares_sold: shares_to_sell,
        amount,
        commission: fees,
        reason: decision.reason.clone(),
        return_pct,
    })
}
