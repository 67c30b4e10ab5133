use crate::config::InvestmentConfig;
use crate::error::EngineResult;
use crate::models::{
    BenchmarkComparison, DailyValuation, PerformanceMetrics, PricePoint, PriceRangeSummary,
    SimulationResult,
};
use statrs::statistics::Statistics;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Derives the full metric set from one simulation run. Pure
    /// function of its inputs; degenerate inputs (no valuations, zero
    /// stdev, empty position) produce 0.0 sentinels, never errors.
    pub fn compute(result: &SimulationResult, config: &InvestmentConfig) -> PerformanceMetrics {
        let initial_cash = config.initial_cash;
        let final_value = result.final_value();
        let total_return = if initial_cash > 0.0 {
            (final_value - initial_cash) / initial_cash * 100.0
        } else {
            0.0
        };

        let total_days = match (
            result.daily_valuations.first(),
            result.daily_valuations.last(),
        ) {
            (Some(first), Some(last)) => (last.date - first.date).num_days(),
            _ => 0,
        };
        let annualized_return = Self::annualized_return(initial_cash, final_value, total_days);

        let daily_returns = Self::daily_returns(&result.daily_valuations);
        let volatility = Self::volatility(&daily_returns);
        let sharpe_ratio = Self::sharpe_ratio(&daily_returns, config.risk_free_rate);
        let (max_drawdown, max_drawdown_duration) =
            Self::max_drawdown(&result.daily_valuations);

        let state = &result.final_state;
        let final_position_value = result
            .daily_valuations
            .last()
            .map(|v| state.position_value(v.close))
            .unwrap_or(0.0);
        let average_cost = if state.shares_held > 0 {
            state.total_invested / state.shares_held as f64
        } else {
            0.0
        };

        let investment_prices: Vec<f64> = result.investments.iter().map(|r| r.price).collect();
        let price_range = Self::price_range(&investment_prices);
        let cost_reduction_effect = if average_cost > 0.0 && price_range.mean_price > 0.0 {
            (price_range.mean_price - average_cost) / price_range.mean_price * 100.0
        } else {
            0.0
        };

        let executed_investments = result.investments.len() as u32;
        let scheduled_investments = executed_investments + result.skips.len() as u32;
        let investment_efficiency = if scheduled_investments > 0 {
            executed_investments as f64 / scheduled_investments as f64 * 100.0
        } else {
            0.0
        };

        PerformanceMetrics {
            total_return,
            annualized_return,
            volatility,
            sharpe_ratio,
            max_drawdown,
            max_drawdown_duration,
            final_value,
            final_cash: state.cash,
            final_position_value,
            total_invested: state.total_invested,
            average_cost,
            cost_reduction_effect,
            investment_efficiency,
            executed_investments,
            scheduled_investments,
            price_range,
        }
    }

    /// Re-runs the identical request under pure hold and compares total
    /// returns. A request that already holds skips the second run and
    /// reports a difference of exactly zero.
    pub fn compare_with_benchmark(
        prices: &[PricePoint],
        config: &InvestmentConfig,
        metrics: &PerformanceMetrics,
    ) -> EngineResult<BenchmarkComparison> {
        if config.exit_strategy.is_hold() {
            return Ok(BenchmarkComparison {
                benchmark_return: metrics.total_return,
                return_difference: 0.0,
                exit_strategy_better: false,
                is_same_strategy: true,
            });
        }

        let hold_config = config.as_hold();
        let hold_result = crate::engine::simulate(prices, &hold_config)?;
        let hold_metrics = Self::compute(&hold_result, &hold_config);
        let return_difference = metrics.total_return - hold_metrics.total_return;

        Ok(BenchmarkComparison {
            benchmark_return: hold_metrics.total_return,
            return_difference,
            exit_strategy_better: return_difference > 0.0,
            is_same_strategy: false,
        })
    }

    fn annualized_return(initial_cash: f64, final_value: f64, total_days: i64) -> f64 {
        if total_days <= 0 || initial_cash <= 0.0 {
            return 0.0;
        }
        let ratio = final_value / initial_cash;
        if ratio <= 0.0 || !ratio.is_finite() {
            return 0.0;
        }
        ratio.powf(365.0 / total_days as f64) - 1.0
    }

    fn daily_returns(valuations: &[DailyValuation]) -> Vec<f64> {
        valuations
            .windows(2)
            .map(|window| {
                let prev = window[0].portfolio_value;
                let curr = window[1].portfolio_value;
                if prev > 0.0 {
                    curr / prev - 1.0
                } else {
                    0.0
                }
            })
            .collect()
    }

    fn volatility(daily_returns: &[f64]) -> f64 {
        if daily_returns.len() < 2 {
            return 0.0;
        }
        let std_dev = daily_returns.to_vec().std_dev();
        if !std_dev.is_finite() {
            return 0.0;
        }
        std_dev * TRADING_DAYS_PER_YEAR.sqrt() * 100.0
    }

    fn sharpe_ratio(daily_returns: &[f64], risk_free_rate: f64) -> f64 {
        if daily_returns.len() < 2 {
            return 0.0;
        }
        let mean_return = daily_returns.to_vec().mean();
        let std_dev = daily_returns.to_vec().std_dev();
        if std_dev == 0.0 || !std_dev.is_finite() {
            return 0.0;
        }

        let annualized_return = mean_return * TRADING_DAYS_PER_YEAR;
        let annualized_volatility = std_dev * TRADING_DAYS_PER_YEAR.sqrt();
        (annualized_return - risk_free_rate) / annualized_volatility
    }

    /// Largest decline from a running peak (fraction of the peak) and
    /// the longest run of days spent strictly below a prior peak.
    fn max_drawdown(valuations: &[DailyValuation]) -> (f64, i32) {
        let Some(first) = valuations.first() else {
            return (0.0, 0);
        };

        let mut max_drawdown = 0.0;
        let mut max_duration = 0i32;
        let mut current_duration = 0i32;
        let mut peak = first.portfolio_value;

        for valuation in valuations {
            let value = valuation.portfolio_value;
            if value > peak {
                peak = value;
                current_duration = 0;
            } else if value < peak {
                current_duration += 1;
                if peak > 0.0 {
                    let drawdown = (peak - value) / peak;
                    if drawdown > max_drawdown {
                        max_drawdown = drawdown;
                    }
                }
                if current_duration > max_duration {
                    max_duration = current_duration;
                }
            } else {
                current_duration = 0;
            }
        }

        (max_drawdown, max_duration)
    }

    fn price_range(prices: &[f64]) -> PriceRangeSummary {
        if prices.is_empty() {
            return PriceRangeSummary {
                min_price: 0.0,
                max_price: 0.0,
                mean_price: 0.0,
            };
        }

        let min_price = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let max_price = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean_price = prices.iter().sum::<f64>() / prices.len() as f64;

        PriceRangeSummary {
            min_price,
            max_price,
            mean_price,
        }
    }
}
