use num_bigint::BigUint;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use crate::{
    constants::{BASIS_POINTS_DENOMINATOR, FEE_BASIS_POINTS, PRICE_PRECISION},
    error::{HookAmmError, HookAmmResult},
    math::{checked_add_u128, checked_sub, mul_div, mul_div_u128, to_u64},
    reserves::ReserveState,
};

/// What the trader asks for. Only the input side is ever specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeIntent {
    Buy { sol_amount_in: u64 },
    Sell { token_amount_in: u64 },
}

impl TradeIntent {
    pub fn amount_in(&self) -> u64 {
        match self {
            TradeIntent::Buy { sol_amount_in } => *sol_amount_in,
            TradeIntent::Sell { token_amount_in } => *token_amount_in,
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, TradeIntent::Buy { .. })
    }
}

/// Which way the token price moves as a result of the trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceDirection {
    Up,
    Down,
}

/// Deviation between the pre-trade spot price and the realized price.
///
/// Always against the trader, so only the magnitude and direction are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceImpact {
    pub bps: u64,
    pub direction: PriceDirection,
}

impl PriceImpact {
    /// Impact on the token price in signed basis points.
    pub fn signed_bps(&self) -> i64 {
        let magnitude = i64::try_from(self.bps).unwrap_or(i64::MAX);
        match self.direction {
            PriceDirection::Up => magnitude,
            PriceDirection::Down => -magnitude,
        }
    }
}

/// Result of pricing one [`TradeIntent`] against one [`ReserveState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub intent: TradeIntent,
    /// Tokens received for a buy, lamports received for a sell.
    pub amount_out: u64,
    /// Lamports taken by the protocol.
    pub fee: u64,
    /// Lamports per token base unit over the curve leg, scaled by `PRICE_PRECISION`.
    pub price_per_token: u128,
    pub price_impact: PriceImpact,
}

impl Quote {
    pub fn amount_in(&self) -> u64 {
        self.intent.amount_in()
    }

    /// `floor(amount_out * (10_000 - slippage_bps) / 10_000)`
    pub fn minimum_amount_out(&self, slippage_bps: u16) -> HookAmmResult<u64> {
        let remaining = BASIS_POINTS_DENOMINATOR
            .checked_sub(u64::from(slippage_bps))
            .ok_or(HookAmmError::InvalidSlippage(slippage_bps))?;
        mul_div(self.amount_out, remaining, BASIS_POINTS_DENOMINATOR)
    }

    /// `price_per_token` as SOL per token base unit.
    pub fn price_per_token_decimal(&self) -> Decimal {
        // at most u64::MAX * 1e9, well inside the 96-bit mantissa
        Decimal::from_i128_with_scale(self.price_per_token as i128, 9)
    }
}

/// Prices trades against a bonding curve exactly the way the program settles them.
///
/// The fee is always taken on the SOL side: from the input before the swap
/// on buys, from the output after the swap on sells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteEngine {
    fee_basis_points: u16,
}

impl Default for QuoteEngine {
    fn default() -> Self {
        Self::new(FEE_BASIS_POINTS)
    }
}

impl QuoteEngine {
    pub fn new(fee_basis_points: u16) -> Self {
        Self { fee_basis_points }
    }

    pub fn fee_basis_points(&self) -> u16 {
        self.fee_basis_points
    }

    pub fn quote(&self, reserves: &ReserveState, intent: TradeIntent) -> HookAmmResult<Quote> {
        match intent {
            TradeIntent::Buy { sol_amount_in } => self.quote_buy(reserves, sol_amount_in),
            TradeIntent::Sell { token_amount_in } => self.quote_sell(reserves, token_amount_in),
        }
    }

    pub fn quote_buy(&self, reserves: &ReserveState, sol_amount_in: u64) -> HookAmmResult<Quote> {
        if reserves.complete {
            return Err(HookAmmError::CurveComplete);
        }
        if sol_amount_in == 0 {
            return Err(HookAmmError::InvalidAmount);
        }

        let fee = self.fee_on(sol_amount_in)?;
        let sol_after_fee = checked_sub(sol_amount_in, fee)?;

        let sol_reserves = reserves.effective_sol_reserves()?;
        let token_reserves = reserves.effective_token_reserves()?;
        let k = reserves.invariant()?;

        let new_sol_reserves = checked_add_u128(u128::from(sol_reserves), u128::from(sol_after_fee))?;
        let new_token_reserves = mul_div_u128(k, 1, new_sol_reserves)?;

        let tokens_out = u128::from(token_reserves)
            .checked_sub(new_token_reserves)
            .ok_or(HookAmmError::InsufficientReserves)?;
        let tokens_out = to_u64(tokens_out)?;
        // the curve only holds what has not been sold yet
        let tokens_held = reserves
            .token_total_supply
            .saturating_sub(reserves.real_token_reserves);
        if tokens_out == 0 || tokens_out > tokens_held {
            return Err(HookAmmError::InsufficientReserves);
        }

        let price_per_token = mul_div_u128(
            u128::from(sol_after_fee),
            u128::from(PRICE_PRECISION),
            u128::from(tokens_out),
        )?;
        let price_impact = price_impact(
            sol_after_fee,
            tokens_out,
            sol_reserves,
            token_reserves,
            PriceDirection::Up,
        )?;

        log::debug!(
            "buy quote: {} lamports in, {} tokens out, fee {}, impact {} bps",
            sol_amount_in,
            tokens_out,
            fee,
            price_impact.bps
        );

        Ok(Quote {
            intent: TradeIntent::Buy { sol_amount_in },
            amount_out: tokens_out,
            fee,
            price_per_token,
            price_impact,
        })
    }

    pub fn quote_sell(&self, reserves: &ReserveState, token_amount_in: u64) -> HookAmmResult<Quote> {
        if reserves.complete {
            return Err(HookAmmError::CurveComplete);
        }
        if token_amount_in == 0 {
            return Err(HookAmmError::InvalidAmount);
        }

        let sol_reserves = reserves.effective_sol_reserves()?;
        let token_reserves = reserves.effective_token_reserves()?;
        let k = reserves.invariant()?;

        let new_token_reserves =
            checked_add_u128(u128::from(token_reserves), u128::from(token_amount_in))?;
        let new_sol_reserves = mul_div_u128(k, 1, new_token_reserves)?;

        let sol_out_before_fee = u128::from(sol_reserves)
            .checked_sub(new_sol_reserves)
            .ok_or(HookAmmError::InsufficientReserves)?;
        let sol_out_before_fee = to_u64(sol_out_before_fee)?;
        if sol_out_before_fee == 0 {
            return Err(HookAmmError::InsufficientReserves);
        }
        // settlement debits both real reserves; virtual liquidity cannot pay out
        if sol_out_before_fee > reserves.real_sol_reserves
            || token_amount_in > reserves.real_token_reserves
        {
            return Err(HookAmmError::InsufficientReserves);
        }

        let fee = self.fee_on(sol_out_before_fee)?;
        let sol_out = checked_sub(sol_out_before_fee, fee)?;

        let price_per_token = mul_div_u128(
            u128::from(sol_out_before_fee),
            u128::from(PRICE_PRECISION),
            u128::from(token_amount_in),
        )?;
        let price_impact = price_impact(
            token_amount_in,
            sol_out_before_fee,
            token_reserves,
            sol_reserves,
            PriceDirection::Down,
        )?;

        log::debug!(
            "sell quote: {} tokens in, {} lamports out, fee {}, impact {} bps",
            token_amount_in,
            sol_out,
            fee,
            price_impact.bps
        );

        Ok(Quote {
            intent: TradeIntent::Sell { token_amount_in },
            amount_out: sol_out,
            fee,
            price_per_token,
            price_impact,
        })
    }

    fn fee_on(&self, sol_amount: u64) -> HookAmmResult<u64> {
        mul_div(
            sol_amount,
            u64::from(self.fee_basis_points),
            BASIS_POINTS_DENOMINATOR,
        )
    }
}

/// `(spot - effective) / spot * 10_000`, with prices taken as output per input.
///
/// `spot = out_reserves / in_reserves`, `effective = amount_out / amount_in`.
/// Cross-multiplied so the whole ratio stays exact.
fn price_impact(
    amount_in: u64,
    amount_out: u64,
    in_reserves: u64,
    out_reserves: u64,
    direction: PriceDirection,
) -> HookAmmResult<PriceImpact> {
    let spot = BigUint::from(amount_in) * BigUint::from(out_reserves);
    let effective = BigUint::from(amount_out) * BigUint::from(in_reserves);

    let bps = if effective >= spot {
        0
    } else {
        ((&spot - &effective) * BigUint::from(BASIS_POINTS_DENOMINATOR) / &spot)
            .to_u64()
            .ok_or(HookAmmError::ArithmeticFault("price impact"))?
    };

    Ok(PriceImpact { bps, direction })
}
