use crate::{
    constants::PRICE_PRECISION,
    error::{HookAmmError, HookAmmResult},
    math::{checked_add, checked_mul_u128, checked_sub, mul_div_u128, to_u64},
    quote::{Quote, TradeIntent},
};

/// Snapshot of a bonding curve's reserves as read from the ledger.
///
/// Never cached by the quote engine: re-read before every new quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReserveState {
    pub virtual_token_reserves: u64,
    pub virtual_sol_reserves: u64,
    pub real_token_reserves: u64,
    pub real_sol_reserves: u64,
    pub token_total_supply: u64,
    pub complete: bool,
}

impl ReserveState {
    /// `virtual_sol_reserves + real_sol_reserves`, strictly positive.
    pub fn effective_sol_reserves(&self) -> HookAmmResult<u64> {
        let effective = checked_add(self.virtual_sol_reserves, self.real_sol_reserves)?;
        if effective == 0 {
            return Err(self.corrupt());
        }
        Ok(effective)
    }

    /// `virtual_token_reserves - real_token_reserves`, strictly positive.
    ///
    /// A non-positive value means the snapshot is inconsistent, not that the
    /// curve is empty.
    pub fn effective_token_reserves(&self) -> HookAmmResult<u64> {
        match self
            .virtual_token_reserves
            .checked_sub(self.real_token_reserves)
        {
            Some(effective) if effective > 0 => Ok(effective),
            _ => Err(self.corrupt()),
        }
    }

    /// Constant product `k = effective_sol * effective_token`.
    pub fn invariant(&self) -> HookAmmResult<u128> {
        checked_mul_u128(
            u128::from(self.effective_sol_reserves()?),
            u128::from(self.effective_token_reserves()?),
        )
    }

    /// Spot price in lamports per token base unit, scaled by `PRICE_PRECISION`.
    pub fn spot_price(&self) -> HookAmmResult<u128> {
        mul_div_u128(
            u128::from(self.effective_sol_reserves()?),
            u128::from(PRICE_PRECISION),
            u128::from(self.effective_token_reserves()?),
        )
    }

    /// Market cap in lamports at the current spot price.
    pub fn market_cap(&self) -> HookAmmResult<u64> {
        to_u64(mul_div_u128(
            self.spot_price()?,
            u128::from(self.token_total_supply),
            u128::from(PRICE_PRECISION),
        )?)
    }

    /// The reserves the ledger will hold once `quote` settles.
    pub fn apply(&self, quote: &Quote) -> HookAmmResult<ReserveState> {
        let mut next = *self;
        match quote.intent {
            TradeIntent::Buy { sol_amount_in } => {
                let sol_after_fee = checked_sub(sol_amount_in, quote.fee)?;
                next.real_sol_reserves = checked_add(self.real_sol_reserves, sol_after_fee)?;
                next.real_token_reserves = checked_add(self.real_token_reserves, quote.amount_out)?;
            }
            TradeIntent::Sell { token_amount_in } => {
                let sol_out_before_fee = checked_add(quote.amount_out, quote.fee)?;
                next.real_sol_reserves = checked_sub(self.real_sol_reserves, sol_out_before_fee)
                    .map_err(|_| HookAmmError::InsufficientReserves)?;
                next.real_token_reserves = checked_sub(self.real_token_reserves, token_amount_in)
                    .map_err(|_| HookAmmError::InsufficientReserves)?;
            }
        }
        Ok(next)
    }

    fn corrupt(&self) -> HookAmmError {
        HookAmmError::CorruptReserves {
            virtual_token_reserves: self.virtual_token_reserves,
            real_token_reserves: self.real_token_reserves,
            virtual_sol_reserves: self.virtual_sol_reserves,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn fresh_curve() -> ReserveState {
        ReserveState {
            virtual_token_reserves: 500_000_000_000,
            virtual_sol_reserves: 10_000_000_000,
            real_token_reserves: 0,
            real_sol_reserves: 0,
            token_total_supply: 1_000_000_000_000,
            complete: false,
        }
    }

    #[test]
    fn effective_reserves() {
        let reserves = ReserveState {
            real_token_reserves: 100_000_000_000,
            real_sol_reserves: 2_000_000_000,
            ..fresh_curve()
        };
        assert_eq!(reserves.effective_sol_reserves(), Ok(12_000_000_000));
        assert_eq!(reserves.effective_token_reserves(), Ok(400_000_000_000));
        assert_eq!(
            reserves.invariant(),
            Ok(12_000_000_000u128 * 400_000_000_000u128)
        );
    }

    #[test]
    fn exhausted_token_side_is_an_integrity_error() {
        let reserves = ReserveState {
            real_token_reserves: 500_000_000_000,
            ..fresh_curve()
        };
        assert_matches!(
            reserves.effective_token_reserves(),
            Err(HookAmmError::CorruptReserves { .. })
        );

        let inverted = ReserveState {
            real_token_reserves: 600_000_000_000,
            ..fresh_curve()
        };
        assert_matches!(inverted.spot_price(), Err(HookAmmError::CorruptReserves { .. }));
    }

    #[test]
    fn zero_sol_side_is_an_integrity_error() {
        let reserves = ReserveState {
            virtual_sol_reserves: 0,
            ..fresh_curve()
        };
        assert_matches!(
            reserves.effective_sol_reserves(),
            Err(HookAmmError::CorruptReserves { .. })
        );
    }

    #[test]
    fn spot_price_and_market_cap() {
        let reserves = fresh_curve();
        // 10 SOL over 500 billion base units
        assert_eq!(reserves.spot_price(), Ok(20_000_000));
        assert_eq!(reserves.market_cap(), Ok(20_000_000_000));
    }
}
