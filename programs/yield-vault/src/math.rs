//! Share pricing and fee arithmetic. Everything is checked; intermediate
//! products are widened to u128.

use crate::constants::{MAX_REBALANCE_FEE_RATE, WAD};
use crate::error::{Result, VaultError};
use crate::require;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rounding {
    Floor,
    Ceiling,
}

/// Totals padded with one virtual asset and `10^offset` virtual shares, so an
/// empty or donation-inflated vault still prices shares sanely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct VirtualTotals {
    assets: u64,
    shares: u64,
}

impl VirtualTotals {
    fn new(total_assets: u64, total_shares: u64, decimals_offset: u8) -> Result<Self> {
        let padding = 10u64
            .checked_pow(u32::from(decimals_offset))
            .ok_or(VaultError::MathOverflow)?;
        Ok(Self {
            assets: total_assets.checked_add(1).ok_or(VaultError::MathOverflow)?,
            shares: total_shares
                .checked_add(padding)
                .ok_or(VaultError::MathOverflow)?,
        })
    }
}

/// `assets × (S + 10^offset) / (A + 1)`
pub fn convert_to_shares(
    assets: u64,
    total_assets: u64,
    total_shares: u64,
    decimals_offset: u8,
    rounding: Rounding,
) -> Result<u64> {
    let totals = VirtualTotals::new(total_assets, total_shares, decimals_offset)?;
    mul_div(assets, totals.shares, totals.assets, rounding)
}

/// `shares × (A + 1) / (S + 10^offset)`
pub fn convert_to_assets(
    shares: u64,
    total_assets: u64,
    total_shares: u64,
    decimals_offset: u8,
    rounding: Rounding,
) -> Result<u64> {
    let totals = VirtualTotals::new(total_assets, total_shares, decimals_offset)?;
    mul_div(shares, totals.assets, totals.shares, rounding)
}

/// `value × numerator / denominator`, rounded as requested. Fails if the
/// quotient does not fit a u64.
pub fn mul_div(value: u64, numerator: u64, denominator: u64, rounding: Rounding) -> Result<u64> {
    require!(denominator > 0, VaultError::DivisionByZero);

    let product = u128::from(value)
        .checked_mul(u128::from(numerator))
        .ok_or(VaultError::MathOverflow)?;
    let denominator = u128::from(denominator);

    let quotient = match rounding {
        Rounding::Floor => product / denominator,
        Rounding::Ceiling => product.div_ceil(denominator),
    };

    u64::try_from(quotient).map_err(|_| VaultError::MathOverflow)
}

/// Fee charged on `assets` at a WAD-scaled rate. Floors, so the fee never
/// exceeds `assets × rate`.
pub fn fee_amount(assets: u64, rate: u64) -> Result<u64> {
    mul_div(assets, rate, WAD, Rounding::Floor)
}

/// Largest fee a rebalance of `assets` may skim.
pub fn max_rebalance_fee(assets: u64) -> Result<u64> {
    fee_amount(assets, MAX_REBALANCE_FEE_RATE)
}
