//! In-process fungible token ledger.
//!
//! Plays the role the token program plays for an on-chain vault: it holds
//! balances per `(mint, owner)`, mint supplies and spender allowances. Every
//! write is journaled while an [`TokenBank::atomic`] section is open, so a
//! failing operation leaves no trace of its partial transfers.

use std::collections::HashMap;

use crate::address::Address;
use crate::error::{Result, VaultError};
use crate::require;

#[derive(Debug, Clone)]
enum Undo {
    Balance { key: (Address, Address), previous: u64 },
    Supply { mint: Address, previous: u64 },
    Allowance { key: (Address, Address, Address), previous: u64 },
}

#[derive(Debug, Default)]
pub struct TokenBank {
    balances: HashMap<(Address, Address), u64>,
    supplies: HashMap<Address, u64>,
    allowances: HashMap<(Address, Address, Address), u64>,
    journal: Vec<Undo>,
    depth: usize,
}

impl TokenBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, mint: &Address, owner: &Address) -> u64 {
        self.balances.get(&(*mint, *owner)).copied().unwrap_or(0)
    }

    pub fn supply(&self, mint: &Address) -> u64 {
        self.supplies.get(mint).copied().unwrap_or(0)
    }

    pub fn allowance(&self, mint: &Address, owner: &Address, spender: &Address) -> u64 {
        self.allowances
            .get(&(*mint, *owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Run `f` as one all-or-nothing unit. On error every write made inside
    /// `f` (including nested sections) is rolled back.
    pub fn atomic<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TokenBank) -> Result<T>,
    {
        let checkpoint = self.journal.len();
        self.depth += 1;
        let outcome = f(self);
        self.depth -= 1;

        if outcome.is_err() {
            self.rollback_to(checkpoint);
        } else if self.depth == 0 {
            self.journal.clear();
        }
        outcome
    }

    fn rollback_to(&mut self, checkpoint: usize) {
        while self.journal.len() > checkpoint {
            match self.journal.pop() {
                Some(Undo::Balance { key, previous }) => {
                    self.balances.insert(key, previous);
                }
                Some(Undo::Supply { mint, previous }) => {
                    self.supplies.insert(mint, previous);
                }
                Some(Undo::Allowance { key, previous }) => {
                    self.allowances.insert(key, previous);
                }
                None => break,
            }
        }
    }

    fn set_balance(&mut self, mint: &Address, owner: &Address, amount: u64) {
        let key = (*mint, *owner);
        let previous = self.balances.insert(key, amount).unwrap_or(0);
        if self.depth > 0 {
            self.journal.push(Undo::Balance { key, previous });
        }
    }

    fn set_supply(&mut self, mint: &Address, amount: u64) {
        let previous = self.supplies.insert(*mint, amount).unwrap_or(0);
        if self.depth > 0 {
            self.journal.push(Undo::Supply { mint: *mint, previous });
        }
    }

    fn set_allowance(&mut self, mint: &Address, owner: &Address, spender: &Address, amount: u64) {
        let key = (*mint, *owner, *spender);
        let previous = self.allowances.insert(key, amount).unwrap_or(0);
        if self.depth > 0 {
            self.journal.push(Undo::Allowance { key, previous });
        }
    }

    pub fn transfer(&mut self, mint: &Address, from: &Address, to: &Address, amount: u64) -> Result<()> {
        require!(!to.is_zero(), VaultError::ZeroAddress);
        if amount == 0 || from == to {
            return Ok(());
        }

        let from_balance = self
            .balance_of(mint, from)
            .checked_sub(amount)
            .ok_or(VaultError::InsufficientFunds)?;
        let to_balance = self
            .balance_of(mint, to)
            .checked_add(amount)
            .ok_or(VaultError::MathOverflow)?;

        self.set_balance(mint, from, from_balance);
        self.set_balance(mint, to, to_balance);
        Ok(())
    }

    pub fn approve(&mut self, mint: &Address, owner: &Address, spender: &Address, amount: u64) -> Result<()> {
        require!(!spender.is_zero(), VaultError::ZeroAddress);
        self.set_allowance(mint, owner, spender, amount);
        Ok(())
    }

    /// Consume `amount` of `spender`'s allowance over `owner`'s tokens.
    /// An allowance of `u64::MAX` is treated as unlimited.
    pub fn spend_allowance(&mut self, mint: &Address, owner: &Address, spender: &Address, amount: u64) -> Result<()> {
        let current = self.allowance(mint, owner, spender);
        if current == u64::MAX {
            return Ok(());
        }
        let remaining = current
            .checked_sub(amount)
            .ok_or(VaultError::InsufficientAllowance)?;
        self.set_allowance(mint, owner, spender, remaining);
        Ok(())
    }

    pub fn transfer_from(
        &mut self,
        mint: &Address,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<()> {
        if spender != from {
            self.spend_allowance(mint, from, spender, amount)?;
        }
        self.transfer(mint, from, to, amount)
    }

    pub fn mint_to(&mut self, mint: &Address, to: &Address, amount: u64) -> Result<()> {
        require!(!to.is_zero(), VaultError::ZeroAddress);
        let supply = self
            .supply(mint)
            .checked_add(amount)
            .ok_or(VaultError::MathOverflow)?;
        let balance = self
            .balance_of(mint, to)
            .checked_add(amount)
            .ok_or(VaultError::MathOverflow)?;
        self.set_supply(mint, supply);
        self.set_balance(mint, to, balance);
        Ok(())
    }

    pub fn burn(&mut self, mint: &Address, from: &Address, amount: u64) -> Result<()> {
        let balance = self
            .balance_of(mint, from)
            .checked_sub(amount)
            .ok_or(VaultError::InsufficientFunds)?;
        let supply = self
            .supply(mint)
            .checked_sub(amount)
            .ok_or(VaultError::MathOverflow)?;
        self.set_balance(mint, from, balance);
        self.set_supply(mint, supply);
        Ok(())
    }
}
