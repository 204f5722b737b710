use crate::address::Address;
use crate::token::TokenBank;

/// Everything an instruction needs besides the component it acts on: who is
/// calling, the token ledger, and the time the call is processed at.
pub struct Context<'a> {
    pub signer: Address,
    pub bank: &'a mut TokenBank,
    pub unix_timestamp: i64,
}

impl<'a> Context<'a> {
    pub fn new(signer: Address, bank: &'a mut TokenBank, unix_timestamp: i64) -> Self {
        Self {
            signer,
            bank,
            unix_timestamp,
        }
    }

    /// Same bank and clock, different signer. Used when one component calls
    /// another under its own identity.
    pub fn with_signer(&mut self, signer: Address) -> Context<'_> {
        Context {
            signer,
            bank: &mut *self.bank,
            unix_timestamp: self.unix_timestamp,
        }
    }
}
