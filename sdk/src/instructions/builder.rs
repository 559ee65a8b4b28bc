use anchor_lang::{InstructionData, ToAccountMetas};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

/// Builder for zap program instructions
pub struct ZapInstructionBuilder {
    program_id: Pubkey,
    accounts: Vec<AccountMeta>,
    data: Vec<u8>,
}

impl ZapInstructionBuilder {
    /// Start from the program's generated account and argument types
    pub fn from_anchor(program_id: Pubkey, accounts: impl ToAccountMetas, args: impl InstructionData) -> Self {
        Self {
            program_id,
            accounts: accounts.to_account_metas(None),
            data: args.data(),
        }
    }

    /// Append remaining accounts in order
    pub fn add_accounts(mut self, accounts: impl IntoIterator<Item = AccountMeta>) -> Self {
        self.accounts.extend(accounts);
        self
    }

    pub fn build(self) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: self.accounts,
            data: self.data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_lang::Discriminator;
    use crate::pda::derive_user_ledger;

    #[test]
    fn test_generated_accounts_lead() {
        let owner = Pubkey::new_unique();
        let (ledger, _) = derive_user_ledger(&zap::ID, &owner);
        let extra = AccountMeta::new(Pubkey::new_unique(), false);
        let ix = ZapInstructionBuilder::from_anchor(
            zap::ID,
            zap::accounts::SetLedgerBalance { ledger, owner },
            zap::instruction::SetLedgerBalance {
                amount: 5,
                pre_balance: 6,
                is_token_a: true,
            },
        )
        .add_accounts([extra.clone()])
        .build();

        assert_eq!(ix.accounts, vec![AccountMeta::new(ledger, false), AccountMeta::new_readonly(owner, true), extra]);
        assert_eq!(ix.data[..8], *zap::instruction::SetLedgerBalance::DISCRIMINATOR);
        assert_eq!(ix.data[8..16], 5u64.to_le_bytes());
        assert_eq!(ix.data.len(), 8 + 8 + 8 + 1);
    }
}
