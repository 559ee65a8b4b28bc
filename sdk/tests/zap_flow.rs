//! # Zap Flow
//!
//! Runs composed zap transactions through an in-memory host that applies
//! every instruction in order and rolls the whole transaction back on the
//! first failure. The ledger runs the program's own state machine and the
//! deposit lands in a real liquidity book.

use std::collections::HashMap;

use anchor_lang::{AnchorDeserialize, Discriminator};
use lb_core::book::LiquidityBook;
use lb_core::{DynamicPosition, LbCoreError};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};
use zap::constants::{program_id, CP_SWAP_DISC, CP_SWAP_DESTINATION_ACCOUNT_INDEX, CP_SWAP_SOURCE_ACCOUNT_INDEX};
use zap::error::ZapError;
use zap::state::{LedgerState, UserLedger};
use zap::utils::{
    check_relay, new_position_range, position_rebalancing, relay_payload, require_active_bin_within, spent_amounts,
};
use zap_sdk::discovery::bin_arrays_for_range;
use zap_sdk::instructions::{
    initialize_ledger, zap_in_lb, zap_in_lb_for_new_position, RelayedSwap, ZapInLbAccounts,
};
use zap_sdk::{
    compose_zap, compose_zap_out, AccountsType, RemainingAccountsInfo, RemainingAccountsSlice, SdkError,
    StrategyType, ZapAction, ZapInLbParameters, ZapInput, ZapOutInput, ZapOutParameters, ZapStepKind,
};

const ACTIVE_ID: i32 = 0;
const BIN_STEP: u16 = 10;
const LOWER: i32 = -10;
const WIDTH: usize = 21;

const TOTAL_INPUT: u64 = 10_000_000;
const SWAP_PORTION: u64 = 4_000_000;
const SWAP_OUTPUT: u64 = 3_900_000;
const OUTPUT_PRE_BALANCE: u64 = 500_000;

/// Pays a fixed output for a fixed input. Data is `amount_in || amount_out`,
/// accounts are `[source, destination]`.
fn swap_program() -> Pubkey {
    Pubkey::new_from_array([7; 32])
}

/// Withdraws `bps` of the host position. Data is `bps` as little-endian u16.
fn withdraw_program() -> Pubkey {
    Pubkey::new_from_array([8; 32])
}

#[derive(Debug, PartialEq)]
enum Failure {
    Zap(u32),
    Core(LbCoreError),
    Program(String),
    InsufficientFunds(Pubkey),
    UnknownInstruction(Pubkey),
}

impl From<anchor_lang::error::Error> for Failure {
    fn from(err: anchor_lang::error::Error) -> Self {
        match err {
            anchor_lang::error::Error::AnchorError(err) => Failure::Zap(err.error_code_number),
            other => Failure::Program(other.to_string()),
        }
    }
}

impl From<ZapError> for Failure {
    fn from(err: ZapError) -> Self {
        Failure::Zap(u32::from(err))
    }
}

impl From<LbCoreError> for Failure {
    fn from(err: LbCoreError) -> Self {
        Failure::Core(err)
    }
}

impl From<std::io::Error> for Failure {
    fn from(err: std::io::Error) -> Self {
        Failure::Program(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Deposit {
    offered: (u64, u64),
    spent: (u64, u64),
}

#[derive(Clone)]
struct Host {
    owner: Pubkey,
    user_x: Pubkey,
    user_y: Pubkey,
    balances: HashMap<Pubkey, u64>,
    ledger: Option<UserLedger>,
    book: LiquidityBook,
    position: DynamicPosition,
    deposits: Vec<Deposit>,
}

impl Host {
    fn new() -> Self {
        zap_sdk::logging::init_tracing("warn");
        let owner = Pubkey::new_unique();
        let user_x = Pubkey::new_unique();
        let user_y = Pubkey::new_unique();
        let mut book = LiquidityBook::new(lb_pair().to_bytes(), ACTIVE_ID, BIN_STEP);
        book.initialize_bin_arrays_for_range(LOWER, upper()).unwrap();
        let position = book.open_position(owner.to_bytes(), LOWER, WIDTH).unwrap();
        Self {
            owner,
            user_x,
            user_y,
            balances: HashMap::from([(user_x, TOTAL_INPUT), (user_y, OUTPUT_PRE_BALANCE)]),
            ledger: None,
            book,
            position,
            deposits: Vec::new(),
        }
    }

    fn balance(&self, account: &Pubkey) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn credit(&mut self, account: Pubkey, amount: u64) {
        *self.balances.entry(account).or_insert(0) += amount;
    }

    fn debit(&mut self, account: Pubkey, amount: u64) -> Result<(), Failure> {
        let balance = self.balances.entry(account).or_insert(0);
        *balance = balance
            .checked_sub(amount)
            .ok_or(Failure::InsufficientFunds(account))?;
        Ok(())
    }

    fn ledger(&self) -> Result<UserLedger, Failure> {
        self.ledger
            .ok_or_else(|| Failure::Program("ledger is not initialized".to_string()))
    }

    /// All-or-nothing transaction
    fn execute(&mut self, instructions: &[Instruction]) -> Result<(), Failure> {
        let checkpoint = self.clone();
        for instruction in instructions {
            if let Err(failure) = self.dispatch(instruction) {
                *self = checkpoint;
                return Err(failure);
            }
        }
        Ok(())
    }

    fn dispatch(&mut self, ix: &Instruction) -> Result<(), Failure> {
        if ix.program_id == zap::ID {
            return self.run_zap(ix);
        }
        if ix.program_id == swap_program() {
            let amount_in = u64::from_le_bytes(ix.data[..8].try_into().unwrap());
            let amount_out = u64::from_le_bytes(ix.data[8..16].try_into().unwrap());
            self.debit(ix.accounts[0].pubkey, amount_in)?;
            self.credit(ix.accounts[1].pubkey, amount_out);
            return Ok(());
        }
        if ix.program_id == withdraw_program() {
            let bps = u16::from_le_bytes(ix.data[..2].try_into().unwrap());
            let (lower, upper) = (self.position.lower_bin_id(), self.position.upper_bin_id());
            let (x, y) = self
                .book
                .remove_liquidity_by_bps(&mut self.position, lower, upper, bps)?;
            self.credit(self.user_x, x as u64);
            self.credit(self.user_y, y as u64);
            return Ok(());
        }
        if ix.program_id == program_id::CP_AMM {
            // Pays 90% of the input, data is `disc || amount_in || minimum_out`
            assert_eq!(ix.data[..8], CP_SWAP_DISC);
            let amount_in = u64::from_le_bytes(ix.data[8..16].try_into().unwrap());
            let source = ix.accounts[CP_SWAP_SOURCE_ACCOUNT_INDEX].pubkey;
            let destination = ix.accounts[CP_SWAP_DESTINATION_ACCOUNT_INDEX].pubkey;
            self.debit(source, amount_in)?;
            self.credit(destination, amount_in / 10 * 9);
            return Ok(());
        }
        Err(Failure::UnknownInstruction(ix.program_id))
    }

    fn run_zap(&mut self, ix: &Instruction) -> Result<(), Failure> {
        use zap::instruction as zi;

        let (tag, args) = ix.data.split_at(8);
        if tag == zi::InitializeLedger::DISCRIMINATOR {
            if self.ledger.is_some() {
                return Err(Failure::Program("ledger already in use".to_string()));
            }
            let mut ledger = UserLedger::default();
            ledger.initialize(self.owner, 255);
            self.ledger = Some(ledger);
        } else if tag == zi::SetLedgerBalance::DISCRIMINATOR {
            let args = zi::SetLedgerBalance::try_from_slice(args)?;
            let mut ledger = self.ledger()?;
            ledger.arm(args.amount, args.pre_balance, args.is_token_a)?;
            self.ledger = Some(ledger);
        } else if tag == zi::UpdateLedgerBalanceAfterSwap::DISCRIMINATOR {
            let args = zi::UpdateLedgerBalanceAfterSwap::try_from_slice(args)?;
            // Accounts are `[ledger, token_account, owner]`
            let current = self.balance(&ix.accounts[1].pubkey);
            let mut ledger = self.ledger()?;
            ledger.settle(current, args.pre_balance, args.max_transfer_amount, args.is_token_a)?;
            self.ledger = Some(ledger);
        } else if tag == zi::ZapInLb::DISCRIMINATOR {
            let args = zi::ZapInLb::try_from_slice(args)?;
            self.deposit(args.params)?;
        } else if tag == zi::ZapInLbForNewPosition::DISCRIMINATOR {
            let args = zi::ZapInLbForNewPosition::try_from_slice(args)?;
            self.deposit_into_new_position(args.bin_delta, args.params)?;
        } else if tag == zi::ZapOut::DISCRIMINATOR {
            let args = zi::ZapOut::try_from_slice(args)?;
            self.relay(ix, args.action, args.params)?;
        } else if tag == zi::CloseLedger::DISCRIMINATOR {
            self.ledger()?.ensure_closable()?;
            self.ledger = None;
        } else {
            return Err(Failure::UnknownInstruction(ix.program_id));
        }
        Ok(())
    }

    fn deposit(&mut self, params: ZapInLbParameters) -> Result<(), Failure> {
        let mut ledger = self.ledger()?;
        let offered = ledger.deposit_amounts()?;

        let active_id = self.book.active_id();
        require_active_bin_within(active_id, params.expected_active_id, params.max_active_bin_slippage)?;
        let rebalancing = position_rebalancing(
            offered,
            active_id,
            self.book.bin_step(),
            (self.position.lower_bin_id(), self.position.upper_bin_id()),
            &params,
        )?;

        // Stands in for the rebalance CPI pulling from the owner's accounts
        let pre = (self.balance(&self.user_x), self.balance(&self.user_y));
        let (x, y) = self
            .book
            .add_liquidity_by_strategy(&mut self.position, &rebalancing)?;
        self.debit(self.user_x, x as u64)?;
        self.debit(self.user_y, y as u64)?;
        let spent = spent_amounts(pre, (self.balance(&self.user_x), self.balance(&self.user_y)));

        ledger.consume(spent.0, spent.1)?;
        self.ledger = Some(ledger);
        self.deposits.push(Deposit { offered, spent });
        Ok(())
    }

    fn deposit_into_new_position(&mut self, bin_delta: u8, params: ZapInLbParameters) -> Result<(), Failure> {
        let active_id = self.book.active_id();
        require_active_bin_within(active_id, params.expected_active_id, params.max_active_bin_slippage)?;
        let (lower_bin_id, width) = new_position_range(active_id, bin_delta)?;
        self.position = self
            .book
            .open_position(self.owner.to_bytes(), lower_bin_id, width as usize)?;
        self.deposit(params)
    }

    fn relay(&mut self, ix: &Instruction, action: u8, params: ZapOutParameters) -> Result<(), Failure> {
        // Accounts are `[user_token_in_account, amm_program, ..swap accounts]`
        let token_in = ix.accounts[0].pubkey;
        let swap_accounts = &ix.accounts[2..];
        let swap_keys: Vec<Pubkey> = swap_accounts.iter().map(|meta| meta.pubkey).collect();
        let (_, adapter) = check_relay(action, &params, &ix.accounts[1].pubkey, &token_in, &swap_keys)?;

        let Some((_, data)) = relay_payload(&params, &adapter, self.balance(&token_in))? else {
            return Ok(());
        };
        self.dispatch(&Instruction {
            program_id: adapter.program_id,
            accounts: swap_accounts.to_vec(),
            data,
        })
    }
}

fn lb_pair() -> Pubkey {
    Pubkey::new_from_array([42; 32])
}

fn upper() -> i32 {
    LOWER + WIDTH as i32 - 1
}

fn mock_swap(source: Pubkey, destination: Pubkey, amount_in: u64, amount_out: u64) -> Instruction {
    let mut data = amount_in.to_le_bytes().to_vec();
    data.extend_from_slice(&amount_out.to_le_bytes());
    Instruction {
        program_id: swap_program(),
        accounts: vec![AccountMeta::new(source, false), AccountMeta::new(destination, false)],
        data,
    }
}

/// Accounts and parameters of a deposit over `[lower, upper]`
fn deposit_parts(
    host: &Host,
    (lower, upper): (i32, i32),
    expected_active_id: i32,
    max_active_bin_slippage: u16,
) -> (ZapInLbAccounts, ZapInLbParameters) {
    let lb_program = program_id::LB_CLMM;
    let bin_arrays = bin_arrays_for_range(&lb_program, &lb_pair(), lower, upper).unwrap();
    let params = ZapInLbParameters {
        expected_active_id,
        max_active_bin_slippage,
        favor_x_in_active_id: false,
        strategy: StrategyType::Spot,
        remaining_accounts_info: RemainingAccountsInfo {
            slices: vec![RemainingAccountsSlice {
                accounts_type: AccountsType::BinArrays,
                length: bin_arrays.len() as u8,
            }],
        },
    };
    let accounts = ZapInLbAccounts {
        owner: host.owner,
        lb_program,
        lb_pair: lb_pair(),
        bin_array_bitmap_extension: None,
        position: Pubkey::new_unique(),
        user_token_x: host.user_x,
        user_token_y: host.user_y,
        reserve_x: Pubkey::new_unique(),
        reserve_y: Pubkey::new_unique(),
        token_x_mint: Pubkey::new_unique(),
        token_y_mint: Pubkey::new_unique(),
        token_x_program: spl_token::ID,
        token_y_program: spl_token::ID,
        memo_program: Pubkey::new_unique(),
        remaining_accounts: bin_arrays,
    };
    (accounts, params)
}

fn deposit_instruction(host: &Host, expected_active_id: i32, max_active_bin_slippage: u16) -> Instruction {
    let (accounts, params) = deposit_parts(host, (LOWER, upper()), expected_active_id, max_active_bin_slippage);
    zap_in_lb(&zap::ID, accounts, params)
}

fn new_position_deposit_instruction(
    host: &Host,
    bin_delta: u8,
    expected_active_id: i32,
    max_active_bin_slippage: u16,
) -> Instruction {
    let delta = i32::from(bin_delta);
    let range = (ACTIVE_ID - delta, ACTIVE_ID + delta);
    let (accounts, params) = deposit_parts(host, range, expected_active_id, max_active_bin_slippage);
    zap_in_lb_for_new_position(&zap::ID, accounts, &host.owner, bin_delta, params)
}

/// X in, the swap turns part of it into Y
fn zap_input(host: &Host, max_transfer_amount: u64, deposit: Instruction) -> ZapInput {
    ZapInput {
        program_id: zap::ID,
        owner: host.owner,
        total_input_amount: TOTAL_INPUT,
        swap_portion: SWAP_PORTION,
        input_is_token_a: true,
        output_token_account: host.user_y,
        output_pre_balance: host.balance(&host.user_y),
        max_transfer_amount,
        swap_instruction: mock_swap(host.user_x, host.user_y, SWAP_PORTION, SWAP_OUTPUT),
        deposit_instruction: deposit,
        rent_receiver: None,
    }
}

fn host_with_ledger() -> Host {
    let mut host = Host::new();
    host.execute(&[initialize_ledger(&zap::ID, &host.owner)]).unwrap();
    host
}

#[test]
fn test_zap_in_deposits_remainder_and_swap_output() {
    let mut host = host_with_ledger();
    let deposit = deposit_instruction(&host, ACTIVE_ID, 0);
    let plan = compose_zap(zap_input(&host, 5_000_000, deposit)).unwrap();
    assert_eq!(plan.remainder, TOTAL_INPUT - SWAP_PORTION);

    host.execute(&plan.into_instructions()).unwrap();

    // The deposit saw exactly the untouched remainder and the realized output
    assert_eq!(host.deposits.len(), 1);
    let Deposit { offered, spent } = host.deposits[0];
    assert_eq!(offered, (TOTAL_INPUT - SWAP_PORTION, SWAP_OUTPUT));
    assert!(spent.0 > 0 && spent.0 <= offered.0);
    assert!(spent.1 > 0 && spent.1 <= offered.1);

    assert_eq!(host.balance(&host.user_x), TOTAL_INPUT - SWAP_PORTION - spent.0);
    assert_eq!(host.balance(&host.user_y), OUTPUT_PRE_BALANCE + SWAP_OUTPUT - spent.1);
    assert_eq!(
        host.book.total_reserves().unwrap(),
        (u128::from(spent.0), u128::from(spent.1))
    );
    assert!(host.ledger.is_none());
}

#[test]
fn test_exceeded_transfer_bound_rolls_back_swap() {
    let mut host = host_with_ledger();
    let deposit = deposit_instruction(&host, ACTIVE_ID, 0);
    let plan = compose_zap(zap_input(&host, SWAP_OUTPUT - 1, deposit)).unwrap();

    let result = host.execute(&plan.into_instructions());
    assert_eq!(result, Err(ZapError::ExceededTransferBound.into()));

    assert_eq!(host.balance(&host.user_x), TOTAL_INPUT);
    assert_eq!(host.balance(&host.user_y), OUTPUT_PRE_BALANCE);
    assert_eq!(host.ledger().unwrap().ledger_state().unwrap(), LedgerState::Idle);
    assert!(host.deposits.is_empty());
    assert_eq!(host.book.total_reserves().unwrap(), (0, 0));
}

#[test]
fn test_active_bin_slippage_rolls_back_everything() {
    let mut host = host_with_ledger();
    let deposit = deposit_instruction(&host, ACTIVE_ID + 5, 2);
    let plan = compose_zap(zap_input(&host, u64::MAX, deposit)).unwrap();

    let result = host.execute(&plan.into_instructions());
    assert_eq!(result, Err(ZapError::ExceededActiveBinSlippage.into()));
    assert_eq!(host.balance(&host.user_x), TOTAL_INPUT);
    assert_eq!(host.balance(&host.user_y), OUTPUT_PRE_BALANCE);
    assert_eq!(host.ledger().unwrap().ledger_state().unwrap(), LedgerState::Idle);
}

#[test]
fn test_stale_snapshot_is_rejected() {
    let mut host = host_with_ledger();
    let deposit = deposit_instruction(&host, ACTIVE_ID, 0);
    let mut plan = compose_zap(zap_input(&host, u64::MAX, deposit)).unwrap();

    // Settle against a different snapshot than the one armed
    let settle = plan
        .steps
        .iter_mut()
        .find(|step| step.kind == ZapStepKind::SettleLedger)
        .unwrap();
    settle.instruction = zap_sdk::instructions::update_ledger_balance_after_swap(
        &zap::ID,
        &host.owner,
        &host.user_y,
        0,
        u64::MAX,
        false,
    );

    let result = host.execute(&plan.into_instructions());
    assert_eq!(result, Err(ZapError::LedgerSnapshotMismatch.into()));
    assert_eq!(host.balance(&host.user_y), OUTPUT_PRE_BALANCE);
}

#[test]
fn test_oversized_swap_portion_is_rejected() {
    let host = host_with_ledger();
    let deposit = deposit_instruction(&host, ACTIVE_ID, 0);
    let mut input = zap_input(&host, u64::MAX, deposit);
    input.swap_portion = TOTAL_INPUT + 1;
    assert!(matches!(compose_zap(input), Err(SdkError::InvalidParameter(_))));
}

#[test]
fn test_ledger_reopens_for_each_zap() {
    let mut host = Host::new();
    for _ in 0..2 {
        let deposit = deposit_instruction(&host, ACTIVE_ID, 0);
        let mut input = zap_input(&host, u64::MAX, deposit);
        input.total_input_amount = host.balance(&host.user_x);
        input.swap_portion = input.total_input_amount / 4;
        input.swap_instruction = mock_swap(host.user_x, host.user_y, input.swap_portion, input.swap_portion);

        let mut instructions = vec![initialize_ledger(&zap::ID, &host.owner)];
        instructions.extend(compose_zap(input).unwrap().into_instructions());
        host.execute(&instructions).unwrap();
        assert!(host.ledger.is_none());
    }
    assert_eq!(host.deposits.len(), 2);
}

#[test]
fn test_zap_in_opens_centred_position() {
    let mut host = host_with_ledger();
    let deposit = new_position_deposit_instruction(&host, 5, ACTIVE_ID, 0);
    let plan = compose_zap(zap_input(&host, u64::MAX, deposit)).unwrap();
    host.execute(&plan.into_instructions()).unwrap();

    assert_eq!(host.position.lower_bin_id(), ACTIVE_ID - 5);
    assert_eq!(host.position.upper_bin_id(), ACTIVE_ID + 5);
    assert_eq!(host.position.width(), 11);

    let Deposit { offered, spent } = host.deposits[0];
    assert_eq!(offered, (TOTAL_INPUT - SWAP_PORTION, SWAP_OUTPUT));
    assert!(spent.0 > 0 && spent.0 <= offered.0);
    assert!(spent.1 > 0 && spent.1 <= offered.1);
    assert_eq!(
        host.book.total_reserves().unwrap(),
        (u128::from(spent.0), u128::from(spent.1))
    );
    assert!(host.ledger.is_none());
}

#[test]
fn test_new_position_slippage_keeps_existing_position() {
    let mut host = host_with_ledger();
    let deposit = new_position_deposit_instruction(&host, 5, ACTIVE_ID + 5, 2);
    let plan = compose_zap(zap_input(&host, u64::MAX, deposit)).unwrap();

    let result = host.execute(&plan.into_instructions());
    assert_eq!(result, Err(ZapError::ExceededActiveBinSlippage.into()));
    assert_eq!(host.position.lower_bin_id(), LOWER);
    assert_eq!(host.position.width(), WIDTH);
    assert_eq!(host.balance(&host.user_x), TOTAL_INPUT);
}

#[test]
fn test_zap_out_swaps_released_share() {
    let mut host = host_with_ledger();
    let deposit = deposit_instruction(&host, ACTIVE_ID, 0);
    let plan = compose_zap(zap_input(&host, u64::MAX, deposit)).unwrap();
    host.execute(&plan.into_instructions()).unwrap();

    let pre_x = host.balance(&host.user_x);
    let pre_y = host.balance(&host.user_y);
    let mut swap_accounts: Vec<AccountMeta> = (0..6)
        .map(|_| AccountMeta::new(Pubkey::new_unique(), false))
        .collect();
    swap_accounts[CP_SWAP_SOURCE_ACCOUNT_INDEX] = AccountMeta::new(host.user_x, false);
    swap_accounts[CP_SWAP_DESTINATION_ACCOUNT_INDEX] = AccountMeta::new(host.user_y, false);

    // amount_in is a placeholder the relay overwrites
    let mut payload = CP_SWAP_DISC.to_vec();
    payload.extend_from_slice(&u64::MAX.to_le_bytes());
    payload.extend_from_slice(&0u64.to_le_bytes());

    let withdraw = Instruction {
        program_id: withdraw_program(),
        accounts: vec![],
        data: 10_000u16.to_le_bytes().to_vec(),
    };
    let mut preview = host.clone();
    preview.execute(&[withdraw.clone()]).unwrap();
    let released_x = preview.balance(&host.user_x) - pre_x;
    let released_y = preview.balance(&host.user_y) - pre_y;
    assert!(released_x > 0);

    let plan = compose_zap_out(ZapOutInput {
        program_id: zap::ID,
        withdraw_instruction: withdraw,
        user_token_in_account: host.user_x,
        swap: RelayedSwap {
            action: ZapAction::CpSwap,
            amm_program: program_id::CP_AMM,
            accounts: swap_accounts,
        },
        params: ZapOutParameters {
            percentage: 50,
            pre_user_token_balance: pre_x,
            max_swap_amount: u64::MAX,
            payload_data: payload,
            remaining_accounts_info: RemainingAccountsInfo::default(),
        },
    })
    .unwrap();
    host.execute(&plan.into_instructions()).unwrap();

    // Half the released X was swapped at 90%
    let swapped = released_x * 50 / 100;
    assert_eq!(host.balance(&host.user_x), pre_x + released_x - swapped);
    assert_eq!(host.balance(&host.user_y), pre_y + released_y + swapped / 10 * 9);
    assert_eq!(host.book.total_reserves().unwrap(), preview.book.total_reserves().unwrap());
}
