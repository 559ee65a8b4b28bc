//! Zap composition
//!
//! A zap-in is five instructions that must land in one transaction:
//!
//! 1. arm the ledger with the unswapped remainder and the output-side balance
//! 2. the caller's external swap, unmodified
//! 3. settle the ledger, bounding the realized output
//! 4. the deposit, which reads both amounts from the ledger
//! 5. close the ledger
//!
//! The transaction's all-or-nothing execution is what makes the sequence
//! safe: a failed deposit also undoes the swap.

use serde::Serialize;
use solana_sdk::{instruction::Instruction, pubkey::Pubkey};
use tracing::{debug, info};
use zap::instructions::ZapOutParameters;

use crate::errors::{SdkError, SdkResult};
use crate::instructions::{self, RelayedSwap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ZapStepKind {
    ArmLedger,
    ExternalSwap,
    SettleLedger,
    Deposit,
    CloseLedger,
    Withdraw,
    RelayedSwap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZapStep {
    pub kind: ZapStepKind,
    pub instruction: Instruction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZapPlan {
    pub steps: Vec<ZapStep>,
    /// Input left unswapped and credited to the ledger's input side
    pub remainder: u64,
}

/// Loggable outline of a plan
#[derive(Debug, Clone, Serialize)]
pub struct ZapPlanSummary {
    pub steps: Vec<ZapStepKind>,
    pub remainder: u64,
    pub programs: Vec<String>,
}

impl ZapPlan {
    pub fn kinds(&self) -> Vec<ZapStepKind> {
        self.steps.iter().map(|step| step.kind).collect()
    }

    pub fn summary(&self) -> ZapPlanSummary {
        ZapPlanSummary {
            steps: self.kinds(),
            remainder: self.remainder,
            programs: self
                .steps
                .iter()
                .map(|step| step.instruction.program_id.to_string())
                .collect(),
        }
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.steps.into_iter().map(|step| step.instruction).collect()
    }
}

/// Inputs of a ledger-bracketed zap-in
#[derive(Debug, Clone)]
pub struct ZapInput {
    pub program_id: Pubkey,
    pub owner: Pubkey,
    pub total_input_amount: u64,
    /// Part of the input the external swap spends
    pub swap_portion: u64,
    /// Whether the input token is the ledger's side A (token X)
    pub input_is_token_a: bool,
    /// Owner's token account receiving the swap output
    pub output_token_account: Pubkey,
    /// Balance of `output_token_account` before the swap
    pub output_pre_balance: u64,
    /// Largest swap output the settle step accepts
    pub max_transfer_amount: u64,
    pub swap_instruction: Instruction,
    /// Deposit reading its amounts from the settled ledger
    pub deposit_instruction: Instruction,
    /// Defaults to the owner
    pub rent_receiver: Option<Pubkey>,
}

pub fn compose_zap(input: ZapInput) -> SdkResult<ZapPlan> {
    let remainder = input
        .total_input_amount
        .checked_sub(input.swap_portion)
        .ok_or_else(|| {
            SdkError::InvalidParameter(format!(
                "swap portion {} exceeds total input {}",
                input.swap_portion, input.total_input_amount
            ))
        })?;
    if input.swap_instruction.program_id == input.program_id {
        return Err(SdkError::InvalidParameter(
            "external swap must target another program".to_string(),
        ));
    }

    let program_id = &input.program_id;
    let owner = &input.owner;
    let steps = vec![
        ZapStep {
            kind: ZapStepKind::ArmLedger,
            instruction: instructions::set_ledger_balance(
                program_id,
                owner,
                remainder,
                input.output_pre_balance,
                input.input_is_token_a,
            ),
        },
        ZapStep {
            kind: ZapStepKind::ExternalSwap,
            instruction: input.swap_instruction,
        },
        ZapStep {
            kind: ZapStepKind::SettleLedger,
            instruction: instructions::update_ledger_balance_after_swap(
                program_id,
                owner,
                &input.output_token_account,
                input.output_pre_balance,
                input.max_transfer_amount,
                !input.input_is_token_a,
            ),
        },
        ZapStep {
            kind: ZapStepKind::Deposit,
            instruction: input.deposit_instruction,
        },
        ZapStep {
            kind: ZapStepKind::CloseLedger,
            instruction: instructions::close_ledger(
                program_id,
                owner,
                &input.rent_receiver.unwrap_or(*owner),
            ),
        },
    ];

    let plan = ZapPlan { steps, remainder };
    if let Ok(summary) = serde_json::to_string(&plan.summary()) {
        debug!(%summary, "zap plan");
    }
    info!(
        %owner,
        remainder,
        swap_portion = input.swap_portion,
        max_transfer_amount = input.max_transfer_amount,
        "composed zap in"
    );
    Ok(plan)
}

/// Inputs of a withdraw-then-swap zap-out
#[derive(Debug, Clone)]
pub struct ZapOutInput {
    pub program_id: Pubkey,
    pub withdraw_instruction: Instruction,
    /// Token account the withdrawal pays into and the swap spends from
    pub user_token_in_account: Pubkey,
    pub swap: RelayedSwap,
    pub params: ZapOutParameters,
}

pub fn compose_zap_out(input: ZapOutInput) -> SdkResult<ZapPlan> {
    if input.params.percentage == 0 || input.params.percentage > zap::constants::MAX_PERCENTAGE {
        return Err(SdkError::InvalidParameter(format!(
            "percentage {} is outside 1..=100",
            input.params.percentage
        )));
    }
    let adapter = input.swap.action.adapter();
    if input.swap.amm_program != adapter.program_id {
        return Err(SdkError::InvalidParameter(format!(
            "{:?} swaps must target {}",
            input.swap.action, adapter.program_id
        )));
    }
    let source = input.swap.accounts.get(adapter.source_index).map(|meta| meta.pubkey);
    if source != Some(input.user_token_in_account) {
        return Err(SdkError::InvalidParameter(format!(
            "swap account {} must be the input token account",
            adapter.source_index
        )));
    }

    debug!(action = ?input.swap.action, percentage = input.params.percentage, "composing zap out");
    let relay = instructions::zap_out(
        &input.program_id,
        &input.user_token_in_account,
        input.swap,
        input.params,
    );
    Ok(ZapPlan {
        steps: vec![
            ZapStep {
                kind: ZapStepKind::Withdraw,
                instruction: input.withdraw_instruction,
            },
            ZapStep {
                kind: ZapStepKind::RelayedSwap,
                instruction: relay,
            },
        ],
        remainder: 0,
    })
}
