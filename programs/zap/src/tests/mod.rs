//! Program-side unit tests. Account-free logic only: the handlers delegate
//! their bounds and arithmetic to `utils::zap_checks`, which is covered here
//! and reused by the sdk's transaction-level host.


use anchor_lang::error::Error;

use crate::error::ZapError;

/// Assert that `result` failed with `expected`
pub(crate) fn assert_zap_err<T: std::fmt::Debug>(result: anchor_lang::Result<T>, expected: ZapError) {
    match result {
        Err(Error::AnchorError(err)) => assert_eq!(
            err.error_code_number,
            u32::from(expected),
            "expected {:?}, got {}",
            expected,
            err.error_msg
        ),
        other => panic!("expected {:?}, got {:?}", expected, other),
    }
}
