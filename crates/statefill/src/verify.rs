use statefill_types::{Alloc, PostState};
use t8n::{traces::print_traces, TransitionTool};
use tracing::{error, warn};

use crate::FillError;

/// Verifies the transition tool post-state against the expectation.
///
/// On mismatch the traces of the last evaluation are logged before the mismatch is returned.
pub fn verify_post_alloc<T>(expected: &PostState, got: &Alloc, t8n: &T) -> Result<(), FillError>
where
    T: TransitionTool + ?Sized,
{
    let Err(err) = expected.verify(got) else {
        return Ok(());
    };
    error!(target: "statefill", %err, "post state verification failed");
    match t8n.get_traces() {
        Some(traces) => print_traces(&traces),
        None => warn!(target: "statefill", "no traces available, enable tracing on the transition tool"),
    }
    Err(err.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockTransitionTool;
    use alloy_primitives::{address, U256};
    use statefill_types::{Account, AccountCheckError};

    #[test]
    fn mismatch_is_returned_unchanged() {
        let address = address!("00000000000000000000000000000000000000aa");
        let got = Alloc::from([(address, Account::default().with_balance(U256::from(1)))]);
        let expected = PostState::from_iter([(
            address,
            Some(Account::default().with_balance(U256::from(2))),
        )]);
        let t8n = MockTransitionTool::default().with_traces(Vec::new());

        let err = verify_post_alloc(&expected, &got, &t8n).unwrap_err();
        let FillError::PostVerification(err) = err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(err, expected.verify(&got).unwrap_err());
        assert_eq!(
            err,
            AccountCheckError::Balance {
                address,
                want: U256::from(2),
                got: U256::from(1),
            }
        );
        assert_eq!(t8n.trace_requests(), 1);
    }

    #[test]
    fn matching_post_state() {
        let address = address!("00000000000000000000000000000000000000aa");
        let got = Alloc::from([(address, Account::default().with_nonce(1))]);
        let expected = PostState::from_iter([(address, Some(Account::default().with_nonce(1)))]);
        let t8n = MockTransitionTool::default();
        verify_post_alloc(&expected, &got, &t8n).unwrap();
        assert_eq!(t8n.trace_requests(), 0);
    }
}
