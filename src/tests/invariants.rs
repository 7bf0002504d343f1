// Execution Invariants - Propriétés vérifiées sur des entrées aléatoires
//
// 1. Conservation: value moves, fees go to the collector, rent is burned
// 2. A revert keeps the unused gas, an exception forfeits it
// 3. Refunds never exceed half of the gas used
// 4. A rejected transaction leaves the state untouched

use crate::storage::StateView;
use crate::tests::support::*;
use crate::types::{Address, Balance};
use proptest::prelude::*;

fn total_balance(state: &crate::storage::OverlayState) -> Balance {
    state.accounts().values().map(|a| a.balance).sum()
}

#[cfg(test)]
mod invariant_conservation {
    use super::*;

    proptest! {
        #[test]
        fn prop_transfer_conserves_value_minus_rent(
            value in 0u128..10_000,
            gas_price in 1u128..5,
            gas_limit in 21_000u64..60_000,
            rent_gas_limit in 0u64..5_000,
        ) {
            let sender = address_of(&alice());
            let mut state = state_with(&[(sender, RICH)]);
            let ctx = context(ScriptedInterpreter::new());
            let mut unsigned = call(0, RECEIVER, value, gas_limit);
            unsigned.gas_price = gas_price;
            unsigned.rent_gas_limit = rent_gas_limit;

            let before = total_balance(&state);
            let out = execute(&ctx, &unsigned.sign(&alice()), &mut state);

            prop_assert!(out.accepted);
            prop_assert_eq!(out.gas_used, 21_000);
            prop_assert_eq!(state.get_balance(&RECEIVER), value);
            prop_assert_eq!(state.get_balance(&COINBASE), 21_000 * gas_price);
            prop_assert_eq!(total_balance(&state), before - rent_gas_limit as Balance * gas_price);
        }

        #[test]
        fn prop_fee_matches_receipt(
            spend in 0u64..40_000,
            gas_price in 1u128..4,
        ) {
            let code = [0x42u8];
            let ctx = context(ScriptedInterpreter::new().with(&code, vec![Step::Spend(spend)]));
            let mut state = state_with(&[(address_of(&alice()), RICH)]);
            deploy(&mut state, CONTRACT, &code, 0);
            let mut unsigned = call(0, CONTRACT, 0, 100_000);
            unsigned.gas_price = gas_price;

            let out = execute(&ctx, &unsigned.sign(&alice()), &mut state);

            prop_assert_eq!(out.receipt.gas_used, 21_000 + spend);
            prop_assert_eq!(out.paid_fees, out.receipt.gas_used as Balance * gas_price);
            prop_assert_eq!(state.get_balance(&COINBASE), out.paid_fees);
        }
    }
}

#[cfg(test)]
mod invariant_revert_vs_exception {
    use super::*;

    const REVERTING: &[u8] = &[0x01];
    const FAILING: &[u8] = &[0x02];
    const FAILING_CONTRACT: Address = Address::from_low_u64(0xC0DF);

    proptest! {
        #[test]
        fn prop_revert_keeps_leftover_exception_burns_it(spend in 0u64..79_000) {
            let ctx = context(
                ScriptedInterpreter::new()
                    .with(REVERTING, vec![Step::Spend(spend), Step::Revert])
                    .with(FAILING, vec![Step::Spend(spend), Step::Fail("invalid opcode")]),
            );
            let mut state = state_with(&[(address_of(&alice()), RICH)]);
            deploy(&mut state, CONTRACT, REVERTING, 0);
            deploy(&mut state, FAILING_CONTRACT, FAILING, 0);

            let reverted = execute(&ctx, &call(0, CONTRACT, 1, 100_000).sign(&alice()), &mut state);
            prop_assert!(!reverted.receipt.is_successful());
            prop_assert_eq!(reverted.gas_leftover, 79_000 - spend);
            prop_assert_eq!(reverted.gas_used, 21_000 + spend);

            let failed = execute(&ctx, &call(1, FAILING_CONTRACT, 1, 100_000).sign(&alice()), &mut state);
            prop_assert!(!failed.receipt.is_successful());
            prop_assert_eq!(failed.gas_leftover, 0);
            prop_assert_eq!(failed.gas_used, 100_000);

            prop_assert_eq!(state.get_balance(&CONTRACT), 0);
            prop_assert_eq!(state.get_balance(&FAILING_CONTRACT), 0);
            prop_assert_eq!(state.get_nonce(&address_of(&alice())), 2);
        }
    }
}

#[cfg(test)]
mod invariant_refund_bound {
    use super::*;

    const REFUNDING: &[u8] = &[0x06];

    proptest! {
        #[test]
        fn prop_refund_at_most_half_of_gas_used(
            spend in 0u64..50_000,
            future_refund in 0u64..200_000,
        ) {
            let ctx = context(ScriptedInterpreter::new().with(
                REFUNDING,
                vec![Step::Spend(spend), Step::FutureRefund(future_refund)],
            ));
            let mut state = state_with(&[(address_of(&alice()), RICH)]);
            deploy(&mut state, CONTRACT, REFUNDING, 0);

            let out = execute(&ctx, &call(0, CONTRACT, 0, 100_000).sign(&alice()), &mut state);
            let summary = out.summary.clone().unwrap();

            prop_assert!(summary.gas_refund <= summary.gas_used / 2);
            prop_assert!(summary.gas_refund <= future_refund);
            prop_assert_eq!(out.gas_leftover, summary.gas_leftover + summary.gas_refund);
            prop_assert_eq!(out.gas_used + out.gas_leftover, 100_000);
        }
    }
}

#[cfg(test)]
mod invariant_rejection_is_pure {
    use super::*;

    proptest! {
        #[test]
        fn prop_wrong_nonce_never_touches_state(nonce in 1u64..1_000, value in 0u128..1_000) {
            let sender = address_of(&alice());
            let mut state = state_with(&[(sender, RICH), (RECEIVER, 5)]);
            let before = state.accounts();
            let ctx = context(ScriptedInterpreter::new());

            let out = execute(&ctx, &call(nonce, RECEIVER, value, 21_000).sign(&alice()), &mut state);

            prop_assert!(!out.accepted);
            prop_assert!(out.summary.is_none());
            prop_assert_eq!(out.paid_fees, 0);
            prop_assert_eq!(state.accounts(), before);
        }

        #[test]
        fn prop_underfunded_sender_is_rejected(balance in 0u128..21_000) {
            let sender = address_of(&alice());
            let mut state = state_with(&[(sender, balance)]);
            let before = state.accounts();
            let ctx = context(ScriptedInterpreter::new());

            let out = execute(&ctx, &call(0, RECEIVER, 0, 21_000).sign(&alice()), &mut state);

            prop_assert!(!out.accepted);
            prop_assert!(out.error.starts_with("Not enough cash"));
            prop_assert_eq!(state.accounts(), before);
        }
    }
}
