//! Integration tests for the non-fungible registry.
//!
//! Covers deployment, metadata resolution, approvals, plain and safe
//! transfers, and the receiver acknowledgement path with contract-capable
//! receivers registered in a [`ReceiverDirectory`].

use ys_contracts::non_fungible_registry::{Erc721Error, NonFungibleRegistry, RegistryConfig};
use ys_contracts::receiver::{NoReceivers, ReceiverBehavior, ReceiverDirectory, ScriptedReceiver};
use ys_protocol::events::Erc721Event;
use ys_protocol::interface::InterfaceId;
use ys_protocol::Address;

const BASE_TOKEN_URI: &str = "ipfs://QmPMc4tcBsMqLRuCQtPmPe84bpSjrC3Ky7t3JWuHXYB4aS/";

fn owner() -> Address {
    "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".parse().unwrap()
}

fn other() -> Address {
    "0x70997970c51812dc3a010c7d01b50e0d17dc79c8".parse().unwrap()
}

fn operator() -> Address {
    Address::repeat_byte(0x0e)
}

fn contract() -> Address {
    Address::repeat_byte(0xc0)
}

/// Helper: deploys the default registry and clears the mint event.
fn deploy() -> NonFungibleRegistry {
    let mut registry = NonFungibleRegistry::new(RegistryConfig::default(), owner()).unwrap();
    registry.take_events();
    registry
}

fn directory_with(behavior: ReceiverBehavior) -> ReceiverDirectory<ScriptedReceiver> {
    let mut dir = ReceiverDirectory::new();
    dir.register(contract(), ScriptedReceiver::new(behavior));
    dir
}

// ---------------------------------------------------------------------------
// Deployment & metadata
// ---------------------------------------------------------------------------

#[test]
fn deployment_sets_metadata_and_balance() {
    let registry = NonFungibleRegistry::new(RegistryConfig::default(), owner()).unwrap();
    assert_eq!(registry.name(), "YSERC721token");
    assert_eq!(registry.symbol(), "YSERC721");
    assert_eq!(registry.balance_of(&owner()), 1);
    assert_eq!(
        registry.events(),
        &[Erc721Event::Transfer {
            from: Address::ZERO,
            to: owner(),
            token_id: 1
        }]
    );
}

#[test]
fn token_uri_concatenates_base_and_id() {
    let registry = deploy();
    assert_eq!(registry.token_uri(1).unwrap(), format!("{}1", BASE_TOKEN_URI));
}

#[test]
fn token_uri_with_custom_base() {
    let config = RegistryConfig {
        base_uri: "ipfs://X/".into(),
        ..RegistryConfig::default()
    };
    let registry = NonFungibleRegistry::new(config, owner()).unwrap();
    assert_eq!(registry.token_uri(1).unwrap(), "ipfs://X/1");
    assert_eq!(registry.token_uri(2), Err(Erc721Error::NonexistentToken(2)));
}

#[test]
fn owner_of_unminted_token_fails() {
    let registry = deploy();
    assert_eq!(registry.owner_of(2), Err(Erc721Error::NonexistentToken(2)));
    assert_eq!(registry.owner_of(0), Err(Erc721Error::NonexistentToken(0)));
}

#[test]
fn balance_of_unknown_account_is_zero() {
    let registry = deploy();
    assert_eq!(registry.balance_of(&other()), 0);
    assert_eq!(registry.balance_of(&Address::ZERO), 0);
}

#[test]
fn supports_interface_is_a_static_table() {
    let registry = deploy();
    assert!(registry.supports_interface("0x80ac58cd".parse::<InterfaceId>().unwrap()));
    assert!(registry.supports_interface("0x01ffc9a7".parse::<InterfaceId>().unwrap()));
    assert!(registry.supports_interface("0x5b5e139f".parse::<InterfaceId>().unwrap()));
    assert!(!registry.supports_interface("0xffffffff".parse::<InterfaceId>().unwrap()));
    assert!(!registry.supports_interface("0x36372b07".parse::<InterfaceId>().unwrap()));
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

#[test]
fn transfer_from_changes_ownership_and_emits() {
    let mut registry = deploy();
    registry.transfer_from(owner(), owner(), other(), 1).unwrap();

    assert_eq!(registry.owner_of(1), Ok(other()));
    assert_eq!(registry.balance_of(&owner()), 0);
    assert_eq!(registry.balance_of(&other()), 1);
    assert_eq!(
        registry.events(),
        &[Erc721Event::Transfer {
            from: owner(),
            to: other(),
            token_id: 1
        }]
    );
}

#[test]
fn safe_transfer_with_data_to_account() {
    let mut registry = deploy();
    registry
        .safe_transfer_from_with_data(owner(), owner(), other(), 1, b"Hello world!", &mut NoReceivers)
        .unwrap();
    assert_eq!(registry.owner_of(1), Ok(other()));
}

#[test]
fn safe_transfer_without_data_to_account() {
    let mut registry = deploy();
    registry
        .safe_transfer_from(owner(), owner(), other(), 1, &mut NoReceivers)
        .unwrap();
    assert_eq!(registry.owner_of(1), Ok(other()));
}

#[test]
fn transfer_to_null_identity_rejected() {
    let mut registry = deploy();
    assert_eq!(
        registry.transfer_from(owner(), owner(), Address::ZERO, 1),
        Err(Erc721Error::InvalidReceiver(Address::ZERO))
    );
    assert_eq!(registry.owner_of(1), Ok(owner()));
}

#[test]
fn transfer_from_null_identity_rejected() {
    let mut registry = deploy();
    assert_eq!(
        registry.transfer_from(owner(), Address::ZERO, other(), 1),
        Err(Erc721Error::InvalidSender(Address::ZERO))
    );
}

#[test]
fn transfer_from_wrong_sender_rejected() {
    let mut registry = deploy();
    assert_eq!(
        registry.transfer_from(other(), other(), owner(), 1),
        Err(Erc721Error::InvalidSender(other()))
    );
}

#[test]
fn transfer_of_unminted_token_rejected_first() {
    let mut registry = deploy();
    assert_eq!(
        registry.transfer_from(owner(), Address::ZERO, Address::ZERO, 7),
        Err(Erc721Error::NonexistentToken(7))
    );
}

#[test]
fn unauthorized_transfer_rejected() {
    let mut registry = deploy();
    assert_eq!(
        registry.transfer_from(other(), owner(), other(), 1),
        Err(Erc721Error::InsufficientApproval {
            operator: other(),
            token_id: 1
        })
    );
    assert_eq!(registry.owner_of(1), Ok(owner()));
    assert!(registry.events().is_empty());
}

#[test]
fn approved_spender_can_transfer_once() {
    let mut registry = deploy();
    registry.approve(owner(), other(), 1).unwrap();
    registry.transfer_from(other(), owner(), operator(), 1).unwrap();

    assert_eq!(registry.owner_of(1), Ok(operator()));
    assert_eq!(registry.get_approved(1), Ok(None));

    // The approval did not survive the transfer.
    assert!(matches!(
        registry.transfer_from(other(), operator(), other(), 1),
        Err(Erc721Error::InsufficientApproval { .. })
    ));
}

#[test]
fn operator_can_transfer_without_token_approval() {
    let mut registry = deploy();
    registry.set_approval_for_all(owner(), operator(), true).unwrap();
    assert_eq!(registry.get_approved(1), Ok(None));

    registry.transfer_from(operator(), owner(), other(), 1).unwrap();
    assert_eq!(registry.owner_of(1), Ok(other()));

    // Operator approval persists across transfers but is scoped to the owner.
    assert!(registry.is_approved_for_all(&owner(), &operator()));
    assert!(matches!(
        registry.transfer_from(operator(), other(), owner(), 1),
        Err(Erc721Error::InsufficientApproval { .. })
    ));
}

// ---------------------------------------------------------------------------
// Approvals
// ---------------------------------------------------------------------------

#[test]
fn approve_sets_and_emits() {
    let mut registry = deploy();
    registry.approve(owner(), other(), 1).unwrap();

    assert_eq!(registry.get_approved(1), Ok(Some(other())));
    assert_eq!(
        registry.events(),
        &[Erc721Event::Approval {
            owner: owner(),
            approved: other(),
            token_id: 1
        }]
    );
}

#[test]
fn non_owner_cannot_approve() {
    let mut registry = deploy();
    assert_eq!(
        registry.approve(other(), other(), 1),
        Err(Erc721Error::InvalidApprover(other()))
    );
    assert_eq!(registry.get_approved(1), Ok(None));
}

#[test]
fn operator_can_approve_on_owners_behalf() {
    let mut registry = deploy();
    registry.set_approval_for_all(owner(), operator(), true).unwrap();
    registry.approve(operator(), other(), 1).unwrap();

    assert_eq!(registry.get_approved(1), Ok(Some(other())));
    // The event names the owner, not the operator.
    assert!(matches!(
        registry.events().last(),
        Some(Erc721Event::Approval { owner: o, .. }) if *o == owner()
    ));
}

#[test]
fn set_approval_for_all_sets_and_emits() {
    let mut registry = deploy();
    registry.set_approval_for_all(owner(), other(), true).unwrap();

    assert!(registry.is_approved_for_all(&owner(), &other()));
    assert!(!registry.is_approved_for_all(&other(), &owner()));
    assert_eq!(
        registry.events(),
        &[Erc721Event::ApprovalForAll {
            owner: owner(),
            operator: other(),
            approved: true
        }]
    );
}

#[test]
fn set_approval_for_all_can_revoke() {
    let mut registry = deploy();
    registry.set_approval_for_all(owner(), operator(), true).unwrap();
    registry.set_approval_for_all(owner(), operator(), false).unwrap();
    assert!(!registry.is_approved_for_all(&owner(), &operator()));
    assert!(matches!(
        registry.transfer_from(operator(), owner(), other(), 1),
        Err(Erc721Error::InsufficientApproval { .. })
    ));
}

#[test]
fn set_approval_for_null_operator_rejected() {
    let mut registry = deploy();
    assert_eq!(
        registry.set_approval_for_all(owner(), Address::ZERO, true),
        Err(Erc721Error::InvalidOperator(Address::ZERO))
    );
    assert!(registry.events().is_empty());
}

// ---------------------------------------------------------------------------
// Safe transfers to contracts
// ---------------------------------------------------------------------------

#[test]
fn accepting_receiver_gets_payload_unmodified() {
    let mut registry = deploy();
    let mut dir = directory_with(ReceiverBehavior::Accept);
    registry.approve(owner(), operator(), 1).unwrap();

    registry
        .safe_transfer_from_with_data(operator(), owner(), contract(), 1, b"Hello world!", &mut dir)
        .unwrap();

    assert_eq!(registry.owner_of(1), Ok(contract()));
    let delivery = &dir.get(&contract()).unwrap().deliveries()[0];
    assert_eq!(delivery.operator, operator());
    assert_eq!(delivery.from, owner());
    assert_eq!(delivery.token_id, 1);
    assert_eq!(delivery.data, b"Hello world!".to_vec());
}

#[test]
fn wrong_selector_rolls_back_the_transfer() {
    let mut registry = deploy();
    let mut dir = directory_with(ReceiverBehavior::WrongSelector);
    registry.approve(owner(), other(), 1).unwrap();
    registry.take_events();

    let err = registry
        .safe_transfer_from(owner(), owner(), contract(), 1, &mut dir)
        .unwrap_err();

    assert_eq!(err, Erc721Error::InvalidReceiver(contract()));
    assert_eq!(registry.owner_of(1), Ok(owner()));
    assert_eq!(registry.balance_of(&owner()), 1);
    assert_eq!(registry.balance_of(&contract()), 0);
    assert_eq!(registry.get_approved(1), Ok(Some(other())));
    assert!(registry.events().is_empty());
}

#[test]
fn reverting_receiver_surfaces_reason() {
    let mut registry = deploy();
    let mut dir = directory_with(ReceiverBehavior::Revert {
        reason: "not accepting".into(),
    });

    let err = registry
        .safe_transfer_from(owner(), owner(), contract(), 1, &mut dir)
        .unwrap_err();

    assert_eq!(
        err,
        Erc721Error::ReceiverReverted {
            receiver: contract(),
            reason: "not accepting".into()
        }
    );
    assert_eq!(registry.owner_of(1), Ok(owner()));
}

#[test]
fn reverting_receiver_without_reason_is_invalid_receiver() {
    let mut registry = deploy();
    let mut dir = directory_with(ReceiverBehavior::Revert {
        reason: String::new(),
    });
    assert_eq!(
        registry.safe_transfer_from(owner(), owner(), contract(), 1, &mut dir),
        Err(Erc721Error::InvalidReceiver(contract()))
    );
}

#[test]
fn plain_transfer_skips_the_receiver() {
    let mut registry = deploy();
    registry.transfer_from(owner(), owner(), contract(), 1).unwrap();
    assert_eq!(registry.owner_of(1), Ok(contract()));
}

#[test]
fn receiver_is_not_called_when_checks_fail() {
    let mut registry = deploy();
    let mut dir = directory_with(ReceiverBehavior::Accept);

    let err = registry
        .safe_transfer_from(other(), owner(), contract(), 1, &mut dir)
        .unwrap_err();

    assert!(matches!(err, Erc721Error::InsufficientApproval { .. }));
    assert!(dir.get(&contract()).unwrap().deliveries().is_empty());
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

#[test]
fn ownership_stays_unique_through_a_chain_of_transfers() {
    let mut registry = deploy();
    let hops = [other(), operator(), contract(), owner()];
    let mut holder = owner();

    for next in hops {
        registry.transfer_from(holder, holder, next, 1).unwrap();
        holder = next;

        assert_eq!(registry.owner_of(1), Ok(holder));
        let total: u64 = [owner(), other(), operator(), contract()]
            .iter()
            .map(|a| registry.balance_of(a))
            .sum();
        assert_eq!(total, 1);
        assert_eq!(registry.balance_of(&holder), 1);
    }
}
