// State - Vue d'état en couches (commit / rollback)
//
// Une couche enfant accumule ses écritures et les rend visibles au parent
// seulement au commit. Les lectures traversent les couches vers la racine.
use crate::types::{
    AccountState, Address, Balance, DataWord, Hash, Nonce, Uint24, EMPTY_STORAGE_ROOT,
    STORAGE_ROOT_VALUE_LEN,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

/// Storage key prefixes for rent nodes
const PREFIX_ACCOUNT_NODE: &[u8] = b"account:";
const PREFIX_CODE_NODE: &[u8] = b"code:";
const PREFIX_STORAGE_ROOT_NODE: &[u8] = b"storage:";
const PREFIX_CONTRACT_ADDRESS: &[u8] = b"contract_address:";

/// Layered account/storage view.
///
/// Implementors provide the raw account and storage primitives; every
/// account-level helper is derived from them.
pub trait StateView {
    /// Child view whose writes stay invisible here until it commits
    fn start_tracking(&self) -> Box<dyn StateView>;

    /// Pushes this layer's writes to its parent. No-op on a root view.
    fn commit(&mut self);

    /// Discards this layer's writes. No-op on a root view.
    fn rollback(&mut self);

    fn get_account(&self, address: &Address) -> Option<AccountState>;

    fn put_account(&mut self, address: Address, account: AccountState);

    /// Removes the account and wipes its storage
    fn delete(&mut self, address: &Address);

    fn get_storage(&self, address: &Address, key: &DataWord) -> DataWord;

    fn put_storage(&mut self, address: Address, key: DataWord, value: DataWord);

    // =========================================================================
    // Account helpers
    // =========================================================================

    fn is_exist(&self, address: &Address) -> bool {
        self.get_account(address).is_some()
    }

    fn is_contract(&self, address: &Address) -> bool {
        self.get_account(address).map(|a| a.is_contract).unwrap_or(false)
    }

    fn get_balance(&self, address: &Address) -> Balance {
        self.get_account(address).map(|a| a.balance).unwrap_or(0)
    }

    /// Credits an account, creating it if needed
    fn add_balance(&mut self, address: &Address, amount: Balance) {
        let mut account = self.get_account(address).unwrap_or_default();
        account.balance = account.balance.saturating_add(amount);
        self.put_account(*address, account);
    }

    /// Debits an account; a missing account has a zero balance
    fn sub_balance(&mut self, address: &Address, amount: Balance) -> Result<(), StateError> {
        let mut account = self.get_account(address).unwrap_or_default();
        if account.balance < amount {
            return Err(StateError::InsufficientBalance {
                address: *address,
                available: account.balance,
                required: amount,
            });
        }
        account.balance -= amount;
        self.put_account(*address, account);
        Ok(())
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Balance) -> Result<(), StateError> {
        self.sub_balance(from, amount)?;
        self.add_balance(to, amount);
        Ok(())
    }

    fn get_nonce(&self, address: &Address) -> Nonce {
        self.get_account(address).map(|a| a.nonce).unwrap_or(0)
    }

    fn increase_nonce(&mut self, address: &Address) -> Nonce {
        let mut account = self.get_account(address).unwrap_or_default();
        account.nonce = account.nonce.saturating_add(1);
        let nonce = account.nonce;
        self.put_account(*address, account);
        nonce
    }

    /// Code of the account, `None` when absent
    fn get_code(&self, address: &Address) -> Option<Vec<u8>> {
        self.get_account(address).and_then(|a| a.code)
    }

    fn save_code(&mut self, address: &Address, code: Vec<u8>) {
        let mut account = self.get_account(address).unwrap_or_default();
        account.code = if code.is_empty() { None } else { Some(code) };
        self.put_account(*address, account);
    }

    /// Creates (or resets) the account at `address` as a fresh, empty account
    fn create_account(&mut self, address: &Address) {
        self.delete(address);
        self.put_account(*address, AccountState::new());
    }

    /// Marks the account as a contract and initialises its storage root
    fn setup_contract(&mut self, address: &Address) {
        let mut account = self.get_account(address).unwrap_or_default();
        account.is_contract = true;
        account.storage_root = Some(EMPTY_STORAGE_ROOT);
        self.put_account(*address, account);
    }

    /// Deterministic address of a contract created by `sender` at `nonce`
    fn contract_address(&self, sender: &Address, nonce: Nonce) -> Address {
        let hash = Hash::hash_tagged(
            PREFIX_CONTRACT_ADDRESS,
            &[sender.as_bytes(), &nonce.to_be_bytes()],
        );
        Address::from_hash(&hash)
    }

    // =========================================================================
    // Rent node accessors
    // =========================================================================

    fn account_node_key(&self, address: &Address) -> DataWord {
        Hash::hash_tagged(PREFIX_ACCOUNT_NODE, &[address.as_bytes()]).into()
    }

    fn account_node_value_length(&self, address: &Address) -> Uint24 {
        let len = self.get_account(address).map(|a| a.node_value_len()).unwrap_or(0);
        Uint24::saturating_from(len)
    }

    fn code_node_key(&self, address: &Address) -> DataWord {
        Hash::hash_tagged(PREFIX_CODE_NODE, &[address.as_bytes()]).into()
    }

    fn code_node_length(&self, address: &Address) -> Uint24 {
        let len = self.get_code(address).map(|c| c.len()).unwrap_or(0);
        Uint24::saturating_from(len)
    }

    fn storage_root_key(&self, address: &Address) -> DataWord {
        Hash::hash_tagged(PREFIX_STORAGE_ROOT_NODE, &[address.as_bytes()]).into()
    }

    fn storage_root_value_length(&self, address: &Address) -> Uint24 {
        match self.get_account(address) {
            Some(account) if account.storage_root.is_some() => {
                Uint24::saturating_from(STORAGE_ROOT_VALUE_LEN)
            }
            _ => Uint24::ZERO,
        }
    }
}

// =============================================================================
// In-memory overlay
// =============================================================================

#[derive(Debug, Default)]
struct Layer {
    parent: Option<Rc<RefCell<Layer>>>,
    /// `None` marks an account deleted in this layer
    accounts: BTreeMap<Address, Option<AccountState>>,
    storage: BTreeMap<(Address, DataWord), DataWord>,
    /// Accounts whose lower-layer storage is hidden
    wiped: BTreeSet<Address>,
}

impl Layer {
    fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    fn account(&self, address: &Address) -> Option<AccountState> {
        if let Some(entry) = self.accounts.get(address) {
            return entry.clone();
        }
        self.parent.as_ref().and_then(|p| p.borrow().account(address))
    }

    fn storage_value(&self, address: &Address, key: &DataWord) -> DataWord {
        if let Some(value) = self.storage.get(&(*address, *key)) {
            return *value;
        }
        if self.wiped.contains(address) {
            return DataWord::ZERO;
        }
        match &self.parent {
            Some(parent) => parent.borrow().storage_value(address, key),
            None => DataWord::ZERO,
        }
    }

    fn wipe_storage(&mut self, address: &Address) {
        self.storage.retain(|(owner, _), _| owner != address);
        if !self.is_root() {
            self.wiped.insert(*address);
        }
    }

    fn set_account(&mut self, address: Address, account: Option<AccountState>) {
        if self.is_root() && account.is_none() {
            self.accounts.remove(&address);
        } else {
            self.accounts.insert(address, account);
        }
    }

    fn set_storage(&mut self, address: Address, key: DataWord, value: DataWord) {
        if self.is_root() && value.is_zero() {
            self.storage.remove(&(address, key));
        } else {
            self.storage.insert((address, key), value);
        }
    }

    fn collect_accounts(&self, into: &mut BTreeMap<Address, AccountState>) {
        if let Some(parent) = &self.parent {
            parent.borrow().collect_accounts(into);
        }
        for (address, entry) in &self.accounts {
            match entry {
                Some(account) => {
                    into.insert(*address, account.clone());
                }
                None => {
                    into.remove(address);
                }
            }
        }
    }
}

/// Copy-on-write overlay over an optional parent layer
#[derive(Debug)]
pub struct OverlayState {
    layer: Rc<RefCell<Layer>>,
}

impl OverlayState {
    /// Root view: writes are final
    pub fn new() -> Self {
        Self {
            layer: Rc::new(RefCell::new(Layer::default())),
        }
    }

    pub fn with_accounts<I>(accounts: I) -> Self
    where
        I: IntoIterator<Item = (Address, AccountState)>,
    {
        let mut state = Self::new();
        for (address, account) in accounts {
            state.put_account(address, account);
        }
        state
    }

    /// Concrete child view, same semantics as `start_tracking`
    pub fn child(&self) -> OverlayState {
        OverlayState {
            layer: Rc::new(RefCell::new(Layer {
                parent: Some(Rc::clone(&self.layer)),
                ..Layer::default()
            })),
        }
    }

    pub fn is_root(&self) -> bool {
        self.layer.borrow().is_root()
    }

    /// Accounts visible from this view
    pub fn accounts(&self) -> BTreeMap<Address, AccountState> {
        let mut accounts = BTreeMap::new();
        self.layer.borrow().collect_accounts(&mut accounts);
        accounts
    }
}

impl Default for OverlayState {
    fn default() -> Self {
        Self::new()
    }
}

impl StateView for OverlayState {
    fn start_tracking(&self) -> Box<dyn StateView> {
        Box::new(self.child())
    }

    fn commit(&mut self) {
        let mut layer = self.layer.borrow_mut();
        let Some(parent) = layer.parent.clone() else {
            return;
        };
        let wiped = std::mem::take(&mut layer.wiped);
        let accounts = std::mem::take(&mut layer.accounts);
        let storage = std::mem::take(&mut layer.storage);
        drop(layer);

        let mut parent = parent.borrow_mut();
        for address in &wiped {
            parent.wipe_storage(address);
        }
        for (address, account) in accounts {
            parent.set_account(address, account);
        }
        for ((address, key), value) in storage {
            parent.set_storage(address, key, value);
        }
    }

    fn rollback(&mut self) {
        let mut layer = self.layer.borrow_mut();
        if layer.is_root() {
            return;
        }
        layer.accounts.clear();
        layer.storage.clear();
        layer.wiped.clear();
    }

    fn get_account(&self, address: &Address) -> Option<AccountState> {
        self.layer.borrow().account(address)
    }

    fn put_account(&mut self, address: Address, account: AccountState) {
        self.layer.borrow_mut().set_account(address, Some(account));
    }

    fn delete(&mut self, address: &Address) {
        let mut layer = self.layer.borrow_mut();
        layer.set_account(*address, None);
        layer.wipe_storage(address);
    }

    fn get_storage(&self, address: &Address, key: &DataWord) -> DataWord {
        self.layer.borrow().storage_value(address, key)
    }

    fn put_storage(&mut self, address: Address, key: DataWord, value: DataWord) {
        self.layer.borrow_mut().set_storage(address, key, value);
    }
}

/// Erreurs d'état
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("Balance insuffisante pour {address}: disponible={available}, requis={required}")]
    InsufficientBalance {
        address: Address,
        available: Balance,
        required: Balance,
    },
}
