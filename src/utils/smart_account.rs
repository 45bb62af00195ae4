//! Coinbase Smart Wallet v1.1 encoding: owners, init code, call data and
//! estimation stub signatures.

use {
    crate::handlers::wallet::types::{Call, Key, KeyType},
    alloy::{
        primitives::{bytes, keccak256, uint, Address, Bytes, B256, U256},
        sol,
        sol_types::{SolCall, SolValue},
    },
};

sol! {
    interface ICoinbaseSmartWalletFactory {
        function getAddress(bytes[] calldata owners, uint256 nonce) external view returns (address);
        function createAccount(bytes[] calldata owners, uint256 nonce) external payable returns (address account);
    }

    struct WalletCall {
        address target;
        uint256 value;
        bytes data;
    }

    interface ICoinbaseSmartWallet {
        function execute(address target, uint256 value, bytes calldata data) external payable;
        function executeBatch(WalletCall[] calldata calls) external payable;
    }

    interface IEntryPoint {
        function getNonce(address sender, uint192 key) external view returns (uint256 nonce);
    }

    struct SignatureWrapper {
        uint256 ownerIndex;
        bytes signatureData;
    }

    struct WebAuthnAuth {
        bytes authenticatorData;
        string clientDataJSON;
        uint256 challengeIndex;
        uint256 typeIndex;
        uint256 r;
        uint256 s;
    }
}

const ADDRESS_LENGTH: usize = 20;
const RAW_PUBLIC_KEY_LENGTH: usize = 64;
const UNCOMPRESSED_PUBLIC_KEY_LENGTH: usize = 65;
const UNCOMPRESSED_PREFIX: u8 = 0x04;

const DUMMY_ECDSA_SIGNATURE: Bytes = bytes!("e8b94748580ca0b4993c9a1b86b5be851bfc076ff5ce3a1ff65bf16392acfcb800f9b4f1aef1555c7fce5599fffb17e7c635502154a0333ba21f3ae491839af51c");
const DUMMY_AUTHENTICATOR_DATA: Bytes =
    bytes!("49960de5880e8c687434170f6476605b8fe4aeb9a28632c7995cf3ba831d97630500000000");
const DUMMY_CLIENT_DATA_JSON: &str = r#"{"type":"webauthn.get","challenge":"9jEFijuhEWrM4SOW-tChJbUEHEP44VcjcJ-Bqo1fTM8","origin":"https://sign.coinbase.com","crossOrigin":false}"#;
const DUMMY_WEBAUTHN_R: U256 =
    uint!(0x635bc6d0f68ff895cae8a288ecf7542a6a9cd555df784b73e1e2ea7e9104b1db_U256);
const DUMMY_WEBAUTHN_S: U256 =
    uint!(0x15e9015d280cb19527881c625fee43fd3a405d5b0d199a8c8e6589a7381209e4_U256);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{length}-byte public key is not a valid {key_type} key")]
pub struct InvalidPublicKey {
    pub key_type: KeyType,
    pub length: usize,
}

/// The single owner of the account, as stored by the wallet contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Address(Address),
    WebAuthn { x: B256, y: B256 },
}

impl Owner {
    pub fn from_key(key: &Key) -> Result<Self, InvalidPublicKey> {
        let public_key = key.public_key.as_ref();
        let invalid = || InvalidPublicKey {
            key_type: key.key_type,
            length: public_key.len(),
        };
        match key.key_type {
            KeyType::Secp256k1 => match public_key.len() {
                ADDRESS_LENGTH => Ok(Owner::Address(Address::from_slice(public_key))),
                _ => {
                    let raw = raw_public_key(public_key).ok_or_else(invalid)?;
                    Ok(Owner::Address(Address::from_slice(
                        &keccak256(raw)[12..],
                    )))
                }
            },
            KeyType::P256 | KeyType::WebAuthnP256 | KeyType::WebCryptoP256 => {
                let raw = raw_public_key(public_key).ok_or_else(invalid)?;
                Ok(Owner::WebAuthn {
                    x: B256::from_slice(&raw[..32]),
                    y: B256::from_slice(&raw[32..]),
                })
            }
        }
    }

    /// Owner bytes as passed to the factory.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Owner::Address(address) => address.abi_encode().into(),
            Owner::WebAuthn { x, y } => [x.as_slice(), y.as_slice()].concat().into(),
        }
    }

    fn stub_signature_data(&self) -> Bytes {
        match self {
            Owner::Address(_) => DUMMY_ECDSA_SIGNATURE,
            Owner::WebAuthn { .. } => WebAuthnAuth {
                authenticatorData: DUMMY_AUTHENTICATOR_DATA,
                clientDataJSON: DUMMY_CLIENT_DATA_JSON.to_owned(),
                challengeIndex: U256::from(23),
                typeIndex: U256::from(1),
                r: DUMMY_WEBAUTHN_R,
                s: DUMMY_WEBAUTHN_S,
            }
            .abi_encode()
            .into(),
        }
    }
}

/// Strips the uncompressed point prefix, returning the 64-byte `x || y`.
fn raw_public_key(public_key: &[u8]) -> Option<&[u8]> {
    match public_key.len() {
        RAW_PUBLIC_KEY_LENGTH => Some(public_key),
        UNCOMPRESSED_PUBLIC_KEY_LENGTH if public_key[0] == UNCOMPRESSED_PREFIX => {
            Some(&public_key[1..])
        }
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartAccount {
    pub owner: Owner,
    pub factory: Address,
}

impl SmartAccount {
    pub fn new(owner: Owner, factory: Address) -> Self {
        Self { owner, factory }
    }

    pub fn owners(&self) -> Vec<Bytes> {
        vec![self.owner.to_bytes()]
    }

    /// `factory ++ createAccount(owners, 0)`.
    pub fn init_code(&self) -> Bytes {
        let create = ICoinbaseSmartWalletFactory::createAccountCall {
            owners: self.owners(),
            nonce: U256::ZERO,
        }
        .abi_encode();
        [self.factory.as_slice(), &create].concat().into()
    }

    pub fn encode_calls(calls: &[Call]) -> Bytes {
        match calls {
            [call] => ICoinbaseSmartWallet::executeCall {
                target: call.to,
                value: call.value(),
                data: call.data(),
            }
            .abi_encode()
            .into(),
            _ => ICoinbaseSmartWallet::executeBatchCall {
                calls: calls
                    .iter()
                    .map(|call| WalletCall {
                        target: call.to,
                        value: call.value(),
                        data: call.data(),
                    })
                    .collect(),
            }
            .abi_encode()
            .into(),
        }
    }

    /// Signature placeholder with the size and shape of a real one, used for
    /// gas estimation only.
    pub fn stub_signature(&self) -> Bytes {
        SignatureWrapper {
            ownerIndex: U256::ZERO,
            signatureData: self.owner.stub_signature_data(),
        }
        .abi_encode()
        .into()
    }
}
