//! State blocks, the unified block format of the block lattice.
//!
//! Every block contains the full account state after the operation (balance and
//! representative), so the meaning of a block is the difference between it and
//! its predecessor.

use relay_crypto::{account_public_key, blake2b_256_multi, verify_signature, KeyError};
use relay_types::{Account, BlockHash, PublicKey, Raw, Signature};
use relay_work::WorkNonce;
use serde::{Deserialize, Serialize};

/// Prefix hashed in front of every state block (31 zero bytes then 6).
const STATE_BLOCK_PREAMBLE: [u8; 32] = {
    let mut preamble = [0u8; 32];
    preamble[31] = 6;
    preamble
};

/// What a state block does, as told to the node on submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockSubtype {
    Send,
    Receive,
    /// A receive that is the first block of its chain.
    Open,
}

impl BlockSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Receive => "receive",
            Self::Open => "open",
        }
    }
}

/// A state block in the block lattice, in its node JSON shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "state")]
pub struct StateBlock {
    /// The account this block belongs to.
    pub account: Account,

    /// Hash of the previous block in this account's chain (zero for the first block).
    pub previous: BlockHash,

    /// The account's consensus representative.
    pub representative: Account,

    /// Balance after this block, in raw units.
    pub balance: Raw,

    /// Link field, context-dependent:
    /// - For Send: the destination account's public key
    /// - For Receive/Open: the send block hash being received
    pub link: BlockHash,

    /// Signature over the block hash by the account holder.
    pub signature: Signature,

    /// Proof-of-work nonce against the block root.
    pub work: WorkNonce,
}

impl StateBlock {
    /// Compute the hash of this block from its contents.
    ///
    /// Blake2b-256 over preamble, account key, previous, representative key,
    /// big-endian balance and link. Signature and work are not hashed.
    pub fn compute_hash(&self) -> Result<BlockHash, KeyError> {
        let account = account_public_key(&self.account)?;
        let representative = account_public_key(&self.representative)?;
        Ok(hash_fields(
            &account,
            &self.previous,
            &representative,
            self.balance,
            &self.link,
        ))
    }

    /// Whether this is the first block in an account chain.
    pub fn is_first(&self) -> bool {
        self.previous.is_zero()
    }

    /// Verify the signature against the account's own key.
    pub fn verify_signature(&self) -> Result<bool, KeyError> {
        let hash = self.compute_hash()?;
        let public = account_public_key(&self.account)?;
        Ok(verify_signature(hash.as_bytes(), &self.signature, &public))
    }

    /// The link interpreted as a destination account (meaningful for sends).
    pub fn link_as_account(&self) -> Account {
        relay_crypto::derive_address(&PublicKey(*self.link.as_bytes()))
    }
}

/// Hash the signed fields of a state block.
pub(crate) fn hash_fields(
    account: &PublicKey,
    previous: &BlockHash,
    representative: &PublicKey,
    balance: Raw,
    link: &BlockHash,
) -> BlockHash {
    BlockHash::new(blake2b_256_multi(&[
        &STATE_BLOCK_PREAMBLE,
        account.as_bytes(),
        previous.as_bytes(),
        representative.as_bytes(),
        &balance.to_be_bytes(),
        link.as_bytes(),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_crypto::{derive_address, public_from_private, sign_message};
    use relay_types::PrivateKey;

    fn sample(secret: &PrivateKey) -> StateBlock {
        let public = public_from_private(secret);
        StateBlock {
            account: derive_address(&public),
            previous: BlockHash::new([1u8; 32]),
            representative: derive_address(&public),
            balance: Raw::new(1_000_000),
            link: BlockHash::new([2u8; 32]),
            signature: Signature([0u8; 64]),
            work: WorkNonce(0),
        }
    }

    #[test]
    fn hash_ignores_signature_and_work() {
        let secret = PrivateKey([3u8; 32]);
        let a = sample(&secret);
        let mut b = a.clone();
        b.signature = Signature([9u8; 64]);
        b.work = WorkNonce(42);
        assert_eq!(a.compute_hash().unwrap(), b.compute_hash().unwrap());
    }

    #[test]
    fn hash_covers_balance() {
        let secret = PrivateKey([3u8; 32]);
        let a = sample(&secret);
        let mut b = a.clone();
        b.balance = Raw::new(999_999);
        assert_ne!(a.compute_hash().unwrap(), b.compute_hash().unwrap());
    }

    #[test]
    fn signature_verifies_over_hash() {
        let secret = PrivateKey([3u8; 32]);
        let mut block = sample(&secret);
        assert!(!block.verify_signature().unwrap());
        let hash = block.compute_hash().unwrap();
        block.signature = sign_message(hash.as_bytes(), &secret);
        assert!(block.verify_signature().unwrap());
    }

    #[test]
    fn first_block_has_zero_previous() {
        let mut block = sample(&PrivateKey([3u8; 32]));
        assert!(!block.is_first());
        block.previous = BlockHash::ZERO;
        assert!(block.is_first());
    }

    #[test]
    fn hash_and_signature_match_reference_vector() {
        let secret = relay_crypto::parse_private_key(
            "781186FB9EF17DB6E3D1056550D9FAE5D5BBADA6A6BC370E4CBB938B1DC71DA3",
        )
        .unwrap();
        let account = derive_address(&public_from_private(&secret));
        let mut block = StateBlock {
            account: account.clone(),
            previous: "991CF190094C00F0B68E2E5F75F6BEE95A2E0BD93CEAA4A6734DB9F19B728948"
                .parse()
                .unwrap(),
            representative: account,
            balance: Raw::new(1_000_000_000_000_000_000_000_000_000_000),
            link: "1EF0AD02257987B48030CC8D38511D3B2511672F33AF115AD09E18A86A8355A8"
                .parse()
                .unwrap(),
            signature: Signature([0u8; 64]),
            work: WorkNonce(0),
        };

        let hash = block.compute_hash().unwrap();
        assert_eq!(
            hash.to_string(),
            "B979021380A8FA436ADDEE8E3687348AF620334D1BD983DEE2186DA29F868267"
        );

        // Ed25519-Blake2b signatures are deterministic.
        block.signature = sign_message(hash.as_bytes(), &secret);
        assert_eq!(
            block.signature.to_string(),
            "4EBBF6F98ECD753145A2C586B359D3CE76A282BD18FBF35B39BE2C584F66B67E\
             B61B1C71E067449B7F3EDD591821CA8754ED93CB1150FE2176C7B3F0559B520A"
        );
        assert!(block.verify_signature().unwrap());
    }

    #[test]
    fn json_shape_matches_node() {
        let block = sample(&PrivateKey([3u8; 32]));
        let json = serde_json::to_value(&block).unwrap();
        assert_eq!(json["type"], "state");
        assert_eq!(json["balance"], "1000000");
        assert_eq!(json["work"], "0000000000000000");
        assert_eq!(json["previous"], "01".repeat(32));
        let back: StateBlock = serde_json::from_value(json).unwrap();
        assert_eq!(back, block);
    }

    #[test]
    fn invalid_account_cannot_be_hashed() {
        let mut block = sample(&PrivateKey([3u8; 32]));
        block.account = Account::new_unchecked("nano_bogus");
        assert!(block.compute_hash().is_err());
    }
}
