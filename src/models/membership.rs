// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! On-chain membership account model.
//!
//! The membership program stores one account per wallet. We only ever read
//! it; lock/unlock transactions are signed and sent by the wallet itself.

use serde::{Deserialize, Serialize};

/// Length of the account discriminator prefix written by the program framework.
const DISCRIMINATOR_LEN: usize = 8;
/// Length of a public key.
const PUBKEY_LEN: usize = 32;

/// Decoded membership account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipAccount {
    /// Wallet that owns this membership (base58)
    pub owner: String,
    /// Membership tier derived from locked amount and duration
    pub level: u32,
    /// Token locks in creation order
    pub locks: Vec<TokenLock>,
}

/// A single token lock inside a membership account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenLock {
    /// Locked amount in micro-units
    pub amount: u64,
    /// Release date (unix seconds)
    pub release_date: i64,
    /// Whether the tokens are still locked
    pub is_locked: bool,
}

impl MembershipAccount {
    /// Number of locks that still hold tokens.
    pub fn active_locks(&self) -> usize {
        self.locks.iter().filter(|lock| lock.is_locked).count()
    }

    /// Total amount (micro-units) still locked.
    pub fn locked_amount(&self) -> u64 {
        self.locks
            .iter()
            .filter(|lock| lock.is_locked)
            .map(|lock| lock.amount)
            .sum()
    }

    /// Decode raw account data.
    ///
    /// Layout: discriminator, owner pubkey, `u8` level, `u32` lock count,
    /// then `(u64 amount, i64 release_date, u8 is_locked)` per lock. All
    /// integers are little-endian.
    pub fn decode(data: &[u8]) -> Result<Self, AccountDecodeError> {
        let mut reader = ByteReader::new(data);

        reader.take(DISCRIMINATOR_LEN)?;
        let owner = bs58::encode(reader.take(PUBKEY_LEN)?).into_string();
        let level = u32::from(reader.u8()?);

        let count = reader.u32()? as usize;
        // Each lock is 17 bytes; refuse counts the buffer cannot hold.
        if count > reader.remaining() / 17 {
            return Err(AccountDecodeError::BadLockCount(count));
        }

        let mut locks = Vec::with_capacity(count);
        for _ in 0..count {
            let amount = reader.u64()?;
            let release_date = reader.i64()?;
            let is_locked = reader.u8()? != 0;
            locks.push(TokenLock {
                amount,
                release_date,
                is_locked,
            });
        }

        Ok(Self {
            owner,
            level,
            locks,
        })
    }
}

/// Errors decoding membership account data.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AccountDecodeError {
    #[error("Account data truncated at offset {0}")]
    Truncated(usize),

    #[error("Implausible lock count: {0}")]
    BadLockCount(usize),
}

struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], AccountDecodeError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(AccountDecodeError::Truncated(self.offset))?;
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], AccountDecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, AccountDecodeError> {
        Ok(self.array::<1>()?[0])
    }

    fn u32(&mut self) -> Result<u32, AccountDecodeError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64, AccountDecodeError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn i64(&mut self) -> Result<i64, AccountDecodeError> {
        Ok(i64::from_le_bytes(self.array()?))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Encode an account the way the program lays it out.
    pub(crate) fn encode_account(owner: [u8; 32], level: u8, locks: &[(u64, i64, bool)]) -> Vec<u8> {
        let mut data = vec![7u8; DISCRIMINATOR_LEN];
        data.extend_from_slice(&owner);
        data.push(level);
        data.extend_from_slice(&(locks.len() as u32).to_le_bytes());
        for (amount, release, locked) in locks {
            data.extend_from_slice(&amount.to_le_bytes());
            data.extend_from_slice(&release.to_le_bytes());
            data.push(u8::from(*locked));
        }
        data
    }

    #[test]
    fn test_decode_account_with_locks() {
        let data = encode_account(
            [1u8; 32],
            3,
            &[(5_000_000, 1_735_689_600, true), (1_000_000, 1_700_000_000, false)],
        );

        let account = MembershipAccount::decode(&data).unwrap();

        assert_eq!(account.level, 3);
        assert_eq!(account.owner, bs58::encode([1u8; 32]).into_string());
        assert_eq!(account.locks.len(), 2);
        assert_eq!(account.active_locks(), 1);
        assert_eq!(account.locked_amount(), 5_000_000);
        assert!(!account.locks[1].is_locked);
    }

    #[test]
    fn test_decode_account_without_locks() {
        let data = encode_account([2u8; 32], 0, &[]);
        let account = MembershipAccount::decode(&data).unwrap();
        assert_eq!(account.level, 0);
        assert!(account.locks.is_empty());
    }

    #[test]
    fn test_decode_truncated_data() {
        let mut data = encode_account([2u8; 32], 1, &[(10, 20, true)]);
        data.truncate(data.len() - 3);
        assert!(MembershipAccount::decode(&data).is_err());

        assert_eq!(
            MembershipAccount::decode(&[0u8; 4]),
            Err(AccountDecodeError::Truncated(0))
        );
    }

    #[test]
    fn test_decode_rejects_huge_lock_count() {
        let mut data = encode_account([2u8; 32], 1, &[]);
        let count_offset = DISCRIMINATOR_LEN + PUBKEY_LEN + 1;
        data[count_offset..count_offset + 4].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            MembershipAccount::decode(&data),
            Err(AccountDecodeError::BadLockCount(_))
        ));
    }
}
