//! Deterministic stand-in for an FHE coprocessor
//!
//! Implements [`EncryptedArithmetic`] over 32-byte handles that carry their own
//! (masked) plaintext, so no off-chain state is needed:
//!
//! ```text
//! kind(1) || value ^ mask(8) || nonce(15) || tag(8)
//! ```
//!
//! * `mask = blake2_256(key || nonce)[..8]`
//! * `tag  = blake2_256(key || kind || masked || nonce)[..8]`, so handles cannot be
//!   fabricated without the key.
//! * Every operation derives its output nonce from its inputs, which keeps the
//!   functions pure and deterministic.
//!
//! The key is a public constant. This gives the *shape* of an FHE scheme (opaque
//! handles, proofs bound to submitter and contract, no plaintext on the ledger)
//! with none of its security. Use it for tests and dev chains only.
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod client;


use alloc::vec::Vec;
use confidential_assets_primitives::{
    EncryptedAmount, EncryptedArithmetic, EncryptedBool, FheError, Handle, InputBinding,
};
use parity_scale_codec::{Decode, Encode};
use sp_io::hashing::blake2_256;

const KEY_SEED: &[u8] = b"fhe-simulator/insecure-key/v1";
const DOMAIN: &[u8] = b"fhe-simulator/v1";

/// Plaintext type tag stored in the first handle byte.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub(crate) enum Kind {
    Uint64 = 1,
    Bool = 2,
}

impl Kind {
    fn from_byte(b: u8) -> Result<Self, FheError> {
        match b {
            1 => Ok(Kind::Uint64),
            2 => Ok(Kind::Bool),
            _ => Err(FheError::MalformedCiphertext),
        }
    }
}

/// Proof blob produced by [`client::encrypt_input`].
#[derive(Encode, Decode, Clone, PartialEq, Eq, Debug)]
pub(crate) struct SimulatedProof {
    /// Bit width the submitter claims the plaintext fits in.
    pub bits: u8,
    /// Binding tag over (handle, contract, submitter, bits).
    pub tag: [u8; 32],
}

pub(crate) mod ser {
    use super::*;

    fn key() -> [u8; 32] {
        blake2_256(KEY_SEED)
    }

    fn keyed(parts: &[&[u8]]) -> [u8; 32] {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&key());
        for p in parts {
            buf.extend_from_slice(p);
        }
        blake2_256(&buf)
    }

    pub fn nonce(label: &[u8], inputs: &[&[u8]]) -> [u8; 15] {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(DOMAIN);
        buf.extend_from_slice(label);
        for i in inputs {
            buf.extend_from_slice(i);
        }
        let h = blake2_256(&buf);
        let mut out = [0u8; 15];
        out.copy_from_slice(&h[..15]);
        out
    }

    pub fn seal(kind: Kind, value: u64, nonce: [u8; 15]) -> Handle {
        let mask = keyed(&[&nonce]);
        let mut masked = value.to_le_bytes();
        for (m, k) in masked.iter_mut().zip(mask.iter()) {
            *m ^= k;
        }
        let tag = keyed(&[&[kind as u8], &masked, &nonce]);

        let mut out = [0u8; 32];
        out[0] = kind as u8;
        out[1..9].copy_from_slice(&masked);
        out[9..24].copy_from_slice(&nonce);
        out[24..32].copy_from_slice(&tag[..8]);
        Handle(out)
    }

    pub fn open(h: &Handle) -> Result<(Kind, u64), FheError> {
        // Never-initialized balances read as zero.
        if h.is_zero() {
            return Ok((Kind::Uint64, 0));
        }
        let bytes = h.as_bytes();
        let kind = Kind::from_byte(bytes[0])?;
        let masked = &bytes[1..9];
        let nonce = &bytes[9..24];
        let tag = keyed(&[&[bytes[0]], masked, nonce]);
        if tag[..8] != bytes[24..32] {
            return Err(FheError::MalformedCiphertext);
        }
        let mask = keyed(&[nonce]);
        let mut le = [0u8; 8];
        for (i, b) in le.iter_mut().enumerate() {
            *b = masked[i] ^ mask[i];
        }
        Ok((kind, u64::from_le_bytes(le)))
    }

    pub fn open_uint(h: &Handle) -> Result<u64, FheError> {
        match open(h)? {
            (Kind::Uint64, v) => Ok(v),
            _ => Err(FheError::TypeMismatch),
        }
    }

    pub fn open_bool(h: &Handle) -> Result<bool, FheError> {
        match open(h)? {
            (Kind::Bool, v) => Ok(v != 0),
            _ => Err(FheError::TypeMismatch),
        }
    }

    pub fn input_tag(handle: &Handle, binding: &InputBinding<'_>, bits: u8) -> [u8; 32] {
        keyed(&[
            DOMAIN,
            b"input",
            handle.as_bytes(),
            &(binding.contract.len() as u32).to_le_bytes(),
            binding.contract,
            &(binding.submitter.len() as u32).to_le_bytes(),
            binding.submitter,
            &[bits],
        ])
    }
}

fn uint(label: &[u8], inputs: &[&[u8]], value: u64) -> EncryptedAmount {
    ser::seal(Kind::Uint64, value, ser::nonce(label, inputs))
}

fn boolean(label: &[u8], inputs: &[&[u8]], value: bool) -> EncryptedBool {
    ser::seal(Kind::Bool, value as u64, ser::nonce(label, inputs))
}

/// Software [`EncryptedArithmetic`] backend.
pub struct Simulator;

impl EncryptedArithmetic for Simulator {
    fn as_encrypted(value: u64) -> EncryptedAmount {
        uint(b"trivial", &[&value.to_le_bytes()], value)
    }

    fn add(a: &EncryptedAmount, b: &EncryptedAmount) -> Result<EncryptedAmount, FheError> {
        let sum = ser::open_uint(a)?.wrapping_add(ser::open_uint(b)?);
        Ok(uint(b"add", &[a.as_bytes(), b.as_bytes()], sum))
    }

    fn sub(a: &EncryptedAmount, b: &EncryptedAmount) -> Result<EncryptedAmount, FheError> {
        let diff = ser::open_uint(a)?.wrapping_sub(ser::open_uint(b)?);
        Ok(uint(b"sub", &[a.as_bytes(), b.as_bytes()], diff))
    }

    fn try_decrease(
        x: &EncryptedAmount,
        d: &EncryptedAmount,
    ) -> Result<(EncryptedBool, EncryptedAmount), FheError> {
        let xv = ser::open_uint(x)?;
        let dv = ser::open_uint(d)?;
        let ok = xv >= dv;
        let out = if ok { xv - dv } else { xv };
        let inputs: [&[u8]; 2] = [x.as_bytes(), d.as_bytes()];
        Ok((
            boolean(b"try_decrease/ok", &inputs, ok),
            uint(b"try_decrease/out", &inputs, out),
        ))
    }

    fn try_increase(
        x: &EncryptedAmount,
        d: &EncryptedAmount,
    ) -> Result<(EncryptedBool, EncryptedAmount), FheError> {
        let xv = ser::open_uint(x)?;
        let dv = ser::open_uint(d)?;
        let sum = xv.checked_add(dv);
        let inputs: [&[u8]; 2] = [x.as_bytes(), d.as_bytes()];
        Ok((
            boolean(b"try_increase/ok", &inputs, sum.is_some()),
            uint(b"try_increase/out", &inputs, sum.unwrap_or(xv)),
        ))
    }

    fn select(
        cond: &EncryptedBool,
        x: &EncryptedAmount,
        y: &EncryptedAmount,
    ) -> Result<EncryptedAmount, FheError> {
        let c = ser::open_bool(cond)?;
        let xv = ser::open_uint(x)?;
        let yv = ser::open_uint(y)?;
        let out = if c { xv } else { yv };
        Ok(uint(
            b"select",
            &[cond.as_bytes(), x.as_bytes(), y.as_bytes()],
            out,
        ))
    }

    fn scale_mul(a: &EncryptedAmount, k: u64) -> Result<EncryptedAmount, FheError> {
        let out = ser::open_uint(a)?.wrapping_mul(k);
        Ok(uint(b"scale_mul", &[a.as_bytes(), &k.to_le_bytes()], out))
    }

    fn scale_div(a: &EncryptedAmount, k: u64) -> Result<EncryptedAmount, FheError> {
        if k == 0 {
            return Err(FheError::DivisionByZero);
        }
        let out = ser::open_uint(a)? / k;
        Ok(uint(b"scale_div", &[a.as_bytes(), &k.to_le_bytes()], out))
    }

    fn verify_input(
        ciphertext: &Handle,
        proof: &[u8],
        binding: InputBinding<'_>,
    ) -> Result<EncryptedAmount, FheError> {
        let proof =
            SimulatedProof::decode(&mut &proof[..]).map_err(|_| FheError::InvalidProof)?;
        if ser::input_tag(ciphertext, &binding, proof.bits) != proof.tag {
            return Err(FheError::InvalidProof);
        }
        if proof.bits > binding.max_bits || proof.bits > 64 {
            return Err(FheError::OutOfRange);
        }
        let value = ser::open_uint(ciphertext).map_err(|_| FheError::InvalidProof)?;
        if proof.bits < 64 && value >> proof.bits != 0 {
            return Err(FheError::OutOfRange);
        }
        Ok(*ciphertext)
    }

    fn reveal_condition(cond: &EncryptedBool) -> Result<bool, FheError> {
        ser::open_bool(cond)
    }
}
